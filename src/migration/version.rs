use serde_json::Value;
use std::cmp::Ordering;

/// Compares dotted versions segment by segment.
///
/// Segments that are both numbers compare numerically, anything else
/// compares as text. A missing segment sorts before a present one, so
/// `1.2.1` is newer than `1.2`.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let mut left_parts = left.trim().split('.');
    let mut right_parts = right.trim().split('.');
    loop {
        match (left_parts.next(), right_parts.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(a), Ok(b)) => a.cmp(&b),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

pub fn is_newer_version(candidate: &str, baseline: &str) -> bool {
    compare_versions(candidate, baseline) == Ordering::Greater
}

/// Decides whether a world whose stored migration version is `stored`
/// still needs the migration introduced in `floor`.
///
/// Anything other than a non-empty string counts as "never migrated",
/// which covers the registered `[0]` default.
pub fn needs_migration(stored: &Value, floor: &str) -> bool {
    match stored {
        Value::String(version) if !version.trim().is_empty() => is_newer_version(floor, version),
        other => {
            log::warn!(
                "stored migration version {} is not a version string, assuming unmigrated world",
                other
            );
            true
        }
    }
}
