use lazy_static::lazy_static;

// Global rename table, built once per process
lazy_static! {
    static ref RENAME_TABLE: RenameTable = RenameTable::new(&[
        ("insight", "intuition"),
        ("prowess", "body"),
        ("resolve", "willpower"),
        ("tinker", "engineer"),
        ("hunt", "stalk"),
        ("skirmish", "fight"),
        ("sway", "influence"),
    ]);
}

/// Ordered old-identifier -> new-identifier pairs shared by attributes and
/// skills.
///
/// Order matters for [`RenameTable::rewrite_path`], which substitutes the
/// pairs one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTable {
    entries: Vec<(String, String)>,
}

impl RenameTable {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// The table for the current RITS release.
    pub fn global() -> &'static RenameTable {
        &RENAME_TABLE
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(from, _)| from == old)
            .map(|(_, to)| to.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces every occurrence of every old identifier in `path`.
    ///
    /// Matching is plain substring matching, so several segments of one
    /// path can change at once.
    pub fn rewrite_path(&self, path: &str) -> String {
        self.entries
            .iter()
            .fold(path.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}
