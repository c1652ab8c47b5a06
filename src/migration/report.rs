use super::patch::UpdatePayload;
use chrono::{DateTime, Utc};
use std::fmt;

/// The three update kinds a migration run submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationStep {
    ActorAttributes,
    TokenLink,
    SceneTokens,
}

impl MigrationStep {
    pub(crate) fn log_prefix(&self) -> &'static str {
        match self {
            MigrationStep::ActorAttributes => "Migrating Actor entity",
            MigrationStep::TokenLink => "Migrating Token Link for",
            MigrationStep::SceneTokens => "Migrating Scene entity",
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStep::ActorAttributes => write!(f, "actor attributes"),
            MigrationStep::TokenLink => write!(f, "token link"),
            MigrationStep::SceneTokens => write!(f, "scene tokens"),
        }
    }
}

/// What happened to one record for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Applied,
    /// The computed payload was empty, so nothing was submitted.
    NoOp,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub record_id: String,
    pub record_name: String,
    pub step: MigrationStep,
    pub status: OutcomeStatus,
}

/// A collection that could not be listed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFailure {
    pub collection: &'static str,
    pub error: String,
}

/// Result of a full run. A run always finishes; failures live here.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub target_version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<RecordOutcome>,
    pub collection_failures: Vec<CollectionFailure>,
    pub version_recorded: bool,
}

impl MigrationReport {
    pub(crate) fn new(target_version: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            target_version: target_version.into(),
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
            collection_failures: Vec::new(),
            version_recorded: false,
        }
    }

    pub fn applied(&self) -> usize {
        self.count(|status| matches!(status, OutcomeStatus::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, OutcomeStatus::NoOp))
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, OutcomeStatus::Failed(_)))
    }

    /// True when every record migrated and the version was stored.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
            && self.collection_failures.is_empty()
            && self.version_recorded
    }

    pub fn outcome(&self, record_id: &str, step: MigrationStep) -> Option<&RecordOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.record_id == record_id && outcome.step == step)
    }

    fn count(&self, predicate: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "migration to {}: {} applied, {} unchanged, {} failed",
            self.target_version,
            self.applied(),
            self.skipped(),
            self.failures().count()
        )?;
        if !self.collection_failures.is_empty() {
            write!(f, ", {} collections unreadable", self.collection_failures.len())?;
        }
        if !self.version_recorded {
            write!(f, " (version not recorded)")?;
        }
        Ok(())
    }
}

/// A payload computed during a dry run, not submitted.
#[derive(Debug, Clone)]
pub struct PlannedUpdate {
    pub record_id: String,
    pub record_name: String,
    pub step: MigrationStep,
    pub payload: Result<UpdatePayload, String>,
}

impl PlannedUpdate {
    pub fn is_noop(&self) -> bool {
        matches!(&self.payload, Ok(payload) if payload.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, step: MigrationStep, status: OutcomeStatus) -> RecordOutcome {
        RecordOutcome {
            record_id: id.to_string(),
            record_name: id.to_uppercase(),
            step,
            status,
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = MigrationReport::new("1.0.0");
        report.outcomes.push(outcome("a1", MigrationStep::ActorAttributes, OutcomeStatus::Applied));
        report.outcomes.push(outcome("a1", MigrationStep::TokenLink, OutcomeStatus::Applied));
        report.outcomes.push(outcome("a2", MigrationStep::ActorAttributes, OutcomeStatus::NoOp));
        report.outcomes.push(outcome(
            "s1",
            MigrationStep::SceneTokens,
            OutcomeStatus::Failed("boom".to_string()),
        ));
        report.version_recorded = true;

        assert_eq!(report.applied(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failures().count(), 1);
        assert!(!report.is_clean());
        assert_eq!(
            report.to_string(),
            "migration to 1.0.0: 2 applied, 1 unchanged, 1 failed"
        );
        assert_eq!(
            report.outcome("a2", MigrationStep::ActorAttributes).map(|o| &o.status),
            Some(&OutcomeStatus::NoOp)
        );
    }
}
