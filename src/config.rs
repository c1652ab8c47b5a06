use crate::core::Result;
use crate::settings::{MIGRATION_VERSION_KEY, SYSTEM_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Migration runner configuration
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Settings namespace of the game system
    pub namespace: String,

    /// Setting that records the last migrated version
    pub setting_key: String,

    /// Version written to the setting once the run finishes
    pub target_version: String,

    /// Worlds whose stored version is older than this need the migration
    pub needs_migration_version: String,

    /// Ask the host to validate payload types on update
    pub enforce_types: bool,

    /// Keep start/finish notices on screen until dismissed
    pub permanent_notifications: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            namespace: SYSTEM_NAMESPACE.to_string(),
            setting_key: MIGRATION_VERSION_KEY.to_string(),
            target_version: env!("CARGO_PKG_VERSION").to_string(),
            needs_migration_version: env!("CARGO_PKG_VERSION").to_string(),
            enforce_types: false,
            permanent_notifications: true,
        }
    }
}

impl MigrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version recorded after the run
    pub fn target_version(mut self, version: &str) -> Self {
        self.target_version = version.to_string();
        self
    }

    /// Set the oldest version that no longer needs this migration
    pub fn needs_migration_version(mut self, version: &str) -> Self {
        self.needs_migration_version = version.to_string();
        self
    }

    /// Set the settings namespace
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Set the setting key
    pub fn setting_key(mut self, key: &str) -> Self {
        self.setting_key = key.to_string();
        self
    }

    pub fn enforce_types(mut self, enforce: bool) -> Self {
        self.enforce_types = enforce;
        self
    }

    pub fn permanent_notifications(mut self, permanent: bool) -> Self {
        self.permanent_notifications = permanent;
        self
    }

    /// Load from a JSON file
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = MigrationConfig::from_json_file("migrate.json")?
    ///     .target_version("2.1.0");
    /// ```
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}
