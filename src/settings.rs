use crate::config::MigrationConfig;
use crate::core::Result;
use crate::host::ConfigStore;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const SYSTEM_NAMESPACE: &str = "rits";
pub const MIGRATION_VERSION_KEY: &str = "systemMigrationVersion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingScope {
    World,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingType {
    String,
    Number,
    Boolean,
    Object,
}

/// A setting as registered with the host's configuration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDefinition {
    pub namespace: String,
    pub key: String,
    pub name: String,
    pub scope: SettingScope,
    /// Shown in the host's settings menu.
    pub config: bool,
    pub value_type: SettingType,
    pub default: Value,
}

impl SettingDefinition {
    /// Tracks the system version at which a migration was last applied.
    ///
    /// The declared type is String but the default is the array `[0]`.
    /// Worlds created before any migration report that array, and the
    /// version gate treats it as "never migrated".
    pub fn migration_version(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            name: "System Migration Version".to_string(),
            scope: SettingScope::World,
            config: false,
            value_type: SettingType::String,
            default: json!([0]),
        }
    }

    pub fn full_key(&self) -> String {
        setting_key(&self.namespace, &self.key)
    }
}

/// `namespace.key`, the form settings are stored under.
pub fn setting_key(namespace: &str, key: &str) -> String {
    format!("{}.{}", namespace, key)
}

/// Registers every setting the migration reads or writes.
pub async fn register_system_settings(
    store: &dyn ConfigStore,
    config: &MigrationConfig,
) -> Result<()> {
    store
        .register(SettingDefinition::migration_version(
            config.namespace.clone(),
            config.setting_key.clone(),
        ))
        .await
}
