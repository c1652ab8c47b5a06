// ============================================================================
// RITS World Migration Library
// ============================================================================

pub mod config;
pub mod core;
pub mod host;
pub mod migration;
pub mod model;
pub mod settings;

// Re-export main types for convenience
pub use crate::config::MigrationConfig;
pub use crate::core::{CoercionError, MigrationError, Numeric, Result, parse_integer};
pub use host::{
    ConfigStore, LogNotifier, MemoryWorld, Notification, Notifier, NotifyOptions, RecordStore,
    UnreadableRecord, UpdateOptions, WorldFile, WorldSnapshot,
};
pub use migration::{
    ActorPatch, FieldOp, MigrationReport, MigrationRunner, MigrationStep, OutcomeStatus,
    PlannedUpdate, RenameTable, ScenePatch, TokenLinkPatch, UpdatePayload, migrate_actor,
    migrate_scene, migrate_token_link, needs_migration,
};
pub use model::{
    Actor, ActorKind, Attribute, Change, ChangeMode, Effect, ReferenceSchema, Scene, Skill, Token,
};
pub use settings::{
    MIGRATION_VERSION_KEY, SYSTEM_NAMESPACE, SettingDefinition, register_system_settings,
};

// ============================================================================
// High-level entry point
// ============================================================================

use std::sync::Arc;

/// Migrates a whole world held by a single host object.
///
/// Convenience wrapper for hosts that implement every collaborator trait on
/// one type, like [`MemoryWorld`].
///
/// # Examples
///
/// ```
/// use rits_migrate::{MemoryWorld, MigrationConfig, migrate_world};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let world = Arc::new(MemoryWorld::new());
/// let report = migrate_world(world, MigrationConfig::new().target_version("1.4.0")).await;
/// assert_eq!(report.target_version, "1.4.0");
/// # }
/// ```
pub async fn migrate_world<H>(host: Arc<H>, config: MigrationConfig) -> MigrationReport
where
    H: RecordStore + ConfigStore + Notifier + 'static,
{
    if let Err(err) = register_system_settings(host.as_ref(), &config).await {
        log::error!("could not register system settings: {}", err);
    }
    MigrationRunner::new(host.clone(), host.clone(), host)
        .with_config(config)
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_world_records_version() {
        let world = Arc::new(MemoryWorld::new());
        let report = migrate_world(world.clone(), MigrationConfig::new().target_version("1.4.0")).await;
        assert!(report.is_clean());
        assert_eq!(
            world.get(SYSTEM_NAMESPACE, MIGRATION_VERSION_KEY).await.unwrap(),
            serde_json::json!("1.4.0")
        );
    }
}
