// ============================================================================
// Host Collaborators
// ============================================================================
//
// The migration never owns documents, settings or UI. It reaches them
// through these traits, which the game host (or a test double) provides.
//
// ============================================================================

use crate::core::Result;
use crate::migration::UpdatePayload;
use crate::model::{Actor, Scene};
use crate::settings::SettingDefinition;
use async_trait::async_trait;
use serde_json::Value;

pub mod memory;
pub mod world_file;

pub use memory::{MemoryWorld, Notification};
pub use world_file::{UnreadableRecord, WorldFile, WorldSnapshot};

/// Options passed with every record update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// When false the host accepts deletions and loosely typed values
    /// without running its schema validation.
    pub enforce_types: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyOptions {
    /// Stays visible until the user dismisses it.
    pub permanent: bool,
}

/// Live actor and scene collections of the host.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn actors(&self) -> Result<Vec<Actor>>;

    async fn scenes(&self) -> Result<Vec<Scene>>;

    /// Applies a partial update to the record with `record_id`. Actor and
    /// token-link payloads target actors, scene payloads target scenes.
    async fn update(
        &self,
        record_id: &str,
        payload: &UpdatePayload,
        options: UpdateOptions,
    ) -> Result<()>;
}

/// Process-wide settings storage.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn register(&self, definition: SettingDefinition) -> Result<()>;

    /// Stored value, or the registered default when nothing was stored.
    async fn get(&self, namespace: &str, key: &str) -> Result<Value>;

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<()>;
}

/// User-facing banners. Fire and forget.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str, options: NotifyOptions);
}

/// Sends notifications to the log, for hosts without a UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn info(&self, message: &str, _options: NotifyOptions) {
        log::info!("{}", message);
    }
}
