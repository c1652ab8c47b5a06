use super::world_file::{UnreadableRecord, WorldSnapshot};
use super::{ConfigStore, NotifyOptions, Notifier, RecordStore, UpdateOptions};
use crate::core::{MigrationError, Result};
use crate::migration::UpdatePayload;
use crate::model::{Actor, Scene};
use crate::settings::{SettingDefinition, setting_key};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use tokio::sync::RwLock;

/// A notification as the host would have displayed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub permanent: bool,
}

/// In-memory game world: records, settings and a notification log.
///
/// Implements every host trait, applies payloads the way the host does
/// and lets tests make updates of chosen records fail.
#[derive(Default)]
pub struct MemoryWorld {
    actors: RwLock<Vec<Actor>>,
    scenes: RwLock<Vec<Scene>>,
    definitions: RwLock<BTreeMap<String, SettingDefinition>>,
    settings: RwLock<BTreeMap<String, Value>>,
    notifications: Mutex<Vec<Notification>>,
    failing_records: Mutex<HashSet<String>>,
    update_log: Mutex<Vec<(String, UpdatePayload)>>,
    unreadable_actors: Mutex<bool>,
    set_aside: Vec<UnreadableRecord>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actors(mut self, actors: Vec<Actor>) -> Self {
        self.actors = RwLock::new(actors);
        self
    }

    pub fn with_scenes(mut self, scenes: Vec<Scene>) -> Self {
        self.scenes = RwLock::new(scenes);
        self
    }

    pub fn from_snapshot(snapshot: WorldSnapshot) -> Self {
        Self {
            actors: RwLock::new(snapshot.actors),
            scenes: RwLock::new(snapshot.scenes),
            settings: RwLock::new(snapshot.settings),
            set_aside: snapshot.unreadable,
            ..Self::default()
        }
    }

    pub async fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            actors: self.actors.read().await.clone(),
            scenes: self.scenes.read().await.clone(),
            settings: self.settings.read().await.clone(),
            unreadable: self.set_aside.clone(),
        }
    }

    /// Records the world file could not read; they are not migrated.
    pub fn unreadable_records(&self) -> &[UnreadableRecord] {
        &self.set_aside
    }

    pub async fn actor(&self, id: &str) -> Option<Actor> {
        self.actors.read().await.iter().find(|a| a.id == id).cloned()
    }

    pub async fn scene(&self, id: &str) -> Option<Scene> {
        self.scenes.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Makes every later update of `record_id` fail.
    pub fn fail_updates_for(&self, record_id: impl Into<String>) -> Result<()> {
        self.failing_records.lock()?.insert(record_id.into());
        Ok(())
    }

    /// Makes listing actors fail.
    pub fn fail_actor_listing(&self) -> Result<()> {
        *self.unreadable_actors.lock()? = true;
        Ok(())
    }

    pub fn notifications(&self) -> Result<Vec<Notification>> {
        Ok(self.notifications.lock()?.clone())
    }

    /// Every update that reached the store, in order, including rejected ones.
    pub fn update_log(&self) -> Result<Vec<(String, UpdatePayload)>> {
        Ok(self.update_log.lock()?.clone())
    }

    async fn update_actor(&self, record_id: &str, payload: &UpdatePayload) -> Result<()> {
        let mut actors = self.actors.write().await;
        let actor = actors
            .iter_mut()
            .find(|actor| actor.id == record_id)
            .ok_or_else(|| MigrationError::RecordNotFound(record_id.to_string()))?;

        // Work on a copy so a failing patch leaves the record untouched.
        let mut updated = actor.clone();
        match payload {
            UpdatePayload::Actor(patch) => patch.apply_to(&mut updated)?,
            UpdatePayload::TokenLink(patch) => patch.apply_to(&mut updated),
            UpdatePayload::Scene(_) => {
                return Err(MigrationError::PayloadMismatch(record_id.to_string()));
            }
        }
        *actor = updated;
        Ok(())
    }

    async fn update_scene(&self, record_id: &str, payload: &UpdatePayload) -> Result<()> {
        let UpdatePayload::Scene(patch) = payload else {
            return Err(MigrationError::PayloadMismatch(record_id.to_string()));
        };
        let mut scenes = self.scenes.write().await;
        let scene = scenes
            .iter_mut()
            .find(|scene| scene.id == record_id)
            .ok_or_else(|| MigrationError::RecordNotFound(record_id.to_string()))?;
        patch.apply_to(scene);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryWorld {
    async fn actors(&self) -> Result<Vec<Actor>> {
        let unreadable = *self.unreadable_actors.lock()?;
        if unreadable {
            return Err(MigrationError::Store("actor collection unavailable".to_string()));
        }
        Ok(self.actors.read().await.clone())
    }

    async fn scenes(&self) -> Result<Vec<Scene>> {
        Ok(self.scenes.read().await.clone())
    }

    async fn update(
        &self,
        record_id: &str,
        payload: &UpdatePayload,
        options: UpdateOptions,
    ) -> Result<()> {
        self.update_log
            .lock()?
            .push((record_id.to_string(), payload.clone()));

        let rejected = self.failing_records.lock()?.contains(record_id);
        if rejected {
            return Err(MigrationError::Store(format!(
                "update of '{}' rejected",
                record_id
            )));
        }
        if options.enforce_types {
            payload.check_types()?;
        }

        match payload {
            UpdatePayload::Scene(_) => self.update_scene(record_id, payload).await,
            _ => self.update_actor(record_id, payload).await,
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryWorld {
    async fn register(&self, definition: SettingDefinition) -> Result<()> {
        self.definitions
            .write()
            .await
            .insert(definition.full_key(), definition);
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Value> {
        let full_key = setting_key(namespace, key);
        if let Some(value) = self.settings.read().await.get(&full_key) {
            return Ok(value.clone());
        }
        self.definitions
            .read()
            .await
            .get(&full_key)
            .map(|definition| definition.default.clone())
            .ok_or_else(|| MigrationError::SettingNotRegistered {
                namespace: namespace.to_string(),
                key: key.to_string(),
            })
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<()> {
        let full_key = setting_key(namespace, key);
        if !self.definitions.read().await.contains_key(&full_key) {
            return Err(MigrationError::SettingNotRegistered {
                namespace: namespace.to_string(),
                key: key.to_string(),
            });
        }
        self.settings.write().await.insert(full_key, value);
        Ok(())
    }
}

impl Notifier for MemoryWorld {
    fn info(&self, message: &str, options: NotifyOptions) {
        log::info!("{}", message);
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(Notification {
                message: message.to_string(),
                permanent: options.permanent,
            });
        }
    }
}
