use super::actor::migrate_actor;
use super::patch::UpdatePayload;
use super::rename::RenameTable;
use super::report::{
    CollectionFailure, MigrationReport, MigrationStep, OutcomeStatus, PlannedUpdate, RecordOutcome,
};
use super::scene::migrate_scene;
use super::token::migrate_token_link;
use super::version::needs_migration;
use crate::config::MigrationConfig;
use crate::core::Result;
use crate::host::{ConfigStore, Notifier, NotifyOptions, RecordStore, UpdateOptions};
use crate::model::{Actor, ActorKind, ReferenceSchema};
use chrono::Utc;
use log::{error, info};
use serde_json::Value;
use std::sync::Arc;

/// Runs the world migration against host collaborators.
///
/// Records are migrated one at a time, actors before scenes, each update
/// awaited before the next. A failing record is logged and reported but
/// never stops the run, and the target version is written at the end
/// regardless.
pub struct MigrationRunner {
    records: Arc<dyn RecordStore>,
    settings: Arc<dyn ConfigStore>,
    notifier: Arc<dyn Notifier>,
    config: MigrationConfig,
    schema: ReferenceSchema,
    renames: RenameTable,
}

impl MigrationRunner {
    pub fn new(
        records: Arc<dyn RecordStore>,
        settings: Arc<dyn ConfigStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            records,
            settings,
            notifier,
            config: MigrationConfig::default(),
            schema: ReferenceSchema::character(),
            renames: RenameTable::global().clone(),
        }
    }

    pub fn with_config(mut self, config: MigrationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_schema(mut self, schema: ReferenceSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_renames(mut self, renames: RenameTable) -> Self {
        self.renames = renames;
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Runs the migration only when the stored version asks for it.
    pub async fn run_if_needed(&self) -> Option<MigrationReport> {
        let stored = match self
            .settings
            .get(&self.config.namespace, &self.config.setting_key)
            .await
        {
            Ok(value) => value,
            Err(err) => {
                log::warn!("could not read stored migration version: {}", err);
                Value::Null
            }
        };

        if !needs_migration(&stored, &self.config.needs_migration_version) {
            info!(
                "world at version {} needs no migration (floor {})",
                stored, self.config.needs_migration_version
            );
            return None;
        }
        Some(self.run().await)
    }

    /// Migrates every actor and scene, then records the target version.
    pub async fn run(&self) -> MigrationReport {
        let target = self.config.target_version.clone();
        let mut report = MigrationReport::new(&target);

        self.notify(&format!(
            "Applying RITS Actors migration for version {}. Please be patient and do not close your game or shut down your server.",
            target
        ));

        match self.records.actors().await {
            Ok(actors) => {
                for actor in &actors {
                    for (step, payload) in self.actor_payloads(actor) {
                        let outcome = self.submit(&actor.id, &actor.name, step, payload).await;
                        report.outcomes.push(outcome);
                    }
                }
            }
            Err(err) => {
                error!("could not list actors: {}", err);
                report.collection_failures.push(CollectionFailure {
                    collection: "actors",
                    error: err.to_string(),
                });
            }
        }

        match self.records.scenes().await {
            Ok(scenes) => {
                for scene in &scenes {
                    let payload = Ok(UpdatePayload::from(migrate_scene(scene)));
                    let outcome = self
                        .submit(&scene.id, &scene.name, MigrationStep::SceneTokens, payload)
                        .await;
                    report.outcomes.push(outcome);
                }
            }
            Err(err) => {
                error!("could not list scenes: {}", err);
                report.collection_failures.push(CollectionFailure {
                    collection: "scenes",
                    error: err.to_string(),
                });
            }
        }

        match self
            .settings
            .set(
                &self.config.namespace,
                &self.config.setting_key,
                Value::String(target.clone()),
            )
            .await
        {
            Ok(()) => report.version_recorded = true,
            Err(err) => error!("could not record migration version {}: {}", target, err),
        }

        self.notify(&format!(
            "RITS System Migration to version {} completed!",
            target
        ));

        report.finished_at = Utc::now();
        info!("{}", report);
        report
    }

    /// Computes every payload without submitting anything.
    pub async fn plan(&self) -> Result<Vec<PlannedUpdate>> {
        let mut planned = Vec::new();

        for actor in self.records.actors().await? {
            for (step, payload) in self.actor_payloads(&actor) {
                planned.push(PlannedUpdate {
                    record_id: actor.id.clone(),
                    record_name: actor.name.clone(),
                    step,
                    payload: payload.map_err(|err| err.to_string()),
                });
            }
        }

        for scene in self.records.scenes().await? {
            planned.push(PlannedUpdate {
                record_id: scene.id.clone(),
                record_name: scene.name.clone(),
                step: MigrationStep::SceneTokens,
                payload: Ok(migrate_scene(&scene).into()),
            });
        }

        Ok(planned)
    }

    fn actor_payloads(&self, actor: &Actor) -> Vec<(MigrationStep, Result<UpdatePayload>)> {
        let mut payloads = Vec::new();
        if actor.kind == ActorKind::Character {
            payloads.push((
                MigrationStep::ActorAttributes,
                migrate_actor(actor, &self.schema, &self.renames).map(UpdatePayload::from),
            ));
        }
        if matches!(actor.kind, ActorKind::Character | ActorKind::Crew) {
            payloads.push((MigrationStep::TokenLink, Ok(migrate_token_link().into())));
        }
        payloads
    }

    async fn submit(
        &self,
        record_id: &str,
        record_name: &str,
        step: MigrationStep,
        payload: Result<UpdatePayload>,
    ) -> RecordOutcome {
        let status = match payload {
            Err(err) => {
                error!("{} '{}' failed: {}", step, record_name, err);
                OutcomeStatus::Failed(err.to_string())
            }
            Ok(payload) if payload.is_empty() => OutcomeStatus::NoOp,
            Ok(payload) => {
                info!("{} {}", step.log_prefix(), record_name);
                let options = UpdateOptions {
                    enforce_types: self.config.enforce_types,
                };
                match self.records.update(record_id, &payload, options).await {
                    Ok(()) => OutcomeStatus::Applied,
                    Err(err) => {
                        error!("{} '{}' failed: {}", step, record_name, err);
                        OutcomeStatus::Failed(err.to_string())
                    }
                }
            }
        };

        RecordOutcome {
            record_id: record_id.to_string(),
            record_name: record_name.to_string(),
            step,
            status,
        }
    }

    fn notify(&self, message: &str) {
        self.notifier.info(
            message,
            NotifyOptions {
                permanent: self.config.permanent_notifications,
            },
        );
    }
}
