//! The RITS world migration: rename table, payload builders and runner.
//!
//! Payload builders are pure functions over a single record; only
//! [`MigrationRunner`] talks to the host.

pub mod actor;
pub mod patch;
pub mod rename;
pub mod report;
pub mod runner;
pub mod scene;
pub mod token;
pub mod version;

pub use actor::migrate_actor;
pub use patch::{
    ActorPatch, AttributePatch, EffectPatch, FieldOp, ScenePatch, SkillPatch, TokenLinkPatch,
    UpdatePayload,
};
pub use rename::RenameTable;
pub use report::{
    CollectionFailure, MigrationReport, MigrationStep, OutcomeStatus, PlannedUpdate, RecordOutcome,
};
pub use runner::MigrationRunner;
pub use scene::migrate_scene;
pub use token::migrate_token_link;
pub use version::{compare_versions, is_newer_version, needs_migration};
