use super::patch::{FieldOp, ScenePatch};
use crate::model::Scene;
use serde_json::Map;

/// Links every placed token to its actor and drops its local overrides.
///
/// Works on a copy of the token list; the full list is returned as the
/// replacement.
pub fn migrate_scene(scene: &Scene) -> ScenePatch {
    let tokens = scene
        .tokens
        .iter()
        .cloned()
        .map(|mut token| {
            token.actor_link = true;
            token.actor_data = Map::new();
            token
        })
        .collect();

    ScenePatch {
        tokens: FieldOp::Set(tokens),
    }
}
