// ============================================================================
// Update Payloads
// ============================================================================
//
// Sparse, typed partial updates. Every touched field carries a FieldOp:
// Keep (absent from the update), Set (write a value) or Delete (remove the
// key). A payload made only of Keep ops is empty and never submitted.
//
// ============================================================================

use crate::core::{MigrationError, Numeric, Result};
use crate::model::{Actor, Attribute, Change, Scene, Skill, Token};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// What an update does to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp<T> {
    Keep,
    Set(T),
    Delete,
}

impl<T> Default for FieldOp<T> {
    fn default() -> Self {
        FieldOp::Keep
    }
}

impl<T> FieldOp<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldOp::Keep)
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, FieldOp::Delete)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            FieldOp::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: PartialEq> FieldOp<T> {
    /// `Set(next)` unless `current` already holds it.
    pub fn diff(current: Option<&T>, next: T) -> Self {
        match current {
            Some(value) if *value == next => FieldOp::Keep,
            _ => FieldOp::Set(next),
        }
    }
}

// ============================================================================
// Actor attributes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillPatch {
    pub label: FieldOp<String>,
    pub value: FieldOp<Numeric>,
    /// Other fields written as-is; used when a skill moves to a new key.
    pub fields: Map<String, Value>,
}

impl SkillPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_keep() && self.value.is_keep() && self.fields.is_empty()
    }

    fn apply_to(&self, skill: &mut Skill) {
        apply_op(&self.label, &mut skill.label);
        match &self.value {
            FieldOp::Keep => {}
            FieldOp::Set(value) => skill.value = Some(value.clone()),
            FieldOp::Delete => skill.value = None,
        }
        for (name, value) in &self.fields {
            skill.extra.insert(name.clone(), value.clone());
        }
    }

    fn to_host_json(&self) -> Value {
        let mut object = self.fields.clone();
        put_op(&mut object, "label", &self.label, |label| json!(label));
        put_op(&mut object, "value", &self.value, numeric_json);
        Value::Object(object)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributePatch {
    pub label: FieldOp<String>,
    pub skills: BTreeMap<String, FieldOp<SkillPatch>>,
    /// Other fields written as-is; used when an attribute moves to a new key.
    pub fields: Map<String, Value>,
}

impl AttributePatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_keep()
            && self.fields.is_empty()
            && self.skills.values().all(|op| match op {
                FieldOp::Keep => true,
                FieldOp::Set(patch) => patch.is_empty(),
                FieldOp::Delete => false,
            })
    }

    fn apply_to(&self, attribute: &mut Attribute) {
        apply_op(&self.label, &mut attribute.label);
        for (key, op) in &self.skills {
            match op {
                FieldOp::Keep => {}
                FieldOp::Set(patch) => patch.apply_to(attribute.skills.entry(key.clone()).or_default()),
                FieldOp::Delete => {
                    attribute.skills.remove(key);
                }
            }
        }
        for (name, value) in &self.fields {
            attribute.extra.insert(name.clone(), value.clone());
        }
    }

    fn to_host_json(&self) -> Value {
        let mut object = self.fields.clone();
        put_op(&mut object, "label", &self.label, |label| json!(label));
        if !self.skills.is_empty() {
            let mut skills = Map::new();
            for (key, op) in &self.skills {
                put_op(&mut skills, key, op, SkillPatch::to_host_json);
            }
            object.insert("skills".to_string(), Value::Object(skills));
        }
        Value::Object(object)
    }
}

/// Replacement change list for one active effect, matched by id.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectPatch {
    pub id: String,
    pub changes: Vec<Change>,
}

/// The attribute/skill rename and coercion update for one character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorPatch {
    pub attributes: BTreeMap<String, FieldOp<AttributePatch>>,
    pub effects: FieldOp<Vec<EffectPatch>>,
    pub healing_clock: FieldOp<Numeric>,
}

impl ActorPatch {
    pub fn is_empty(&self) -> bool {
        self.effects.is_keep()
            && self.healing_clock.is_keep()
            && self.attributes.values().all(|op| match op {
                FieldOp::Keep => true,
                FieldOp::Set(patch) => patch.is_empty(),
                FieldOp::Delete => false,
            })
    }

    pub fn attribute(&self, key: &str) -> Option<&FieldOp<AttributePatch>> {
        self.attributes.get(key)
    }

    pub fn apply_to(&self, actor: &mut Actor) -> Result<()> {
        for (key, op) in &self.attributes {
            match op {
                FieldOp::Keep => {}
                FieldOp::Set(patch) => {
                    patch.apply_to(actor.system.attributes.entry(key.clone()).or_default())
                }
                FieldOp::Delete => {
                    actor.system.attributes.remove(key);
                }
            }
        }

        match &self.effects {
            FieldOp::Keep => {}
            FieldOp::Set(patches) => {
                let actor_id = actor.id.clone();
                for patch in patches {
                    let effect = actor.effect_mut(&patch.id).ok_or_else(|| {
                        MigrationError::UnknownEffect {
                            actor: actor_id.clone(),
                            effect: patch.id.clone(),
                        }
                    })?;
                    effect.changes = patch.changes.clone();
                }
            }
            FieldOp::Delete => actor.effects.clear(),
        }

        match &self.healing_clock {
            FieldOp::Keep => {}
            FieldOp::Set(value) => actor.system.healing_clock = Some(value.clone()),
            FieldOp::Delete => actor.system.healing_clock = None,
        }
        Ok(())
    }

    fn numeric_values(&self) -> Vec<(String, &Numeric)> {
        let mut values = Vec::new();
        for (attr_key, op) in &self.attributes {
            let Some(patch) = op.as_set() else { continue };
            for (skill_key, skill_op) in &patch.skills {
                if let Some(value) = skill_op.as_set().and_then(|skill| skill.value.as_set()) {
                    values.push((
                        format!("system.attributes.{}.skills.{}.value", attr_key, skill_key),
                        value,
                    ));
                }
            }
        }
        if let Some(value) = self.healing_clock.as_set() {
            values.push(("system.healing-clock".to_string(), value));
        }
        values
    }

    fn to_host_json(&self) -> Value {
        let mut root = Map::new();

        let mut system = Map::new();
        if !self.attributes.is_empty() {
            let mut attributes = Map::new();
            for (key, op) in &self.attributes {
                put_op(&mut attributes, key, op, AttributePatch::to_host_json);
            }
            system.insert("attributes".to_string(), Value::Object(attributes));
        }
        put_op(&mut system, "healing-clock", &self.healing_clock, numeric_json);
        if !system.is_empty() {
            root.insert("system".to_string(), Value::Object(system));
        }

        put_op(&mut root, "effects", &self.effects, |effects| {
            Value::Array(
                effects
                    .iter()
                    .map(|effect| json!({ "_id": effect.id, "changes": effect.changes }))
                    .collect(),
            )
        });
        Value::Object(root)
    }
}

// ============================================================================
// Token link and scene tokens
// ============================================================================

/// Forces the prototype token of an actor to link back to the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLinkPatch {
    pub actor_link: FieldOp<bool>,
}

impl TokenLinkPatch {
    pub fn is_empty(&self) -> bool {
        self.actor_link.is_keep()
    }

    pub fn apply_to(&self, actor: &mut Actor) {
        match self.actor_link {
            FieldOp::Keep => {}
            FieldOp::Set(link) => actor.prototype_token.actor_link = link,
            FieldOp::Delete => actor.prototype_token.actor_link = false,
        }
    }

    fn to_host_json(&self) -> Value {
        let mut root = Map::new();
        put_op(&mut root, "prototypeToken.actorLink", &self.actor_link, |link| json!(link));
        Value::Object(root)
    }
}

/// Full replacement of a scene's token list.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePatch {
    pub tokens: FieldOp<Vec<Token>>,
}

impl ScenePatch {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_keep()
    }

    pub fn apply_to(&self, scene: &mut Scene) {
        match &self.tokens {
            FieldOp::Keep => {}
            FieldOp::Set(tokens) => scene.tokens = tokens.clone(),
            FieldOp::Delete => scene.tokens.clear(),
        }
    }

    fn to_host_json(&self) -> Value {
        let mut root = Map::new();
        put_op(&mut root, "tokens", &self.tokens, |tokens| {
            Value::Array(tokens.iter().map(Value::from).collect())
        });
        Value::Object(root)
    }
}

// ============================================================================
// Payload envelope
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePayload {
    Actor(ActorPatch),
    TokenLink(TokenLinkPatch),
    Scene(ScenePatch),
}

impl UpdatePayload {
    pub fn is_empty(&self) -> bool {
        match self {
            UpdatePayload::Actor(patch) => patch.is_empty(),
            UpdatePayload::TokenLink(patch) => patch.is_empty(),
            UpdatePayload::Scene(patch) => patch.is_empty(),
        }
    }

    /// Fails when any numeric value written by the payload is not an
    /// integer. Hosts run this when schema types are enforced.
    pub fn check_types(&self) -> Result<()> {
        let UpdatePayload::Actor(patch) = self else {
            return Ok(());
        };
        match patch
            .numeric_values()
            .into_iter()
            .find(|(_, value)| !value.is_integer())
        {
            Some((path, value)) => Err(MigrationError::TypeEnforcement(format!(
                "{} must be an integer, got {}",
                path, value
            ))),
            None => Ok(()),
        }
    }

    /// Renders the payload in the host's legacy update shape: nested
    /// objects, `-=key: null` for deletions, dotted keys for single flags.
    pub fn to_host_json(&self) -> Value {
        match self {
            UpdatePayload::Actor(patch) => patch.to_host_json(),
            UpdatePayload::TokenLink(patch) => patch.to_host_json(),
            UpdatePayload::Scene(patch) => patch.to_host_json(),
        }
    }
}

impl From<ActorPatch> for UpdatePayload {
    fn from(patch: ActorPatch) -> Self {
        UpdatePayload::Actor(patch)
    }
}

impl From<TokenLinkPatch> for UpdatePayload {
    fn from(patch: TokenLinkPatch) -> Self {
        UpdatePayload::TokenLink(patch)
    }
}

impl From<ScenePatch> for UpdatePayload {
    fn from(patch: ScenePatch) -> Self {
        UpdatePayload::Scene(patch)
    }
}

fn apply_op(op: &FieldOp<String>, target: &mut String) {
    match op {
        FieldOp::Keep => {}
        FieldOp::Set(value) => *target = value.clone(),
        FieldOp::Delete => target.clear(),
    }
}

fn put_op<T>(object: &mut Map<String, Value>, key: &str, op: &FieldOp<T>, render: impl Fn(&T) -> Value) {
    match op {
        FieldOp::Keep => {}
        FieldOp::Set(value) => {
            object.insert(key.to_string(), render(value));
        }
        FieldOp::Delete => {
            object.insert(format!("-={}", key), Value::Null);
        }
    }
}

fn numeric_json(value: &Numeric) -> Value {
    Value::from(value)
}
