use super::{lenient_label, null_as_default};
use crate::core::Numeric;
use crate::core::value::deserialize_present;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The actor variants the migration cares about.
///
/// The host may define more; those are kept by name and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActorKind {
    Character,
    Crew,
    Other(String),
}

impl From<String> for ActorKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "character" => ActorKind::Character,
            "crew" => ActorKind::Crew,
            _ => ActorKind::Other(value),
        }
    }
}

impl From<ActorKind> for String {
    fn from(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Character => "character".to_string(),
            ActorKind::Crew => "crew".to_string(),
            ActorKind::Other(name) => name,
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

/// Source state of an actor document.
///
/// Fields the migration does not touch are kept in `extra` so a record
/// survives a load/save cycle unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActorKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub system: ActorSystem,
    #[serde(default, deserialize_with = "null_as_default")]
    pub effects: Vec<Effect>,
    #[serde(rename = "prototypeToken", default)]
    pub prototype_token: PrototypeToken,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ActorKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            system: ActorSystem::default(),
            effects: Vec::new(),
            prototype_token: PrototypeToken::default(),
            extra: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, attribute: Attribute) -> Self {
        self.system.attributes.insert(key.into(), attribute);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_healing_clock(mut self, value: impl Into<Numeric>) -> Self {
        self.system.healing_clock = Some(value.into());
        self
    }

    pub fn effect_mut(&mut self, id: &str) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|effect| effect.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorSystem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(
        rename = "healing-clock",
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub healing_clock: Option<Numeric>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default, deserialize_with = "lenient_label")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: BTreeMap<String, Skill>,
    /// Everything else, e.g. the attribute's own `value`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attribute {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_skill(mut self, key: impl Into<String>, skill: Skill) -> Self {
        self.skills.insert(key.into(), skill);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default, deserialize_with = "lenient_label")]
    pub label: String,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Numeric>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Skill {
    pub fn new(label: impl Into<String>, value: impl Into<Numeric>) -> Self {
        Self {
            label: label.into(),
            value: Some(value.into()),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: Vec<Change>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Effect {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            changes: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }
}

/// One active-effect modification: a dotted data path, how to apply it and
/// the operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub key: String,
    pub mode: ChangeMode,
    #[serde(default)]
    pub value: Value,
}

impl Change {
    pub fn new(key: impl Into<String>, mode: ChangeMode, value: Value) -> Self {
        Self {
            key: key.into(),
            mode,
            value,
        }
    }
}

/// How an effect change combines with the base value. Stored by the host
/// as its numeric code; codes this crate does not know are kept as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChangeMode {
    Custom,
    Multiply,
    Add,
    Downgrade,
    Upgrade,
    Override,
    Unknown(u8),
}

impl From<u8> for ChangeMode {
    fn from(code: u8) -> Self {
        match code {
            0 => ChangeMode::Custom,
            1 => ChangeMode::Multiply,
            2 => ChangeMode::Add,
            3 => ChangeMode::Downgrade,
            4 => ChangeMode::Upgrade,
            5 => ChangeMode::Override,
            other => ChangeMode::Unknown(other),
        }
    }
}

impl From<ChangeMode> for u8 {
    fn from(mode: ChangeMode) -> Self {
        match mode {
            ChangeMode::Custom => 0,
            ChangeMode::Multiply => 1,
            ChangeMode::Add => 2,
            ChangeMode::Downgrade => 3,
            ChangeMode::Upgrade => 4,
            ChangeMode::Override => 5,
            ChangeMode::Unknown(code) => code,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrototypeToken {
    #[serde(rename = "actorLink", default)]
    pub actor_link: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
