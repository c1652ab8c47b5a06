pub mod actor;
pub mod scene;
pub mod schema;

pub use actor::{
    Actor, ActorKind, ActorSystem, Attribute, Change, ChangeMode, Effect, PrototypeToken, Skill,
};
pub use scene::{Scene, Token};
pub use schema::{AttributeTemplate, ReferenceSchema, SkillTemplate};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// Old worlds store `null` where newer ones store an empty collection.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// Labels are display text only; a missing or odd one reads as text.
pub(crate) fn lenient_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(label) => label,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
