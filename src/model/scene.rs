use super::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tokens: Vec<Token>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scene {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tokens: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.tokens.push(token);
        self
    }
}

/// A placed token. When `actor_link` is false the token carries its own
/// copy of actor data in `actor_data`, overriding the base actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "actorId", default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(rename = "actorLink", default)]
    pub actor_link: bool,
    #[serde(rename = "actorData", default, deserialize_with = "null_as_default")]
    pub actor_data: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Token {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actor_id: None,
            actor_link: false,
            actor_data: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn for_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn linked(mut self, actor_link: bool) -> Self {
        self.actor_link = actor_link;
        self
    }

    pub fn with_override(mut self, path: impl Into<String>, value: Value) -> Self {
        self.actor_data.insert(path.into(), value);
        self
    }
}

impl From<&Token> for Value {
    fn from(token: &Token) -> Self {
        let mut object = token.extra.clone();
        object.insert("_id".to_string(), Value::String(token.id.clone()));
        if let Some(actor_id) = &token.actor_id {
            object.insert("actorId".to_string(), Value::String(actor_id.clone()));
        }
        object.insert("actorLink".to_string(), Value::Bool(token.actor_link));
        object.insert("actorData".to_string(), Value::Object(token.actor_data.clone()));
        Value::Object(object)
    }
}
