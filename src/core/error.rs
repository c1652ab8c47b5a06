use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Reference schema has no entry for attribute '{attribute}'")]
    MissingAttributeSchema { attribute: String },

    #[error("Reference schema has no entry for skill '{skill}' in attribute '{attribute}'")]
    MissingSkillSchema { attribute: String, skill: String },

    #[error("Record '{0}' not found")]
    RecordNotFound(String),

    #[error("Effect '{effect}' not found on actor '{actor}'")]
    UnknownEffect { actor: String, effect: String },

    #[error("Payload does not apply to record '{0}'")]
    PayloadMismatch(String),

    #[error("Type enforcement rejected update: {0}")]
    TypeEnforcement(String),

    #[error("Setting '{namespace}.{key}' is not registered")]
    SettingNotRegistered { namespace: String, key: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

impl<T> From<std::sync::PoisonError<T>> for MigrationError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
