use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown framework '{0}': expected laravel, rails, django, express or unknown")]
    UnknownFramework(String),

    #[error("unknown schema '{0}': expected database, api, businessLogic or componentArchitecture")]
    UnknownSchema(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("program not found on PATH: {0}")]
    ProgramNotFound(String),

    #[error("failed to spawn '{program}': {reason}")]
    ProcessSpawn { program: String, reason: String },

    #[error("'{program}' exited with code {code}: {stderr}")]
    ProcessFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("'{program}' did not finish within {seconds}s")]
    ProcessTimeout { program: String, seconds: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
