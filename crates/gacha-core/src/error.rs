use thiserror::Error;

#[derive(Debug, Error)]
pub enum GachaError {
    #[error("not initialized: run 'gacha init'")]
    NotInitialized,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown {kind} '{id}'")]
    UnknownSelector { kind: &'static str, id: String },

    #[error("invalid content record: {0}")]
    InvalidRecord(String),

    #[error("static table is corrupt: {0}")]
    StaticTable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GachaError>;
