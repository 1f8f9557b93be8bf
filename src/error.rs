use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Invalid timestamp: {0}")]
    TimestampParse(String),

    #[error("Invalid due window: {0}")]
    WindowParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Snapshot(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
