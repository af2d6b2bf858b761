use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkSyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Detector is shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, WorkSyncError>;
