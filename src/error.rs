#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid VAPID key: {0}")]
    InvalidKeyFormat(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("storage error: database lock poisoned")]
    StorageLock,
    #[error("storage task failed: {0}")]
    StorageTask(#[from] tokio::task::JoinError),
    #[error("invalid duration '{0}' (use e.g. 30d, 24h, 60m)")]
    InvalidDuration(String),
    #[error("failed to encode push payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
