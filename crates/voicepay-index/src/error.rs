use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("schedule index storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("schedule index entry corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
