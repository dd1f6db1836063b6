use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    /// The inbound message could not be read as an uplink envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Record encoding error: {0}")]
    RecordEncoding(#[from] serde_json::Error),

    #[error("Storage write error: {0}")]
    StorageWrite(#[from] anyhow::Error),
}
