use crate::channel::SensorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid base64 payload: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("insufficient data at offset {offset}: expected {expected} bytes, got {actual}")]
    InsufficientData {
        offset: usize,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported sensor type {type_id} on channel {channel}")]
    UnsupportedType { channel: u8, type_id: u8 },

    #[error("invalid {kind} value on channel {channel}: {reason}")]
    InvalidValue {
        channel: u8,
        kind: SensorKind,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, PayloadError>;
