use crate::store::StoreError;
use tether_core::{IdError, RoomId};
use thiserror::Error;

/// Failures that cross the coordinator boundary.
///
/// Business outcomes (room full, duplicate join, leave of a non-member,
/// relay to a non-member) are resolved inside the coordinator and never show
/// up here.
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error(transparent)]
    Validation(#[from] IdError),

    #[error("relay payload is not valid UTF-8")]
    NonUtf8Payload,

    #[error("malformed relay batch: {0}")]
    MalformedBatch(String),

    #[error("unknown channel token")]
    UnknownToken,

    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("gave up on {key} after {attempts} contended attempts")]
    ContentionExceeded { key: String, attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode or decode a signal message: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SignalingError {
    /// Short machine-readable name used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalingError::Validation(_)
            | SignalingError::NonUtf8Payload
            | SignalingError::MalformedBatch(_)
            | SignalingError::UnknownToken => "ValidationError",
            SignalingError::RoomNotFound(_) => "RoomNotFound",
            SignalingError::ContentionExceeded { .. } => "ContentionExceeded",
            SignalingError::Store(_) => "StoreError",
            SignalingError::Serialization(_) => "SerializationError",
        }
    }
}

pub type SignalingResult<T> = Result<T, SignalingError>;
