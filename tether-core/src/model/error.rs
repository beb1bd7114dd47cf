use thiserror::Error;

/// Rejections raised while building or parsing room and client identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("must specify room id")]
    EmptyRoom,

    #[error("must specify a \"from\" client id")]
    EmptyClient,

    #[error("room id {0:?} contains the reserved separator")]
    ReservedSeparator(String),

    #[error("client id {0:?} is not bound to a room")]
    Unbound(String),
}
