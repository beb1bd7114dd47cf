use crate::model::error::IdError;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Joins a room id and a local id into a single client id.
pub const SEPARATOR: &str = "==";

/// Identity of one participant, usually `room_id == uuid`.
///
/// Clients issued by the server always carry their room as a prefix so that
/// lifecycle hooks, which only receive the bare client id, can route it back
/// to its room without a lookup. Pull-mode clients may choose their own id;
/// those are accepted as-is and simply fail [`ClientId::room`].
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::EmptyClient);
        }
        Ok(Self(id))
    }

    pub fn compose(room: &RoomId, local: &str) -> Self {
        Self(format!("{}{}{}", room.as_str(), SEPARATOR, local))
    }

    /// Mints a fresh id in `room`.
    pub fn generate(room: &RoomId) -> Self {
        Self::compose(room, &Uuid::new_v4().to_string())
    }

    /// Splits on the first separator.
    pub fn decompose(&self) -> Result<(RoomId, &str), IdError> {
        let (room, local) = self
            .0
            .split_once(SEPARATOR)
            .ok_or_else(|| IdError::Unbound(self.0.clone()))?;
        if local.is_empty() {
            return Err(IdError::Unbound(self.0.clone()));
        }
        Ok((RoomId::new(room)?, local))
    }

    pub fn room(&self) -> Result<RoomId, IdError> {
        self.decompose().map(|(room, _)| room)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ClientId {
    type Error = IdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
