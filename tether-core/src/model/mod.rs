mod client;
mod error;
mod room;
mod signaling;
mod stats;

pub use client::{ClientId, SEPARATOR};
pub use error::IdError;
pub use room::RoomId;
pub use signaling::{RECONNECT_MARKER, SignalMessage};
pub use stats::RoomStats;
