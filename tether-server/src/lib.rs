//! Room membership and relay engine for peer-to-peer signaling.
//!
//! Clients join a room, trade opaque negotiation payloads through the server
//! and leave. All shared state lives in a [`VersionedStore`]; every mutation
//! is a bounded compare-and-swap loop ([`SetOps`]), so any number of server
//! instances can front the same store without locks.
//!
//! Notifications leave through a [`Delivery`]: [`PushDelivery`] writes to
//! open WebSockets, [`ClientQueue`] parks messages until the client polls.

mod error;
mod http;
mod queue;
mod room;
mod signaling;
mod store;

pub use error::*;
pub use http::*;
pub use queue::*;
pub use room::*;
pub use signaling::*;
pub use store::*;
