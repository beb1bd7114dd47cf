mod delivery;
mod room_config;
mod room_coordinator;

pub use delivery::*;
pub use room_config::*;
pub use room_coordinator::*;
