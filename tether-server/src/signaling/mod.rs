mod push_delivery;
mod push_notifier;
mod signaling_service;
mod ws_handler;

pub use push_delivery::*;
pub use push_notifier::*;
pub use signaling_service::*;
pub use ws_handler::*;
