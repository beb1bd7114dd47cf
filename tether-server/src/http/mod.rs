mod api_error;
mod app_state;
mod handlers;
mod router;

pub use api_error::*;
pub use app_state::*;
pub use handlers::*;
pub use router::*;
