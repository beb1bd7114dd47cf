mod memory_store;
mod set_ops;
mod versioned_store;

pub use memory_store::*;
pub use set_ops::*;
pub use versioned_store::*;
