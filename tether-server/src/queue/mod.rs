mod client_queue;

pub use client_queue::*;
