//! The service façade handed to the transport layer.

pub mod context;
pub mod service;

pub use context::Context;
pub use service::EscrowService;
