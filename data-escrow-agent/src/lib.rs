//! The escrow agent service.
//!
//! A data controller's application never touches personal data in the clear
//! without this agent's say-so: it requests a token, the authorization
//! engine renders a decision against the data subject's rules (or the
//! default policy), and only an authorized token can be exchanged for the
//! short-lived key that encrypts or decrypts one data type. This crate
//! implements that protocol over an abstract [`database::DataStore`];
//! transports deliver parsed parameter maps to [`server::EscrowService`]
//! and write back the status and body it returns.
#![warn(unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod authorization;
pub mod config;
pub mod database;
pub mod error;
pub mod key_hierarchy;
pub mod operations;
pub mod server;
pub mod validation;

pub use config::Config;
pub use error::EscrowAgentError;
