//! Cryptography, protocol types, and wire encodings shared by the entities
//! of the data escrow system.
//!
//! Personal data held by a data controller is only ever stored encrypted;
//! the escrow agent mediates every encryption and decryption by granting
//! short-lived keys through a signed, three-legged token protocol. This
//! crate holds the pieces both sides of that protocol agree on: the
//! signature engine, the key hierarchy primitives, the data-semantics
//! vocabulary, and the URL-encoded wire format. It is designed as a
//! dependency for `data-escrow-agent` and the persistence backends.
#![warn(unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod constants;
pub mod crypto;
pub mod error;
pub mod types;

pub use error::DataEscrowError;
