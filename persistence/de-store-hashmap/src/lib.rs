//! In-memory [`data_escrow_agent::database::DataStore`] implementation
//! backed by hashmaps. Suitable for tests and single-instance deployments;
//! nothing survives a restart.
#![warn(unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

mod api;

pub use api::HashmapStore;
