//! Replay-protection records.

use serde::{Deserialize, Serialize};

use super::client::ClientId;

/// A nonce observed on a signed call from one client.
///
/// Write-once: its existence rejects any second request carrying the same
/// value for the same client inside the timestamp window. Records may be
/// pruned once the window has safely passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce {
    pub value: String,
    pub client_id: ClientId,
    /// Request timestamp in Unix epoch milliseconds, kept for pruning.
    pub timestamp_ms: i64,
}
