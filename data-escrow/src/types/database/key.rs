//! Escrow key records.

use serde::{Deserialize, Serialize};

use super::client::{ControllerId, SubjectId};
use crate::crypto::{Encrypted, EscrowSecret};
use crate::types::rules::ValidityWindow;

/// The wrapped per-(subject, controller) secret and its validity window.
///
/// The secret is generated once, stored only in wrapped form, and re-issued
/// rather than updated when its window elapses. Plaintext secret material
/// never appears in storage or on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredKey {
    pub data_subject_id: SubjectId,
    pub data_controller_id: ControllerId,
    pub encrypted_content: Encrypted<EscrowSecret>,
    pub window: ValidityWindow,
}
