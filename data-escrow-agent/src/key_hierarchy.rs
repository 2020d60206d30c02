//! The key hierarchy: one wrapped secret per (subject, controller) pair,
//! one derived key per data type.
//!
//! Provisioning happens when the first client for a pair registers; release
//! happens when an authorized token is exchanged. The decrypted escrow
//! secret exists only inside [`release_key`]; callers only ever see the
//! per-data-type derivative.

use rand::{CryptoRng, RngCore};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{info, instrument};

use data_escrow::crypto::{DerivedKey, EscrowSecret, MasterKey};
use data_escrow::types::database::client::{ControllerId, SubjectId};
use data_escrow::types::database::key::StoredKey;
use data_escrow::types::rules::ValidityWindow;
use data_escrow::types::taxonomy::DataType;
use data_escrow::DataEscrowError;

use crate::database::DataStore;
use crate::EscrowAgentError;

/// Generate a fresh escrow secret for the pair and wrap it under the master
/// key. The caller persists the returned record.
pub fn provision_key(
    rng: &mut (impl CryptoRng + RngCore),
    master_key: &MasterKey,
    subject: &SubjectId,
    controller: &ControllerId,
    now: OffsetDateTime,
    validity: Duration,
) -> Result<StoredKey, EscrowAgentError> {
    let secret = EscrowSecret::generate(rng);
    let encrypted_content = master_key.wrap_secret(rng, secret, subject, controller)?;
    Ok(StoredKey {
        data_subject_id: subject.clone(),
        data_controller_id: controller.clone(),
        encrypted_content,
        window: ValidityWindow::starting(
            now,
            time::Duration::milliseconds(validity.as_millis() as i64),
        ),
    })
}

/// Unwrap the pair's escrow secret and derive the key for one data type.
#[instrument(skip(db, master_key), err(Debug))]
pub async fn release_key<DB: DataStore>(
    db: &DB,
    master_key: &MasterKey,
    subject: &SubjectId,
    controller: &ControllerId,
    data_type: DataType,
    now: OffsetDateTime,
) -> Result<DerivedKey, EscrowAgentError> {
    let stored = db.find_key(subject, controller).await?.ok_or_else(|| {
        DataEscrowError::UnretrievableKey(
            "no escrow key is held for this subject and controller".to_string(),
        )
    })?;
    if !stored.window.covers(now) {
        return Err(DataEscrowError::UnretrievableKey(
            "the escrow key for this subject and controller has expired".to_string(),
        )
        .into());
    }

    let secret = master_key.unwrap_secret(stored.encrypted_content, subject, controller)?;
    info!("derived key released");
    Ok(DerivedKey::derive(&secret, data_type))
}
