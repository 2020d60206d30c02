//! Application-specific cryptographic types and operations.
//!
//! Defines the master key held by the escrow agent, the per-pair escrow
//! secrets it protects, and the per-data-type keys derived from them.
//! Public functions here are mostly wrappers around multiple low-level
//! cryptographic steps.
//!
//! The key hierarchy has three levels. The master key lives outside the
//! database and never leaves the agent process. One escrow secret exists per
//! (data subject, data controller) pair and is only ever persisted wrapped
//! under the master key. A distinct symmetric key is derived from the secret
//! for every data type, and only those derivatives are released to callers.

use sha2::{Digest, Sha256};
use std::fmt::{Debug, Formatter};
use zeroize::ZeroizeOnDrop;

mod escrow_secret;
mod sealed;
pub mod signature;

pub use escrow_secret::{EscrowSecret, ESCROW_SECRET_LENGTH};
pub use sealed::{AssociatedData, CryptoError, Encrypted, SealingKey};

use crate::types::database::client::{ControllerId, SubjectId};
use rand::{CryptoRng, RngCore};

/// The symmetric key protecting every escrow secret at rest.
///
/// Master key material is held outside the database (a file or an HSM),
/// loaded once at process start, and never transmitted. It is read-only for
/// the lifetime of the service.
#[derive(Clone)]
pub struct MasterKey(SealingKey);

impl MasterKey {
    /// Use the given bytes as the master key.
    pub fn from_bytes(key_material: [u8; 32]) -> Self {
        Self(SealingKey::from_bytes(key_material))
    }

    /// Wrap a freshly generated escrow secret for one (subject, controller)
    /// pair. The associated data binds the ciphertext to the pair so a
    /// wrapped secret cannot be replayed for different entities.
    pub fn wrap_secret(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        secret: EscrowSecret,
        subject: &SubjectId,
        controller: &ControllerId,
    ) -> Result<Encrypted<EscrowSecret>, CryptoError> {
        let binding = Self::binding(subject, controller);
        Encrypted::encrypt(rng, &self.0, secret, &binding)
    }

    /// Unwrap the escrow secret for one (subject, controller) pair.
    ///
    /// Fails with [`CryptoError::DecryptionFailed`] if the ciphertext was
    /// wrapped for different entities or has been tampered with.
    pub fn unwrap_secret(
        &self,
        wrapped: Encrypted<EscrowSecret>,
        subject: &SubjectId,
        controller: &ControllerId,
    ) -> Result<EscrowSecret, CryptoError> {
        let binding = Self::binding(subject, controller);
        if wrapped.associated_data() != &binding {
            return Err(CryptoError::DecryptionFailed);
        }
        wrapped.decrypt(&self.0)
    }

    fn binding(subject: &SubjectId, controller: &ControllerId) -> AssociatedData {
        AssociatedData::new()
            .with_str("escrow secret for ")
            .with_str(subject.as_str())
            .with_str("/")
            .with_str(controller.as_str())
    }
}

impl TryFrom<&[u8]> for MasterKey {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let key_material: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength)?;
        Ok(Self::from_bytes(key_material))
    }
}

impl Debug for MasterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(REDACTED)")
    }
}

/// A symmetric key derived for one (subject, controller, data type) triple.
///
/// Derivation hashes the hex form of the escrow secret together with the
/// data type's wire name, so every data type yields a distinct key even
/// though only one secret is stored per pair. The full 256-bit digest is the
/// key material.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct DerivedKey(Box<[u8; 32]>);

impl DerivedKey {
    /// Derive the key used to encrypt or decrypt data of `data_type`.
    pub fn derive(secret: &EscrowSecret, data_type: crate::types::taxonomy::DataType) -> Self {
        let digest = Sha256::new()
            .chain_update(secret.to_hex().as_bytes())
            .chain_update(b"&")
            .chain_update(data_type.to_string().as_bytes())
            .finalize();
        Self(Box::new(digest.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.0
    }

    /// Wire representation of the key.
    pub fn to_hex(&self) -> String {
        hex::encode(*self.0)
    }
}

impl Debug for DerivedKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(REDACTED)")
    }
}
