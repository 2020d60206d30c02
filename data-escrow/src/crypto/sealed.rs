//! AEAD building blocks for protecting escrow secrets at rest.

use chacha20poly1305::{
    aead::{Aead, Payload},
    AeadCore, ChaCha20Poly1305, KeyInit,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use thiserror::Error;

/// Errors that arise in the cryptography module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("signature did not verify")]
    VerificationFailed,
    #[error("malformed signature encoding")]
    MalformedSignature,
    #[error("key material has the wrong length")]
    InvalidKeyLength,
    #[error("conversion error")]
    ConversionError,
}

/// Associated data authenticated alongside a ciphertext.
///
/// Sealing binds a ciphertext to its associated data, so an escrow secret
/// wrapped for one (subject, controller) pair cannot be presented as the
/// secret of another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssociatedData(Vec<u8>);

impl Default for AssociatedData {
    fn default() -> Self {
        Self(b"data-escrow sealed v1.".to_vec())
    }
}

impl AssociatedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_str(self, context: &str) -> Self {
        let mut bytes = self.0;
        bytes.extend_from_slice(context.as_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A well-formed symmetric key for the AEAD scheme used at rest
/// (ChaCha20Poly1305 with a 96-bit nonce).
#[derive(Clone, PartialEq, Eq)]
pub struct SealingKey(chacha20poly1305::Key);

impl SealingKey {
    /// Generate a fresh random key.
    pub fn generate(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        Self(ChaCha20Poly1305::generate_key(rng))
    }

    /// Use the given bytes as a sealing key.
    pub fn from_bytes(key_material: [u8; 32]) -> Self {
        Self(key_material.into())
    }
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealingKey(REDACTED)")
    }
}

/// A ciphertext representing an object of type `T`, sealed with
/// authenticated associated data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Encrypted<T> {
    ciphertext: Vec<u8>,
    associated_data: AssociatedData,
    nonce: [u8; 12],
    original_type: PhantomData<T>,
}

impl<T> Encrypted<T>
where
    T: TryFrom<Vec<u8>, Error = CryptoError>,
    Vec<u8>: From<T>,
{
    /// Seal `object` under `key`, authenticating `associated_data` alongside
    /// the ciphertext.
    pub fn encrypt(
        rng: &mut (impl CryptoRng + RngCore),
        key: &SealingKey,
        object: T,
        associated_data: &AssociatedData,
    ) -> Result<Self, CryptoError> {
        let cipher = ChaCha20Poly1305::new(&key.0);
        let payload = Payload {
            msg: &Vec::from(object),
            aad: associated_data.as_bytes(),
        };

        let nonce = ChaCha20Poly1305::generate_nonce(rng);
        let ciphertext = cipher
            .encrypt(&nonce, payload)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Self {
            ciphertext,
            associated_data: associated_data.clone(),
            nonce: nonce.into(),
            original_type: PhantomData,
        })
    }

    /// Open the ciphertext back into a `T`.
    ///
    /// Fails with [`CryptoError::DecryptionFailed`] on a wrong key, a wrong
    /// nonce, tampered associated data, or a tweaked ciphertext.
    pub fn decrypt(self, key: &SealingKey) -> Result<T, CryptoError> {
        let cipher = ChaCha20Poly1305::new(&key.0);
        let payload = Payload {
            msg: self.ciphertext.as_ref(),
            aad: self.associated_data.as_bytes(),
        };

        cipher
            .decrypt(&self.nonce.into(), payload)
            .map_err(|_| CryptoError::DecryptionFailed)?
            .try_into()
    }

    /// The associated data this ciphertext was sealed with.
    pub fn associated_data(&self) -> &AssociatedData {
        &self.associated_data
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::EscrowSecret;
    use std::collections::HashSet;

    fn seal_secret(
        rng: &mut (impl CryptoRng + RngCore),
    ) -> (EscrowSecret, Encrypted<EscrowSecret>, SealingKey) {
        let secret = EscrowSecret::generate(rng);
        let key = SealingKey::generate(rng);
        let sealed =
            Encrypted::encrypt(rng, &key, secret.clone(), &AssociatedData::default()).unwrap();
        (secret, sealed, key)
    }

    #[test]
    fn encryption_decryption_works() -> Result<(), CryptoError> {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let (secret, sealed, key) = seal_secret(&mut rng);
            assert_eq!(secret, sealed.decrypt(&key)?);
        }
        Ok(())
    }

    #[test]
    fn encryption_produces_unique_nonces() {
        let mut rng = rand::thread_rng();
        let mut uniq = HashSet::new();

        assert!((0..1000)
            .map(|_| seal_secret(&mut rng).1.nonce)
            .all(|nonce| uniq.insert(nonce)));
    }

    #[test]
    fn decryption_fails_with_wrong_key() {
        let mut rng = rand::thread_rng();
        let (_, sealed, _) = seal_secret(&mut rng);
        let wrong_key = SealingKey::generate(&mut rng);

        assert!(sealed.decrypt(&wrong_key).is_err());
    }

    #[test]
    fn decryption_fails_with_wrong_nonce() {
        let mut rng = rand::thread_rng();
        let (_, mut sealed, key) = seal_secret(&mut rng);
        sealed.nonce = ChaCha20Poly1305::generate_nonce(&mut rng).into();

        assert!(sealed.decrypt(&key).is_err());
    }

    #[test]
    fn decryption_fails_with_wrong_associated_data() {
        let mut rng = rand::thread_rng();
        let (_, mut sealed, key) = seal_secret(&mut rng);
        sealed.associated_data = AssociatedData::new().with_str("some incorrect binding");

        assert!(sealed.decrypt(&key).is_err());
    }

    #[test]
    fn decryption_fails_with_tweaked_ciphertext() {
        let mut rng = rand::thread_rng();
        for position in [0, 15, 31] {
            let (_, mut sealed, key) = seal_secret(&mut rng);
            sealed.ciphertext[position] ^= 1;
            assert!(sealed.decrypt(&key).is_err());
        }
    }
}
