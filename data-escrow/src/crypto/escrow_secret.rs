//! The per-(subject, controller) secret protected by the master key.

use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::iter;
use zeroize::ZeroizeOnDrop;

use super::CryptoError;

/// Length of escrow secret material in bytes.
pub const ESCROW_SECRET_LENGTH: usize = 32;

/// Secret key material generated once per (data subject, data controller)
/// pair.
///
/// An escrow secret is only ever persisted wrapped under the master key and
/// is never returned to a caller; callers receive per-data-type derivatives
/// instead.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct EscrowSecret {
    material: Vec<u8>,
}

impl EscrowSecret {
    /// Generate fresh secret material.
    pub fn generate(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        Self {
            material: iter::repeat_with(|| rng.gen())
                .take(ESCROW_SECRET_LENGTH)
                .collect(),
        }
    }

    /// Hex form of the material; input to key derivation only.
    pub(crate) fn to_hex(&self) -> String {
        hex::encode(&self.material)
    }
}

impl std::fmt::Debug for EscrowSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EscrowSecret(REDACTED)")
    }
}

impl From<EscrowSecret> for Vec<u8> {
    fn from(secret: EscrowSecret) -> Self {
        secret.material.clone()
    }
}

impl TryFrom<Vec<u8>> for EscrowSecret {
    type Error = CryptoError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() != ESCROW_SECRET_LENGTH {
            return Err(CryptoError::ConversionError);
        }
        Ok(Self { material: bytes })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generation_produces_unique_secrets() {
        let mut rng = rand::thread_rng();
        let mut uniq = HashSet::new();

        assert!((0..1000)
            .map(|_| EscrowSecret::generate(&mut rng).material.clone())
            .all(|material| uniq.insert(material)));
    }

    #[test]
    fn byte_conversion_round_trips() -> Result<(), CryptoError> {
        let mut rng = rand::thread_rng();
        let secret = EscrowSecret::generate(&mut rng);

        let bytes: Vec<u8> = secret.clone().into();
        let restored = EscrowSecret::try_from(bytes)?;

        assert_eq!(secret, restored);
        Ok(())
    }

    #[test]
    fn conversion_rejects_wrong_lengths() {
        assert!(EscrowSecret::try_from(Vec::new()).is_err());
        assert!(EscrowSecret::try_from(vec![1; 16]).is_err());
        assert!(EscrowSecret::try_from(vec![1; 33]).is_err());
    }

    #[test]
    fn debug_output_redacts_material() {
        let mut rng = rand::thread_rng();
        let secret = EscrowSecret::generate(&mut rng);
        assert_eq!("EscrowSecret(REDACTED)", format!("{secret:?}"));
    }
}
