use thiserror::Error;

use crate::crypto::CryptoError;

/// The specific check a signed request failed. Each reason is surfaced to
/// the caller verbatim so a misbehaving client can tell what to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("unknown client")]
    UnknownClient,
    #[error("unknown or invalid request token")]
    InvalidToken,
    #[error("replayed nonce")]
    ReplayedNonce,
    #[error("stale or future timestamp")]
    StaleTimestamp,
    #[error("bad signature")]
    BadSignature,
}

/// Protocol-level failures of the escrow agent.
///
/// The first four variants are expected outcomes a caller can recover from
/// and are reported with an explanatory message. [`CryptoError`]s indicate
/// misconfiguration rather than a transient fault and are never retried.
#[derive(Debug, Error)]
pub enum DataEscrowError {
    #[error("request could not be verified: {0}")]
    UnverifiedRequest(#[from] VerificationFailure),

    #[error("access denied: the data subject has not opened this data")]
    AccessDenied,

    #[error("encryption key cannot be retrieved: {0}")]
    UnretrievableKey(String),

    #[error("client registration failed: {0}")]
    RegistrationFailed(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failures_surface_their_reason() {
        let error = DataEscrowError::from(VerificationFailure::ReplayedNonce);
        assert_eq!(
            error.to_string(),
            "request could not be verified: replayed nonce"
        );
    }

    #[test]
    fn crypto_failures_are_opaque_to_the_caller() {
        let error = DataEscrowError::from(CryptoError::DecryptionFailed);
        assert!(!error.to_string().contains("key material"));
    }
}
