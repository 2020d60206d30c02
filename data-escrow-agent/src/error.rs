use thiserror::Error;

use data_escrow::crypto::CryptoError;
use data_escrow::error::VerificationFailure;
use data_escrow::types::wire::{encode_parameter, ServiceResponse};
use data_escrow::DataEscrowError;

use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum EscrowAgentError {
    #[error("master key was not provided")]
    MasterKeyMissing,
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("malformed parameter: {0}")]
    MalformedParameter(&'static str),

    // Protocol errors
    #[error(transparent)]
    Escrow(#[from] DataEscrowError),

    // Wrapped errors
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl From<VerificationFailure> for EscrowAgentError {
    fn from(failure: VerificationFailure) -> Self {
        Self::Escrow(failure.into())
    }
}

impl From<CryptoError> for EscrowAgentError {
    fn from(error: CryptoError) -> Self {
        Self::Escrow(error.into())
    }
}

/// Maps the error taxonomy onto wire responses.
///
/// Expected protocol outcomes are surfaced verbatim with their dedicated
/// error parameter; crypto and storage failures are opaque to the caller.
impl From<EscrowAgentError> for ServiceResponse {
    fn from(error: EscrowAgentError) -> Self {
        match error {
            EscrowAgentError::Escrow(DataEscrowError::UnverifiedRequest(reason)) => {
                ServiceResponse::new(
                    401,
                    encode_parameter("authentication_error", &reason.to_string()),
                )
            }
            EscrowAgentError::Escrow(DataEscrowError::AccessDenied) => ServiceResponse::new(
                401,
                encode_parameter(
                    "authorization_error",
                    &DataEscrowError::AccessDenied.to_string(),
                ),
            ),
            EscrowAgentError::Escrow(DataEscrowError::UnretrievableKey(message)) => {
                ServiceResponse::new(401, encode_parameter("key_error", &message))
            }
            EscrowAgentError::Escrow(DataEscrowError::RegistrationFailed(message)) => {
                ServiceResponse::new(400, encode_parameter("registration_error", &message))
            }
            EscrowAgentError::MissingParameter(name) => ServiceResponse::new(
                400,
                encode_parameter("error", &format!("missing parameter: {name}")),
            ),
            EscrowAgentError::MalformedParameter(name) => ServiceResponse::new(
                400,
                encode_parameter("error", &format!("malformed parameter: {name}")),
            ),

            // Failures the caller gets no detail about.
            EscrowAgentError::Escrow(DataEscrowError::Crypto(_))
            | EscrowAgentError::MasterKeyMissing
            | EscrowAgentError::Database(_)
            | EscrowAgentError::Io(_)
            | EscrowAgentError::SerdeJson(_)
            | EscrowAgentError::Toml(_) => {
                ServiceResponse::new(500, encode_parameter("error", "internal error"))
            }
        }
    }
}
