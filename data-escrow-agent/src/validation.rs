//! Authentication of signed protocol requests.
//!
//! Every signed call passes the same pipeline: resolve the client, record
//! the nonce, check the timestamp window, recompute the signature. Each
//! check fails with its own [`VerificationFailure`] so the caller can tell
//! what went wrong; all of them must pass before a request counts as
//! verified.

use std::collections::BTreeMap;
use std::time::Duration;
use time::OffsetDateTime;

use data_escrow::constants::params;
use data_escrow::crypto::signature::{RequestSigner, SignatureBase, SignatureMethod, SigningKey};
use data_escrow::error::VerificationFailure;
use data_escrow::types::database::{
    client::{Client, ClientId},
    nonce::Nonce,
    token::{RequestToken, TokenId},
};
use data_escrow::types::wire::ParamMap;

use crate::database::{DataStore, DatabaseError};
use crate::EscrowAgentError;

/// Unix epoch milliseconds, the protocol's timestamp representation.
pub fn unix_millis(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}

/// The standard parameters every signed call carries.
#[derive(Debug, Clone)]
pub struct SignedParams {
    pub client_id: ClientId,
    pub nonce: String,
    pub timestamp_ms: i64,
    pub signature: String,
    pub request_token: Option<TokenId>,
}

impl SignedParams {
    /// Pull the standard parameters out of a parsed request.
    pub fn from_params(params: &ParamMap, with_token: bool) -> Result<Self, EscrowAgentError> {
        let required = |name: &'static str| {
            params
                .get(name)
                .cloned()
                .ok_or(EscrowAgentError::MissingParameter(name))
        };

        let timestamp_ms = required(params::TIMESTAMP)?
            .parse()
            .map_err(|_| EscrowAgentError::MalformedParameter(params::TIMESTAMP))?;
        let request_token = if with_token {
            Some(TokenId::from(required(params::REQUEST_TOKEN)?))
        } else {
            None
        };

        Ok(Self {
            client_id: ClientId::from(required(params::CLIENT_ID)?),
            nonce: required(params::NONCE)?,
            timestamp_ms,
            signature: required(params::SIGNATURE)?,
            request_token,
        })
    }
}

/// Validates one signed request.
pub struct RequestValidator {
    params: SignedParams,
    /// The parameter set the signature commits to; everything except the
    /// signature itself.
    parameters: BTreeMap<String, String>,
}

impl RequestValidator {
    pub fn new(params: SignedParams) -> Self {
        let mut parameters = BTreeMap::new();
        let _ = parameters.insert(
            params::CLIENT_ID.to_string(),
            params.client_id.to_string(),
        );
        let _ = parameters.insert(params::NONCE.to_string(), params.nonce.clone());
        let _ = parameters.insert(
            params::TIMESTAMP.to_string(),
            params.timestamp_ms.to_string(),
        );
        if let Some(token) = &params.request_token {
            let _ = parameters.insert(params::REQUEST_TOKEN.to_string(), token.to_string());
        }
        Self { params, parameters }
    }

    pub fn params(&self) -> &SignedParams {
        &self.params
    }

    /// Add parameters beyond the standard set that the caller signed.
    pub fn add_signed_parameters(
        &mut self,
        extra: impl IntoIterator<Item = (&'static str, String)>,
    ) {
        for (name, value) in extra {
            let _ = self.parameters.insert(name.to_string(), value);
        }
    }

    /// Resolve the client named in the request.
    pub async fn validate_client<DB: DataStore>(
        &self,
        db: &DB,
    ) -> Result<Client, EscrowAgentError> {
        db.find_client(&self.params.client_id)
            .await?
            .ok_or_else(|| VerificationFailure::UnknownClient.into())
    }

    /// Record the nonce; a value already seen for this client rejects the
    /// request.
    async fn validate_nonce<DB: DataStore>(&self, db: &DB) -> Result<(), EscrowAgentError> {
        let nonce = Nonce {
            value: self.params.nonce.clone(),
            client_id: self.params.client_id.clone(),
            timestamp_ms: self.params.timestamp_ms,
        };
        match db.record_nonce(nonce).await {
            Ok(()) => Ok(()),
            Err(DatabaseError::DuplicateEntry) => Err(VerificationFailure::ReplayedNonce.into()),
            Err(other) => Err(other.into()),
        }
    }

    /// The request timestamp must lie in `[now - window, now]`, inclusive at
    /// both edges.
    fn validate_timestamp(
        &self,
        window: Duration,
        now: OffsetDateTime,
    ) -> Result<(), EscrowAgentError> {
        let now_ms = unix_millis(now);
        let min_ms = now_ms - window.as_millis() as i64;
        if self.params.timestamp_ms < min_ms || self.params.timestamp_ms > now_ms {
            return Err(VerificationFailure::StaleTimestamp.into());
        }
        Ok(())
    }

    /// Recompute the signature over the signed parameter set and the service
    /// endpoint, and compare against the supplied value.
    fn validate_signature(
        &self,
        uri: &str,
        method: SignatureMethod,
        signing_key: &SigningKey,
    ) -> Result<(), EscrowAgentError> {
        let base = SignatureBase::new(&self.parameters, uri, "POST");
        RequestSigner::new(method)
            .verify(signing_key, &base, &self.params.signature)
            .map_err(|_| VerificationFailure::BadSignature.into())
    }

    /// Run the nonce, timestamp, and signature checks, in that order.
    pub async fn validate_request<DB: DataStore>(
        &self,
        db: &DB,
        uri: &str,
        method: SignatureMethod,
        signing_key: &SigningKey,
        window: Duration,
    ) -> Result<(), EscrowAgentError> {
        self.validate_nonce(db).await?;
        self.validate_timestamp(window, OffsetDateTime::now_utc())?;
        self.validate_signature(uri, method, signing_key)
    }
}

/// Resolve the request token named in `params` for this client. Absent and
/// expired tokens are indistinguishable to the caller.
pub async fn fetch_token<DB: DataStore>(
    db: &DB,
    params: &SignedParams,
    now: OffsetDateTime,
) -> Result<RequestToken, EscrowAgentError> {
    let id = params
        .request_token
        .as_ref()
        .ok_or(EscrowAgentError::MissingParameter(params::REQUEST_TOKEN))?;
    let token = db
        .find_token(id, &params.client_id)
        .await?
        .ok_or(VerificationFailure::InvalidToken)?;
    if !token.is_current(now) {
        return Err(VerificationFailure::InvalidToken.into());
    }
    Ok(token)
}
