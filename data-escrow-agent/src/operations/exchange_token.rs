//! Exchange of an authorized token for a derived encryption key.

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use data_escrow::constants::services;
use data_escrow::crypto::signature::SigningKey;
use data_escrow::error::VerificationFailure;
use data_escrow::types::wire;

use crate::database::{DataStore, DatabaseError};
use crate::key_hierarchy;
use crate::operations::Operation;
use crate::server::Context;
use crate::validation::{fetch_token, RequestValidator, SignedParams};
use crate::EscrowAgentError;

/// Third leg of the protocol: an authorized token is consumed, exactly
/// once, for the key derived from the data type bound at authorization
/// time. Caller input never picks the data type here.
#[derive(Debug)]
pub struct ExchangeToken {
    params: SignedParams,
}

impl ExchangeToken {
    pub fn new(params: SignedParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl<DB: DataStore> Operation<DB> for ExchangeToken {
    #[instrument(skip_all, err(Debug))]
    async fn operation(self, context: &Context<DB>) -> Result<String, EscrowAgentError> {
        let db = context.db.as_ref();
        let validator = RequestValidator::new(self.params);
        let client = validator.validate_client(db).await?;
        let now = OffsetDateTime::now_utc();

        let token = fetch_token(db, validator.params(), now).await?;
        if !token.authorized {
            // An exchange attempt against an unauthorized token burns it.
            warn!(token_id = %token.id, "exchange attempted on unauthorized token; revoking");
            db.revoke_token(&token.id).await?;
            return Err(VerificationFailure::InvalidToken.into());
        }

        let signing_key =
            SigningKey::token_scoped(client.secret.as_bytes(), token.secret.as_bytes());
        validator
            .validate_request(
                db,
                &context.service_url(services::KEY_EXCHANGE),
                context.config.signature_method,
                &signing_key,
                context.config.timestamp_window,
            )
            .await?;

        // Claim the token before touching key material; of two racing
        // exchanges only the claimant proceeds.
        let token = db
            .take_authorized_token(&token.id, &client.id)
            .await
            .map_err(|error| match error {
                DatabaseError::NoEntry | DatabaseError::InvalidState => {
                    EscrowAgentError::from(VerificationFailure::InvalidToken)
                }
                other => other.into(),
            })?;
        let data_type = token
            .data_type
            .ok_or(VerificationFailure::InvalidToken)?;

        let derived = key_hierarchy::release_key(
            db,
            &context.config.master_key,
            &client.data_subject_id,
            &client.data_controller_id,
            data_type,
            now,
        )
        .await?;

        info!(token_id = %token.id, %data_type, "request token exchanged");
        Ok(wire::key_response(&derived))
    }
}
