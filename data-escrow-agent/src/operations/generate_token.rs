//! Minting of unauthorized request tokens.

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{info, instrument};

use data_escrow::constants::services;
use data_escrow::crypto::signature::SigningKey;
use data_escrow::types::database::token::{RequestToken, TokenId, TokenSecret};
use data_escrow::types::wire;

use crate::database::DataStore;
use crate::operations::Operation;
use crate::server::Context;
use crate::validation::{RequestValidator, SignedParams};
use crate::EscrowAgentError;

/// First leg of the protocol: a verified client receives a fresh token and
/// token secret, not yet authorized for anything.
#[derive(Debug)]
pub struct GenerateToken {
    params: SignedParams,
}

impl GenerateToken {
    pub fn new(params: SignedParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl<DB: DataStore> Operation<DB> for GenerateToken {
    #[instrument(skip_all, err(Debug))]
    async fn operation(self, context: &Context<DB>) -> Result<String, EscrowAgentError> {
        let db = context.db.as_ref();
        let validator = RequestValidator::new(self.params);
        let client = validator.validate_client(db).await?;

        let signing_key = SigningKey::client_only(client.secret.as_bytes());
        validator
            .validate_request(
                db,
                &context.service_url(services::REQUEST_TOKEN),
                context.config.signature_method,
                &signing_key,
                context.config.timestamp_window,
            )
            .await?;

        let secret = {
            let mut rng = context.rng.lock().await;
            TokenSecret::generate(&mut *rng)
        };
        let token = RequestToken::unauthorized(
            TokenId::generate(),
            secret,
            client.id,
            OffsetDateTime::now_utc(),
            time::Duration::milliseconds(context.config.token_validity.as_millis() as i64),
        );
        db.add_token(token.clone()).await?;

        info!(token_id = %token.id, "issued unauthorized request token");
        Ok(wire::token_response(&token))
    }
}
