//! Authorization of a pending request token.

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{info, instrument};

use data_escrow::constants::services;
use data_escrow::crypto::signature::SigningKey;
use data_escrow::error::VerificationFailure;
use data_escrow::types::bundles::AuthorizationBundle;
use data_escrow::types::database::audit::{AuthorizationProcess, AuthorizationResult};
use data_escrow::types::wire;
use data_escrow::DataEscrowError;

use crate::authorization::AuthorizationEngine;
use crate::database::{DataStore, DatabaseError};
use crate::operations::Operation;
use crate::server::Context;
use crate::validation::{fetch_token, RequestValidator, SignedParams};
use crate::EscrowAgentError;

/// Second leg of the protocol: the resource owner's decision is rendered
/// against the supplied bundle, and on ALLOWED the token transitions to
/// authorized with the data type bound to it.
#[derive(Debug)]
pub struct AuthorizeToken {
    params: SignedParams,
    bundle: AuthorizationBundle,
    process: AuthorizationProcess,
}

impl AuthorizeToken {
    pub fn new(
        params: SignedParams,
        bundle: AuthorizationBundle,
        process: AuthorizationProcess,
    ) -> Self {
        Self {
            params,
            bundle,
            process,
        }
    }
}

#[async_trait]
impl<DB: DataStore> Operation<DB> for AuthorizeToken {
    #[instrument(skip_all, err(Debug))]
    async fn operation(self, context: &Context<DB>) -> Result<String, EscrowAgentError> {
        let db = context.db.as_ref();
        let mut validator = RequestValidator::new(self.params);
        validator.add_signed_parameters(self.bundle.signature_parameters());

        let client = validator.validate_client(db).await?;
        let now = OffsetDateTime::now_utc();
        let token = fetch_token(db, validator.params(), now).await?;
        // Authorize is a one-way transition; an already-authorized token
        // cannot be authorized again.
        if token.authorized {
            return Err(VerificationFailure::InvalidToken.into());
        }

        let signing_key =
            SigningKey::token_scoped(client.secret.as_bytes(), token.secret.as_bytes());
        validator
            .validate_request(
                db,
                &context.service_url(services::AUTHORIZATION),
                context.config.signature_method,
                &signing_key,
                context.config.timestamp_window,
            )
            .await?;

        let result = AuthorizationEngine::new(db)
            .authorize(&client, &self.bundle, self.process, now)
            .await?;
        if result != AuthorizationResult::Allowed {
            // The token stays unauthorized; the client may retry with a
            // fresh decision or abandon the run.
            return Err(DataEscrowError::AccessDenied.into());
        }

        let authorized = db
            .bind_authorization(&token.id, &client.id, self.bundle.data_type())
            .await
            .map_err(|error| match error {
                DatabaseError::NoEntry | DatabaseError::InvalidState => {
                    EscrowAgentError::from(VerificationFailure::InvalidToken)
                }
                other => other.into(),
            })?;

        info!(token_id = %authorized.id, data_type = %self.bundle.data_type(), "request token authorized");
        Ok(wire::token_response(&authorized))
    }
}
