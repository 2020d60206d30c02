//! Protocol operations, one per service call.

mod authorize_token;
mod exchange_token;
mod generate_token;
mod register;

pub use authorize_token::AuthorizeToken;
pub use exchange_token::ExchangeToken;
pub use generate_token::GenerateToken;
pub use register::{RegisterClient, RegistrationParams};

use async_trait::async_trait;
use tracing::warn;

use data_escrow::types::wire::ServiceResponse;

use crate::database::DataStore;
use crate::server::Context;
use crate::EscrowAgentError;

/// A type implementing [`Operation`] can process one protocol call:
/// validate the request, act on the store, and produce the response body.
/// `handle_request` funnels every error into its wire response so the
/// service layer stays uniform.
#[async_trait]
pub trait Operation<DB: DataStore>: Sized + Send + 'static {
    /// Core logic for a given operation. Returns the response body.
    async fn operation(self, context: &Context<DB>) -> Result<String, EscrowAgentError>;

    async fn handle_request(self, context: &Context<DB>) -> ServiceResponse {
        match self.operation(context).await {
            Ok(body) => ServiceResponse::ok(body),
            Err(error) => {
                warn!(%error, "operation rejected");
                error.into()
            }
        }
    }
}
