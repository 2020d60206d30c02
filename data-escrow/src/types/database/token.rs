//! Request tokens and their lifecycle state.

use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::iter;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;
use zeroize::ZeroizeOnDrop;

use super::client::ClientId;
use crate::types::rules::ValidityWindow;
use crate::types::taxonomy::DataType;

/// Identifies one request token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Mint a fresh unique identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TokenId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Length of a token secret in bytes, sized for the reference HMAC method.
pub const TOKEN_SECRET_LENGTH: usize = 20;

/// Per-token secret; appended to the signing key of every call that
/// references the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct TokenSecret(Vec<u8>);

impl TokenSecret {
    pub fn generate(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        Self(
            iter::repeat_with(|| rng.gen())
                .take(TOKEN_SECRET_LENGTH)
                .collect(),
        )
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Wire representation, as echoed to the client.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl Debug for TokenSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenSecret(REDACTED)")
    }
}

/// One request token, minted for a single protocol run.
///
/// A token is created unauthorized, flips to authorized exactly once, and is
/// deleted when exchanged. It is never reusable after exchange or expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestToken {
    pub id: TokenId,
    pub secret: TokenSecret,
    pub client_id: ClientId,
    pub authorized: bool,
    /// Fixed when the token is authorized. Exchange derives the key from
    /// this value, never from caller input.
    pub data_type: Option<DataType>,
    pub window: ValidityWindow,
}

impl RequestToken {
    /// A freshly minted, not-yet-authorized token.
    pub fn unauthorized(
        id: TokenId,
        secret: TokenSecret,
        client_id: ClientId,
        issued_at: OffsetDateTime,
        validity: Duration,
    ) -> Self {
        Self {
            id,
            secret,
            client_id,
            authorized: false,
            data_type: None,
            window: ValidityWindow::starting(issued_at, validity),
        }
    }

    /// Whether the token is inside its validity window.
    pub fn is_current(&self, now: OffsetDateTime) -> bool {
        self.window.covers(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn fresh_token() -> RequestToken {
        let mut rng = rand::thread_rng();
        RequestToken::unauthorized(
            TokenId::generate(),
            TokenSecret::generate(&mut rng),
            ClientId::generate(),
            now(),
            Duration::days(1),
        )
    }

    #[test]
    fn new_tokens_start_unauthorized_and_unbound() {
        let token = fresh_token();
        assert!(!token.authorized);
        assert!(token.data_type.is_none());
    }

    #[test]
    fn tokens_expire_at_the_end_of_their_window() {
        let token = fresh_token();
        assert!(token.is_current(now()));
        assert!(token.is_current(now() + Duration::days(1)));
        assert!(!token.is_current(now() + Duration::days(1) + Duration::seconds(1)));
    }

    #[test]
    fn token_secrets_are_redacted_in_debug_output() {
        let token = fresh_token();
        let rendered = format!("{token:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains(&token.secret.to_hex()));
    }
}
