//! The URL-encoded wire format.
//!
//! Requests arrive as already-parsed parameter maps; responses are
//! `key=value` form bodies (or JSON for the audit-trail export) plus a
//! status code. The transport layer owns headers and routing.

use std::collections::HashMap;

use crate::crypto::signature::percent_encode;
use crate::crypto::DerivedKey;
use crate::types::database::client::Client;
use crate::types::database::token::RequestToken;

/// Request parameters as delivered by the transport layer.
pub type ParamMap = HashMap<String, String>;

/// Status code and body handed back to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

impl ServiceResponse {
    /// Content type of every form-encoded response body.
    pub const CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded; charset=utf-8";

    pub fn new(status: u16, body: String) -> Self {
        Self { status, body }
    }

    pub fn ok(body: String) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Encode one `name=value` pair.
pub fn encode_parameter(name: &str, value: &str) -> String {
    format!("{}={}", percent_encode(name), percent_encode(value))
}

/// Encode `name=value` pairs as a form body.
pub fn form_encode<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> String {
    pairs
        .into_iter()
        .map(|(name, value)| encode_parameter(name, &value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a form body back into a parameter map. The inverse of
/// [`form_encode`] for well-formed input; malformed escapes decode to
/// nothing rather than failing.
pub fn form_decode(body: &str) -> ParamMap {
    let mut params = ParamMap::new();
    for pair in body.split('&') {
        let mut halves = pair.splitn(2, '=');
        let name = halves.next().unwrap_or_default();
        let value = halves.next().unwrap_or_default();
        let _ = params.insert(percent_decode(name), percent_decode(value));
    }
    params
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' && index + 2 < bytes.len() {
            let high = (bytes[index + 1] as char).to_digit(16);
            let low = (bytes[index + 2] as char).to_digit(16);
            if let (Some(high), Some(low)) = (high, low) {
                decoded.push((high * 16 + low) as u8);
                index += 3;
                continue;
            }
        }
        decoded.push(bytes[index]);
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Body of a successful token generation or authorization response.
pub fn token_response(token: &RequestToken) -> String {
    form_encode([
        ("request_token", token.id.to_string()),
        ("token_secret", token.secret.to_hex()),
        ("authorized", token.authorized.to_string()),
    ])
}

/// Body of a successful exchange response.
pub fn key_response(key: &DerivedKey) -> String {
    encode_parameter("encryption_key", &key.to_hex())
}

/// Body of a successful registration response.
pub fn credentials_response(client: &Client) -> String {
    form_encode([
        ("client_id", client.id.to_string()),
        ("client_secret", client.secret.to_hex()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::database::client::{AppId, ClientId, ClientSecret, ControllerId, SubjectId};
    use crate::types::database::token::{TokenId, TokenSecret};
    use crate::types::rules::ValidityWindow;
    use time::OffsetDateTime;

    #[test]
    fn form_encoding_escapes_reserved_characters() {
        let body = form_encode([("a", "1 2".to_string()), ("b", "x&y".to_string())]);
        assert_eq!("a=1%202&b=x%26y", body);
    }

    #[test]
    fn form_bodies_round_trip() {
        let body = form_encode([
            ("client_id", "abc 123".to_string()),
            ("note", "a&b=c".to_string()),
        ]);
        let decoded = form_decode(&body);

        assert_eq!(Some(&"abc 123".to_string()), decoded.get("client_id"));
        assert_eq!(Some(&"a&b=c".to_string()), decoded.get("note"));
    }

    #[test]
    fn token_responses_carry_the_hex_secret_and_state() {
        let mut rng = rand::thread_rng();
        let secret = TokenSecret::generate(&mut rng);
        let token = crate::types::database::token::RequestToken {
            id: TokenId::from("token-1"),
            secret: secret.clone(),
            client_id: ClientId::from("client-1"),
            authorized: true,
            data_type: None,
            window: ValidityWindow::open_ended(OffsetDateTime::UNIX_EPOCH),
        };

        let body = token_response(&token);
        let decoded = form_decode(&body);
        assert_eq!(Some(&"token-1".to_string()), decoded.get("request_token"));
        assert_eq!(Some(&secret.to_hex()), decoded.get("token_secret"));
        assert_eq!(Some(&"true".to_string()), decoded.get("authorized"));
    }

    #[test]
    fn credentials_responses_carry_the_issued_pair() {
        let mut rng = rand::thread_rng();
        let client = Client {
            id: ClientId::from("client-1"),
            secret: ClientSecret::generate(&mut rng),
            data_subject_id: SubjectId::from("subject"),
            data_controller_id: ControllerId::from("controller"),
            auth_app_id: AppId::from("app"),
        };

        let decoded = form_decode(&credentials_response(&client));
        assert_eq!(Some(&"client-1".to_string()), decoded.get("client_id"));
        assert_eq!(Some(&client.secret.to_hex()), decoded.get("client_secret"));
    }
}
