//! Canonical request signing for the three-legged protocol.
//!
//! Every signed call commits to the HTTP method, the normalized endpoint
//! URL, and the full set of request parameters (everything except the
//! signature itself) through a single base string, which is then
//! authenticated with an HMAC whose hash is fixed when the signer is built.
//! Signatures travel as lowercase hex.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;
use std::collections::BTreeMap;
use zeroize::Zeroizing;

use super::CryptoError;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Percent-encode `input`, keeping only RFC 3986 unreserved characters
/// verbatim. Space encodes as `%20`, never `+`.
pub fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push('%');
                encoded.push_str(&format!("{byte:02X}"));
            }
        }
    }
    encoded
}

/// Lowercase a service URL, strip its query string, and strip the port when
/// it is the scheme's default (80 for http, 443 for https).
fn normalize_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    let lowered = without_query.to_ascii_lowercase();

    let (scheme, rest, default_port) = if let Some(rest) = lowered.strip_prefix("https://") {
        ("https://", rest, ":443")
    } else if let Some(rest) = lowered.strip_prefix("http://") {
        ("http://", rest, ":80")
    } else {
        return lowered;
    };

    let (authority, path) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };
    let authority = authority.strip_suffix(default_port).unwrap_or(authority);
    format!("{scheme}{authority}{path}")
}

/// The canonical string a request signature commits to:
/// `METHOD & percent-encode(normalized URL) & percent-encode(sorted query)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBase {
    encoded_url: String,
    encoded_parameters: String,
    base_string: String,
}

impl SignatureBase {
    /// Build the base string over every request parameter except the
    /// signature. Parameters are sorted by name before encoding, so the
    /// caller's insertion order never changes the result.
    pub fn new(parameters: &BTreeMap<String, String>, url: &str, method: &str) -> Self {
        let encoded_url = percent_encode(&normalize_url(url));
        let query = parameters
            .iter()
            .map(|(name, value)| format!("{}={}", percent_encode(name), percent_encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let encoded_parameters = percent_encode(&query);
        let base_string = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encoded_url,
            encoded_parameters
        );
        Self {
            encoded_url,
            encoded_parameters,
            base_string,
        }
    }

    pub fn base_string(&self) -> &str {
        &self.base_string
    }

    pub fn encoded_url(&self) -> &str {
        &self.encoded_url
    }

    pub fn encoded_parameters(&self) -> &str {
        &self.encoded_parameters
    }
}

/// Symmetric key for a signed call.
///
/// Client-only calls sign with `hex(client secret) + "&"`; once a request
/// token is in play its secret is appended, so every call referencing a
/// token proves possession of both secrets.
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    pub fn client_only(client_secret: &[u8]) -> Self {
        Self(Zeroizing::new(
            format!("{}&", hex::encode(client_secret)).into_bytes(),
        ))
    }

    pub fn token_scoped(client_secret: &[u8], token_secret: &[u8]) -> Self {
        Self(Zeroizing::new(
            format!(
                "{}&{}",
                hex::encode(client_secret),
                hex::encode(token_secret)
            )
            .into_bytes(),
        ))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(REDACTED)")
    }
}

/// Hash backing the HMAC. Fixed when the signer is constructed; the
/// 160-bit variant is the protocol reference method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureMethod {
    #[default]
    HmacSha1,
    HmacSha256,
}

/// Signs and verifies base strings with the method fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct RequestSigner {
    method: SignatureMethod,
}

impl RequestSigner {
    pub fn new(method: SignatureMethod) -> Self {
        Self { method }
    }

    /// Sign the base string; the result is the lowercase hex digest.
    pub fn sign(&self, key: &SigningKey, base: &SignatureBase) -> Result<String, CryptoError> {
        let digest = match self.method {
            SignatureMethod::HmacSha1 => {
                let mut mac = HmacSha1::new_from_slice(key.as_bytes())
                    .map_err(|_| CryptoError::InvalidKeyLength)?;
                mac.update(base.base_string().as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
            SignatureMethod::HmacSha256 => {
                let mut mac = HmacSha256::new_from_slice(key.as_bytes())
                    .map_err(|_| CryptoError::InvalidKeyLength)?;
                mac.update(base.base_string().as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(hex::encode(digest))
    }

    /// Recompute the signature and compare in constant time.
    pub fn verify(
        &self,
        key: &SigningKey,
        base: &SignatureBase,
        provided: &str,
    ) -> Result<(), CryptoError> {
        let provided = hex::decode(provided).map_err(|_| CryptoError::MalformedSignature)?;
        match self.method {
            SignatureMethod::HmacSha1 => {
                let mut mac = HmacSha1::new_from_slice(key.as_bytes())
                    .map_err(|_| CryptoError::InvalidKeyLength)?;
                mac.update(base.base_string().as_bytes());
                mac.verify_slice(&provided)
                    .map_err(|_| CryptoError::VerificationFailed)
            }
            SignatureMethod::HmacSha256 => {
                let mut mac = HmacSha256::new_from_slice(key.as_bytes())
                    .map_err(|_| CryptoError::InvalidKeyLength)?;
                mac.update(base.base_string().as_bytes());
                mac.verify_slice(&provided)
                    .map_err(|_| CryptoError::VerificationFailed)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_parameters() -> BTreeMap<String, String> {
        let mut parameters = BTreeMap::new();
        let _ = parameters.insert("client_id".to_string(), "abc-123".to_string());
        let _ = parameters.insert("nonce".to_string(), "n-1".to_string());
        let _ = parameters.insert("timestamp".to_string(), "1700000000000".to_string());
        parameters
    }

    fn sample_key() -> SigningKey {
        SigningKey::client_only(&[0xab; 20])
    }

    #[test]
    fn percent_encoding_follows_rfc_3986() {
        assert_eq!("abcXYZ012-._~", percent_encode("abcXYZ012-._~"));
        assert_eq!("a%20b", percent_encode("a b"));
        assert_eq!("a%26b%3Dc", percent_encode("a&b=c"));
        assert_eq!("%2B", percent_encode("+"));
        assert_eq!("%C3%A9", percent_encode("é"));
    }

    #[test]
    fn url_normalization_strips_default_ports_and_queries() {
        assert_eq!(
            "https://agent.example.org/escrow/request_token",
            normalize_url("https://agent.example.org:443/escrow/request_token?x=1")
        );
        assert_eq!(
            "http://agent.example.org/escrow",
            normalize_url("HTTP://Agent.Example.org:80/escrow")
        );
        // Non-default ports survive.
        assert_eq!(
            "https://agent.example.org:9443/escrow",
            normalize_url("https://agent.example.org:9443/escrow")
        );
    }

    #[test]
    fn base_string_concatenates_method_url_and_parameters() {
        let base = SignatureBase::new(
            &sample_parameters(),
            "https://agent.example.org/escrow/request_token",
            "post",
        );
        assert!(base.base_string().starts_with("POST&https%3A%2F%2F"));
        assert_eq!(
            format!(
                "POST&{}&{}",
                base.encoded_url(),
                base.encoded_parameters()
            ),
            base.base_string()
        );
    }

    #[test]
    fn signing_is_deterministic() -> Result<(), CryptoError> {
        let signer = RequestSigner::new(SignatureMethod::HmacSha1);
        let base = SignatureBase::new(&sample_parameters(), "https://a.example/x", "POST");

        let first = signer.sign(&sample_key(), &base)?;
        let second = signer.sign(&sample_key(), &base)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn parameter_insertion_order_does_not_change_the_signature() -> Result<(), CryptoError> {
        let mut forward = BTreeMap::new();
        let _ = forward.insert("a".to_string(), "1".to_string());
        let _ = forward.insert("b".to_string(), "2".to_string());
        let _ = forward.insert("c".to_string(), "3".to_string());

        let mut backward = BTreeMap::new();
        let _ = backward.insert("c".to_string(), "3".to_string());
        let _ = backward.insert("b".to_string(), "2".to_string());
        let _ = backward.insert("a".to_string(), "1".to_string());

        let signer = RequestSigner::new(SignatureMethod::HmacSha1);
        let key = sample_key();
        assert_eq!(
            signer.sign(&key, &SignatureBase::new(&forward, "https://a.example/x", "POST"))?,
            signer.sign(&key, &SignatureBase::new(&backward, "https://a.example/x", "POST"))?,
        );
        Ok(())
    }

    #[test]
    fn verification_round_trips() -> Result<(), CryptoError> {
        let signer = RequestSigner::new(SignatureMethod::HmacSha1);
        let base = SignatureBase::new(&sample_parameters(), "https://a.example/x", "POST");
        let key = sample_key();

        let signature = signer.sign(&key, &base)?;
        signer.verify(&key, &base, &signature)
    }

    #[test]
    fn verification_rejects_a_tampered_signature() {
        let signer = RequestSigner::new(SignatureMethod::HmacSha1);
        let base = SignatureBase::new(&sample_parameters(), "https://a.example/x", "POST");
        let key = sample_key();

        let mut signature = signer.sign(&key, &base).unwrap();
        signature.replace_range(0..1, if &signature[0..1] == "0" { "1" } else { "0" });

        assert_eq!(
            Err(CryptoError::VerificationFailed),
            signer.verify(&key, &base, &signature)
        );
    }

    #[test]
    fn verification_rejects_the_wrong_key() {
        let signer = RequestSigner::new(SignatureMethod::HmacSha1);
        let base = SignatureBase::new(&sample_parameters(), "https://a.example/x", "POST");

        let signature = signer.sign(&sample_key(), &base).unwrap();
        let wrong_key = SigningKey::token_scoped(&[0xab; 20], &[0xcd; 20]);

        assert_eq!(
            Err(CryptoError::VerificationFailed),
            signer.verify(&wrong_key, &base, &signature)
        );
    }

    #[test]
    fn verification_rejects_malformed_hex() {
        let signer = RequestSigner::new(SignatureMethod::HmacSha1);
        let base = SignatureBase::new(&sample_parameters(), "https://a.example/x", "POST");

        assert_eq!(
            Err(CryptoError::MalformedSignature),
            signer.verify(&sample_key(), &base, "not hex at all")
        );
    }

    #[test]
    fn methods_produce_distinct_signatures() -> Result<(), CryptoError> {
        let base = SignatureBase::new(&sample_parameters(), "https://a.example/x", "POST");
        let key = sample_key();

        let sha1 = RequestSigner::new(SignatureMethod::HmacSha1).sign(&key, &base)?;
        let sha256 = RequestSigner::new(SignatureMethod::HmacSha256).sign(&key, &base)?;

        assert_ne!(sha1, sha256);
        assert_eq!(40, sha1.len());
        assert_eq!(64, sha256.len());
        Ok(())
    }
}
