//! Registry entities and the clients that bind them together.

use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::iter;
use uuid::Uuid;
use zeroize::ZeroizeOnDrop;

/// Identifies a data subject in the agent's registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifies a data controller in the agent's registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerId(String);

impl ControllerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ControllerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ControllerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ControllerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifies one of a controller's authorized applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppId(String);

impl AppId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AppId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AppId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier issued to a client application at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Mint a fresh unique identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Length of a client secret in bytes, sized for the reference HMAC method.
pub const CLIENT_SECRET_LENGTH: usize = 20;

/// Secret issued alongside a [`ClientId`]; half of every signing key built
/// for this client's requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct ClientSecret(Vec<u8>);

impl ClientSecret {
    pub fn generate(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        Self(
            iter::repeat_with(|| rng.gen())
                .take(CLIENT_SECRET_LENGTH)
                .collect(),
        )
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Wire representation, as handed out at registration.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl Debug for ClientSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientSecret(REDACTED)")
    }
}

/// A registered data subject; the person the escrowed data is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSubject {
    pub id: SubjectId,
    pub name: String,
    pub email: String,
}

/// A registered data controller; the organization storing the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataController {
    pub id: ControllerId,
    pub name: String,
}

/// An application a controller has registered to act through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedApplication {
    pub id: AppId,
    pub data_controller_id: ControllerId,
    pub name: String,
}

/// Binds issued credentials to a (subject, controller, application) triple.
/// Credentials are immutable after issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub secret: ClientSecret,
    pub data_subject_id: SubjectId,
    pub data_controller_id: ControllerId,
    pub auth_app_id: AppId,
}
