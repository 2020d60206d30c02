//! Storage interface for the escrow agent.
//!
//! The store holds every entity the protocol touches: registry entries,
//! issued clients, request tokens, wrapped escrow keys, authorization
//! rules, observed nonces, and the audit trail. Two operations carry the
//! protocol's atomicity requirements and must behave like a transactional
//! read-modify-write: [`DataStore::record_nonce`] and the token
//! state transitions ([`DataStore::bind_authorization`],
//! [`DataStore::take_authorized_token`]).

use async_trait::async_trait;
use thiserror::Error;

use data_escrow::types::database::{
    audit::AuditEntry,
    client::{AppId, AuthorizedApplication, Client, ClientId, ControllerId, DataController,
             DataSubject, SubjectId},
    key::StoredKey,
    nonce::Nonce,
    token::{RequestToken, TokenId},
};
use data_escrow::types::rules::AuthorizationRule;
use data_escrow::types::taxonomy::DataType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("no such entry in table")]
    NoEntry,
    #[error("an entry with this key already exists")]
    DuplicateEntry,
    #[error("entry was not in the expected state")]
    InvalidState,
    #[error("an error occurred within the store: {0}")]
    Internal(String),
}

/// Defines the expected interface between the escrow agent and its backing
/// store.
///
/// Every method must complete or fail within a bounded time; the agent does
/// not retry storage calls.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    // Registry
    /// Find a registered data subject.
    async fn find_data_subject(&self, id: &SubjectId)
        -> Result<Option<DataSubject>, DatabaseError>;

    /// Find a registered data controller.
    async fn find_data_controller(
        &self,
        id: &ControllerId,
    ) -> Result<Option<DataController>, DatabaseError>;

    /// Find one of `controller`'s registered applications.
    async fn find_authorized_application(
        &self,
        id: &AppId,
        controller: &ControllerId,
    ) -> Result<Option<AuthorizedApplication>, DatabaseError>;

    // Clients
    /// Resolve issued credentials by client id.
    async fn find_client(&self, id: &ClientId) -> Result<Option<Client>, DatabaseError>;

    /// Whether a client is already registered for the triple.
    async fn client_exists(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        app: &AppId,
    ) -> Result<bool, DatabaseError>;

    async fn add_client(&self, client: Client) -> Result<(), DatabaseError>;

    // Nonces
    /// Record a nonce atomically, insert-if-absent. Concurrent duplicate
    /// attempts must not both succeed; the loser gets
    /// [`DatabaseError::DuplicateEntry`].
    async fn record_nonce(&self, nonce: Nonce) -> Result<(), DatabaseError>;

    // Request tokens
    async fn add_token(&self, token: RequestToken) -> Result<(), DatabaseError>;

    /// Find a token by id, scoped to the client it was issued to.
    async fn find_token(
        &self,
        id: &TokenId,
        client: &ClientId,
    ) -> Result<Option<RequestToken>, DatabaseError>;

    /// Transition a token from unauthorized to authorized, binding
    /// `data_type`, and return the updated record. Compare-and-swap: fails
    /// with [`DatabaseError::InvalidState`] if the token is already
    /// authorized and [`DatabaseError::NoEntry`] if it is absent.
    async fn bind_authorization(
        &self,
        id: &TokenId,
        client: &ClientId,
        data_type: DataType,
    ) -> Result<RequestToken, DatabaseError>;

    /// Remove and return a token iff it is currently authorized.
    /// Compare-and-swap: of two racing exchanges, exactly one receives the
    /// record.
    async fn take_authorized_token(
        &self,
        id: &TokenId,
        client: &ClientId,
    ) -> Result<RequestToken, DatabaseError>;

    /// Delete a token outright. Deleting an absent token is not an error.
    async fn revoke_token(&self, id: &TokenId) -> Result<(), DatabaseError>;

    // Authorization rules
    /// Every rule the subject has defined against this controller.
    async fn find_rules(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
    ) -> Result<Vec<AuthorizationRule>, DatabaseError>;

    /// The rule for exactly this data type, if one exists.
    async fn find_rule(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
    ) -> Result<Option<AuthorizationRule>, DatabaseError>;

    async fn add_rule(&self, rule: AuthorizationRule) -> Result<(), DatabaseError>;

    // Escrow keys
    async fn find_key(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
    ) -> Result<Option<StoredKey>, DatabaseError>;

    async fn add_key(&self, key: StoredKey) -> Result<(), DatabaseError>;

    // Audit trail
    /// Append one entry. The trail is append-only; entries are never
    /// updated or deleted.
    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<(), DatabaseError>;

    /// A data subject's entries, oldest first.
    async fn find_audit_entries(
        &self,
        subject: &SubjectId,
    ) -> Result<Vec<AuditEntry>, DatabaseError>;
}
