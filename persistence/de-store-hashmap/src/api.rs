use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

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
use data_escrow_agent::database::{DataStore, DatabaseError};

/// Hashmap-backed store.
///
/// Every table sits behind a single lock, so the protocol's two
/// compare-and-swap points (nonce insert-if-absent and token state
/// transitions) are genuinely atomic: racing calls serialize on the write
/// lock and exactly one observes the expected state.
pub struct HashmapStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    subjects: HashMap<SubjectId, DataSubject>,
    controllers: HashMap<ControllerId, DataController>,
    applications: HashMap<AppId, AuthorizedApplication>,
    clients: HashMap<ClientId, Client>,
    nonces: HashMap<(ClientId, String), Nonce>,
    tokens: HashMap<TokenId, RequestToken>,
    rules: HashMap<(SubjectId, ControllerId, DataType), AuthorizationRule>,
    keys: HashMap<(SubjectId, ControllerId), StoredKey>,
    audit_log: Vec<AuditEntry>,
}

impl HashmapStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    // Registry seeding; in a real deployment these records come from the
    // agent operator's enrollment flow, not the protocol.

    pub async fn add_data_subject(&self, subject: DataSubject) {
        let _ = self
            .inner
            .write()
            .await
            .subjects
            .insert(subject.id.clone(), subject);
    }

    pub async fn add_data_controller(&self, controller: DataController) {
        let _ = self
            .inner
            .write()
            .await
            .controllers
            .insert(controller.id.clone(), controller);
    }

    pub async fn add_authorized_application(&self, application: AuthorizedApplication) {
        let _ = self
            .inner
            .write()
            .await
            .applications
            .insert(application.id.clone(), application);
    }
}

impl Default for HashmapStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataStore for HashmapStore {
    async fn find_data_subject(
        &self,
        id: &SubjectId,
    ) -> Result<Option<DataSubject>, DatabaseError> {
        Ok(self.inner.read().await.subjects.get(id).cloned())
    }

    async fn find_data_controller(
        &self,
        id: &ControllerId,
    ) -> Result<Option<DataController>, DatabaseError> {
        Ok(self.inner.read().await.controllers.get(id).cloned())
    }

    async fn find_authorized_application(
        &self,
        id: &AppId,
        controller: &ControllerId,
    ) -> Result<Option<AuthorizedApplication>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .applications
            .get(id)
            .filter(|application| &application.data_controller_id == controller)
            .cloned())
    }

    async fn find_client(&self, id: &ClientId) -> Result<Option<Client>, DatabaseError> {
        Ok(self.inner.read().await.clients.get(id).cloned())
    }

    async fn client_exists(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        app: &AppId,
    ) -> Result<bool, DatabaseError> {
        Ok(self.inner.read().await.clients.values().any(|client| {
            &client.data_subject_id == subject
                && &client.data_controller_id == controller
                && &client.auth_app_id == app
        }))
    }

    async fn add_client(&self, client: Client) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.clients.contains_key(&client.id) {
            return Err(DatabaseError::DuplicateEntry);
        }
        let _ = inner.clients.insert(client.id.clone(), client);
        Ok(())
    }

    async fn record_nonce(&self, nonce: Nonce) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        let key = (nonce.client_id.clone(), nonce.value.clone());
        if inner.nonces.contains_key(&key) {
            return Err(DatabaseError::DuplicateEntry);
        }
        let _ = inner.nonces.insert(key, nonce);
        Ok(())
    }

    async fn add_token(&self, token: RequestToken) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.tokens.contains_key(&token.id) {
            return Err(DatabaseError::DuplicateEntry);
        }
        let _ = inner.tokens.insert(token.id.clone(), token);
        Ok(())
    }

    async fn find_token(
        &self,
        id: &TokenId,
        client: &ClientId,
    ) -> Result<Option<RequestToken>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .tokens
            .get(id)
            .filter(|token| &token.client_id == client)
            .cloned())
    }

    async fn bind_authorization(
        &self,
        id: &TokenId,
        client: &ClientId,
        data_type: DataType,
    ) -> Result<RequestToken, DatabaseError> {
        let mut inner = self.inner.write().await;
        let token = inner
            .tokens
            .get_mut(id)
            .filter(|token| &token.client_id == client)
            .ok_or(DatabaseError::NoEntry)?;
        if token.authorized {
            return Err(DatabaseError::InvalidState);
        }
        token.authorized = true;
        token.data_type = Some(data_type);
        Ok(token.clone())
    }

    async fn take_authorized_token(
        &self,
        id: &TokenId,
        client: &ClientId,
    ) -> Result<RequestToken, DatabaseError> {
        let mut inner = self.inner.write().await;
        let authorized = match inner.tokens.get(id) {
            None => return Err(DatabaseError::NoEntry),
            Some(token) if &token.client_id != client => return Err(DatabaseError::NoEntry),
            Some(token) => token.authorized,
        };
        if !authorized {
            return Err(DatabaseError::InvalidState);
        }
        inner.tokens.remove(id).ok_or(DatabaseError::NoEntry)
    }

    async fn revoke_token(&self, id: &TokenId) -> Result<(), DatabaseError> {
        let removed = self.inner.write().await.tokens.remove(id);
        if removed.is_some() {
            info!(token_id = %id, "token revoked");
        }
        Ok(())
    }

    async fn find_rules(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
    ) -> Result<Vec<AuthorizationRule>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .rules
            .values()
            .filter(|rule| {
                &rule.data_subject_id == subject && &rule.data_controller_id == controller
            })
            .cloned()
            .collect())
    }

    async fn find_rule(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
    ) -> Result<Option<AuthorizationRule>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .rules
            .get(&(subject.clone(), controller.clone(), data_type))
            .cloned())
    }

    async fn add_rule(&self, rule: AuthorizationRule) -> Result<(), DatabaseError> {
        let key = (
            rule.data_subject_id.clone(),
            rule.data_controller_id.clone(),
            rule.data_type,
        );
        let _ = self.inner.write().await.rules.insert(key, rule);
        Ok(())
    }

    async fn find_key(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
    ) -> Result<Option<StoredKey>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .keys
            .get(&(subject.clone(), controller.clone()))
            .cloned())
    }

    async fn add_key(&self, key: StoredKey) -> Result<(), DatabaseError> {
        let map_key = (key.data_subject_id.clone(), key.data_controller_id.clone());
        let mut inner = self.inner.write().await;
        if inner.keys.contains_key(&map_key) {
            return Err(DatabaseError::DuplicateEntry);
        }
        let _ = inner.keys.insert(map_key, key);
        Ok(())
    }

    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<(), DatabaseError> {
        self.inner.write().await.audit_log.push(entry);
        Ok(())
    }

    async fn find_audit_entries(
        &self,
        subject: &SubjectId,
    ) -> Result<Vec<AuditEntry>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .audit_log
            .iter()
            .filter(|entry| &entry.data_subject_id == subject)
            .cloned()
            .collect())
    }
}
