//! Client registration and escrow-key provisioning.

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{info, instrument};

use data_escrow::constants::params;
use data_escrow::types::database::client::{
    AppId, Client, ClientId, ClientSecret, ControllerId, SubjectId,
};
use data_escrow::types::wire::{self, ParamMap};
use data_escrow::DataEscrowError;

use crate::database::DataStore;
use crate::key_hierarchy;
use crate::operations::Operation;
use crate::server::Context;
use crate::EscrowAgentError;

/// Parameters of a registration request. Registration is the one unsigned
/// call: there are no credentials to sign with yet.
#[derive(Debug, Clone)]
pub struct RegistrationParams {
    pub data_subject_id: SubjectId,
    pub data_controller_id: ControllerId,
    pub auth_app_id: AppId,
}

impl RegistrationParams {
    pub fn from_params(params: &ParamMap) -> Result<Self, EscrowAgentError> {
        let required = |name: &'static str| {
            params
                .get(name)
                .cloned()
                .ok_or(EscrowAgentError::MissingParameter(name))
        };
        Ok(Self {
            data_subject_id: SubjectId::from(required(params::DATA_SUBJECT_ID)?),
            data_controller_id: ControllerId::from(required(params::DATA_CONTROLLER_ID)?),
            auth_app_id: AppId::from(required(params::AUTH_APP_ID)?),
        })
    }
}

/// Issues credentials binding a (subject, controller, application) triple,
/// and provisions the pair's escrow key the first time the pair appears.
#[derive(Debug)]
pub struct RegisterClient {
    params: RegistrationParams,
}

impl RegisterClient {
    pub fn new(params: RegistrationParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl<DB: DataStore> Operation<DB> for RegisterClient {
    #[instrument(skip_all, err(Debug))]
    async fn operation(self, context: &Context<DB>) -> Result<String, EscrowAgentError> {
        let db = context.db.as_ref();
        let RegistrationParams {
            data_subject_id,
            data_controller_id,
            auth_app_id,
        } = self.params;

        let registration_failed =
            |message: &str| DataEscrowError::RegistrationFailed(message.to_string());
        let _ = db
            .find_data_subject(&data_subject_id)
            .await?
            .ok_or_else(|| registration_failed("unknown data subject"))?;
        let _ = db
            .find_data_controller(&data_controller_id)
            .await?
            .ok_or_else(|| registration_failed("unknown data controller"))?;
        let _ = db
            .find_authorized_application(&auth_app_id, &data_controller_id)
            .await?
            .ok_or_else(|| registration_failed("unknown authorized application"))?;
        if db
            .client_exists(&data_subject_id, &data_controller_id, &auth_app_id)
            .await?
        {
            return Err(registration_failed(
                "a client is already registered for this subject, controller, and application",
            )
            .into());
        }

        let now = OffsetDateTime::now_utc();
        let pair_has_key = db
            .find_key(&data_subject_id, &data_controller_id)
            .await?
            .is_some();

        let (secret, provisioned) = {
            let mut rng = context.rng.lock().await;
            let secret = ClientSecret::generate(&mut *rng);
            let provisioned = if pair_has_key {
                None
            } else {
                Some(key_hierarchy::provision_key(
                    &mut *rng,
                    &context.config.master_key,
                    &data_subject_id,
                    &data_controller_id,
                    now,
                    context.config.key_validity,
                )?)
            };
            (secret, provisioned)
        };

        if let Some(key) = provisioned {
            db.add_key(key).await?;
            info!(subject = %data_subject_id, controller = %data_controller_id, "provisioned escrow key for new pair");
        }

        let client = Client {
            id: ClientId::generate(),
            secret,
            data_subject_id,
            data_controller_id,
            auth_app_id,
        };
        db.add_client(client.clone()).await?;

        info!(client_id = %client.id, "registered client");
        Ok(wire::credentials_response(&client))
    }
}
