//! Entry points mapping parsed parameter maps onto protocol operations.
//!
//! The transport layer parses the form body of each call into a
//! [`ParamMap`], picks the matching method here, and writes back the
//! returned status and body.

use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

use data_escrow::constants::params;
use data_escrow::types::bundles::{
    AuthorizationBundle, DecryptionBundle, EncryptionBundle, RequestType,
};
use data_escrow::types::database::audit::AuthorizationProcess;
use data_escrow::types::database::client::SubjectId;
use data_escrow::types::wire::{ParamMap, ServiceResponse};

use crate::database::DataStore;
use crate::operations::{
    AuthorizeToken, ExchangeToken, GenerateToken, Operation, RegisterClient, RegistrationParams,
};
use crate::server::Context;
use crate::validation::SignedParams;
use crate::{Config, EscrowAgentError};

/// The escrow agent's callable surface.
pub struct EscrowService<DB> {
    context: Context<DB>,
}

impl<DB: DataStore> EscrowService<DB> {
    pub fn new(config: Config, db: Arc<DB>) -> Self {
        Self {
            context: Context::new(config, db),
        }
    }

    pub fn context(&self) -> &Context<DB> {
        &self.context
    }

    /// Registration: issue client credentials for a (subject, controller,
    /// application) triple.
    #[instrument(skip_all)]
    pub async fn register_client(&self, params: &ParamMap) -> ServiceResponse {
        match RegistrationParams::from_params(params) {
            Ok(registration) => {
                RegisterClient::new(registration)
                    .handle_request(&self.context)
                    .await
            }
            Err(error) => error.into(),
        }
    }

    /// First leg: generate an unauthorized request token.
    #[instrument(skip_all)]
    pub async fn request_token(&self, params: &ParamMap) -> ServiceResponse {
        match SignedParams::from_params(params, false) {
            Ok(signed) => GenerateToken::new(signed).handle_request(&self.context).await,
            Err(error) => error.into(),
        }
    }

    /// Second leg: authorize a pending token against the decision engine.
    #[instrument(skip_all)]
    pub async fn authorize_request_token(&self, params: &ParamMap) -> ServiceResponse {
        let parsed = SignedParams::from_params(params, true).and_then(|signed| {
            Ok((signed, parse_bundle(params)?, parse_process(params)?))
        });
        match parsed {
            Ok((signed, bundle, process)) => {
                AuthorizeToken::new(signed, bundle, process)
                    .handle_request(&self.context)
                    .await
            }
            Err(error) => error.into(),
        }
    }

    /// Third leg: consume an authorized token for a derived key.
    #[instrument(skip_all)]
    pub async fn exchange_request_token(&self, params: &ParamMap) -> ServiceResponse {
        match SignedParams::from_params(params, true) {
            Ok(signed) => ExchangeToken::new(signed).handle_request(&self.context).await,
            Err(error) => error.into(),
        }
    }

    /// Read-only JSON export of a data subject's audit trail.
    #[instrument(skip_all)]
    pub async fn authorization_log(&self, params: &ParamMap) -> ServiceResponse {
        match self.render_authorization_log(params).await {
            Ok(body) => ServiceResponse::ok(body),
            Err(error) => error.into(),
        }
    }

    async fn render_authorization_log(
        &self,
        params: &ParamMap,
    ) -> Result<String, EscrowAgentError> {
        let subject = params
            .get(params::DATA_SUBJECT_ID)
            .cloned()
            .ok_or(EscrowAgentError::MissingParameter(params::DATA_SUBJECT_ID))?;
        let entries = self
            .context
            .db
            .find_audit_entries(&SubjectId::from(subject))
            .await?;
        Ok(serde_json::to_string(&entries)?)
    }
}

fn required<'a>(params: &'a ParamMap, name: &'static str) -> Result<&'a str, EscrowAgentError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or(EscrowAgentError::MissingParameter(name))
}

fn parse_enum<T: FromStr>(params: &ParamMap, name: &'static str) -> Result<T, EscrowAgentError> {
    required(params, name)?
        .parse()
        .map_err(|_| EscrowAgentError::MalformedParameter(name))
}

/// Build the authorization bundle named by `request_type` from its
/// variant-specific parameters.
fn parse_bundle(params: &ParamMap) -> Result<AuthorizationBundle, EscrowAgentError> {
    let request_type: RequestType = parse_enum(params, params::REQUEST_TYPE)?;
    match request_type {
        RequestType::Encryption => Ok(AuthorizationBundle::Encryption(EncryptionBundle {
            data_type: parse_enum(params, params::DATA_TYPE)?,
            data_provenance: parse_enum(params, params::DATA_PROVENANCE)?,
            update: required(params, params::UPDATE)?
                .parse()
                .map_err(|_| EscrowAgentError::MalformedParameter(params::UPDATE))?,
        })),
        RequestType::Decryption => Ok(AuthorizationBundle::Decryption(DecryptionBundle {
            data_type: parse_enum(params, params::DATA_TYPE)?,
            data_use: parse_enum(params, params::DATA_USE)?,
            interaction_purpose: parse_enum(params, params::INTERACTION_PURPOSE)?,
        })),
    }
}

/// Which policy to decide under. Data-subject rules unless the caller asks
/// for the default policy explicitly.
fn parse_process(params: &ParamMap) -> Result<AuthorizationProcess, EscrowAgentError> {
    match params.get(params::AUTHORIZATION_PROCESS) {
        None => Ok(AuthorizationProcess::DataSubjectRules),
        Some(value) => value
            .parse()
            .map_err(|_| EscrowAgentError::MalformedParameter(params::AUTHORIZATION_PROCESS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_escrow::types::taxonomy::{DataProvenance, DataType, DataUse, InteractionPurpose};

    fn decryption_params() -> ParamMap {
        let mut params = ParamMap::new();
        let _ = params.insert("request_type".to_string(), "DECRYPTION".to_string());
        let _ = params.insert("data_type".to_string(), "AIM_ID".to_string());
        let _ = params.insert("data_use".to_string(), "ANALYTICS".to_string());
        let _ = params.insert("interaction_purpose".to_string(), "ADVERT".to_string());
        params
    }

    #[test]
    fn decryption_bundles_parse() {
        let bundle = parse_bundle(&decryption_params()).unwrap();
        assert_eq!(
            AuthorizationBundle::Decryption(DecryptionBundle {
                data_type: DataType::AimId,
                data_use: DataUse::Analytics,
                interaction_purpose: InteractionPurpose::Advert,
            }),
            bundle
        );
    }

    #[test]
    fn encryption_bundles_parse() {
        let mut params = ParamMap::new();
        let _ = params.insert("request_type".to_string(), "ENCRYPTION".to_string());
        let _ = params.insert("data_type".to_string(), "SURNAME".to_string());
        let _ = params.insert(
            "data_provenance".to_string(),
            "DATA_SUBJECT_EXPLICIT".to_string(),
        );
        let _ = params.insert("update".to_string(), "true".to_string());

        let bundle = parse_bundle(&params).unwrap();
        assert_eq!(
            AuthorizationBundle::Encryption(EncryptionBundle {
                data_type: DataType::Surname,
                data_provenance: DataProvenance::DataSubjectExplicit,
                update: true,
            }),
            bundle
        );
    }

    #[test]
    fn missing_bundle_parameters_are_rejected() {
        let mut params = decryption_params();
        let _ = params.remove("data_use");

        assert!(matches!(
            parse_bundle(&params),
            Err(EscrowAgentError::MissingParameter("data_use"))
        ));
    }

    #[test]
    fn unknown_vocabulary_values_are_rejected() {
        let mut params = decryption_params();
        let _ = params.insert("data_type".to_string(), "NOT_A_TYPE".to_string());

        assert!(matches!(
            parse_bundle(&params),
            Err(EscrowAgentError::MalformedParameter("data_type"))
        ));
    }

    #[test]
    fn the_policy_selector_defaults_to_subject_rules() {
        assert_eq!(
            AuthorizationProcess::DataSubjectRules,
            parse_process(&ParamMap::new()).unwrap()
        );

        let mut params = ParamMap::new();
        let _ = params.insert("authorization_process".to_string(), "DEFAULT".to_string());
        assert_eq!(
            AuthorizationProcess::Default,
            parse_process(&params).unwrap()
        );
    }
}
