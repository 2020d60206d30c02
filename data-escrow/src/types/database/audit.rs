//! Authorization audit entries.
//!
//! Every authorization decision, allowed or denied, under either policy, is
//! appended here. The trail is append-only; it is the record the escrow
//! system exists to provide.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use super::client::{AppId, Client, ClientId, ControllerId, SubjectId};
use crate::types::bundles::AuthorizationBundle;
use crate::types::taxonomy::{DataProvenance, DataType, DataUse, InteractionPurpose};

/// Outcome of an authorization decision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationResult {
    Allowed,
    DeniedByDataSubject,
}

/// Which policy produced a decision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationProcess {
    /// The agent's built-in policy.
    Default,
    /// Rules the data subject has defined.
    DataSubjectRules,
}

/// Whether the decision concerned storing or reading data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditRequestType {
    Read,
    Update,
}

/// One line of the audit trail: who asked, for what, under which policy,
/// and what the answer was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub client_id: ClientId,
    pub data_subject_id: SubjectId,
    pub data_controller_id: ControllerId,
    pub auth_app_id: AppId,
    pub request_type: AuditRequestType,
    pub process: AuthorizationProcess,
    pub result: AuthorizationResult,
    pub data_type: DataType,
    pub data_use: Option<DataUse>,
    pub interaction_purpose: Option<InteractionPurpose>,
    pub data_provenance: Option<DataProvenance>,
    pub update: Option<bool>,
    pub recorded_at: OffsetDateTime,
}

impl AuditEntry {
    /// Build the entry for one decision over `bundle`.
    pub fn for_decision(
        client: &Client,
        bundle: &AuthorizationBundle,
        process: AuthorizationProcess,
        result: AuthorizationResult,
        recorded_at: OffsetDateTime,
    ) -> Self {
        let mut entry = Self {
            client_id: client.id.clone(),
            data_subject_id: client.data_subject_id.clone(),
            data_controller_id: client.data_controller_id.clone(),
            auth_app_id: client.auth_app_id.clone(),
            request_type: AuditRequestType::Read,
            process,
            result,
            data_type: bundle.data_type(),
            data_use: None,
            interaction_purpose: None,
            data_provenance: None,
            update: None,
            recorded_at,
        };
        match bundle {
            AuthorizationBundle::Encryption(encryption) => {
                entry.request_type = AuditRequestType::Update;
                entry.data_provenance = Some(encryption.data_provenance);
                entry.update = Some(encryption.update);
            }
            AuthorizationBundle::Decryption(decryption) => {
                entry.request_type = AuditRequestType::Read;
                entry.data_use = Some(decryption.data_use);
                entry.interaction_purpose = Some(decryption.interaction_purpose);
            }
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bundles::{DecryptionBundle, EncryptionBundle};
    use crate::types::database::client::ClientSecret;

    fn test_client() -> Client {
        let mut rng = rand::thread_rng();
        Client {
            id: ClientId::generate(),
            secret: ClientSecret::generate(&mut rng),
            data_subject_id: SubjectId::from("subject"),
            data_controller_id: ControllerId::from("controller"),
            auth_app_id: AppId::from("app"),
        }
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    fn decryption_decisions_record_use_and_purpose() {
        let bundle = AuthorizationBundle::Decryption(DecryptionBundle {
            data_type: DataType::Surname,
            data_use: DataUse::Report,
            interaction_purpose: InteractionPurpose::Informative,
        });

        let entry = AuditEntry::for_decision(
            &test_client(),
            &bundle,
            AuthorizationProcess::DataSubjectRules,
            AuthorizationResult::Allowed,
            now(),
        );

        assert_eq!(AuditRequestType::Read, entry.request_type);
        assert_eq!(Some(DataUse::Report), entry.data_use);
        assert_eq!(Some(InteractionPurpose::Informative), entry.interaction_purpose);
        assert_eq!(None, entry.data_provenance);
        assert_eq!(None, entry.update);
    }

    #[test]
    fn encryption_decisions_record_provenance_and_update_flag() {
        let bundle = AuthorizationBundle::Encryption(EncryptionBundle {
            data_type: DataType::PersonalEmail,
            data_provenance: DataProvenance::DataSubjectExplicit,
            update: true,
        });

        let entry = AuditEntry::for_decision(
            &test_client(),
            &bundle,
            AuthorizationProcess::Default,
            AuthorizationResult::DeniedByDataSubject,
            now(),
        );

        assert_eq!(AuditRequestType::Update, entry.request_type);
        assert_eq!(Some(DataProvenance::DataSubjectExplicit), entry.data_provenance);
        assert_eq!(Some(true), entry.update);
        assert_eq!(None, entry.data_use);
        assert_eq!(AuthorizationResult::DeniedByDataSubject, entry.result);
    }
}
