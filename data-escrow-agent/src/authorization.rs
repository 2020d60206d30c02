//! The authorization-decision engine.
//!
//! Two independent policies render ALLOWED or DENIED_BY_DATA_SUBJECT: the
//! agent's built-in default policy and the rules a data subject has defined
//! for a controller. The caller selects the policy; the engine appends an
//! audit entry for every outcome before it takes effect.

use time::OffsetDateTime;
use tracing::{info, instrument};

use data_escrow::types::bundles::{AuthorizationBundle, DecryptionBundle, EncryptionBundle};
use data_escrow::types::database::audit::{AuditEntry, AuthorizationProcess, AuthorizationResult};
use data_escrow::types::database::client::Client;
use data_escrow::types::rules::AuthorizationRule;
use data_escrow::types::taxonomy::{DataType, DataUse};

use crate::database::DataStore;
use crate::EscrowAgentError;

/// The default decryption policy: a static allow-list mapping a data type to
/// the uses any controller may put it to without subject-defined rules.
/// Lookup is by the exact type; families do not open their subtypes here.
static DEFAULT_DECRYPTION_USES: &[(DataType, &[DataUse])] = &[
    (DataType::Personal, &[DataUse::Intranet, DataUse::Report]),
    (
        DataType::Identity,
        &[
            DataUse::ComposeEmailToSubject,
            DataUse::ComposeLetterToSubject,
        ],
    ),
    (
        DataType::WorkContact,
        &[
            DataUse::ComposeEmailToSubject,
            DataUse::InteractWithSubjectOverPhone,
        ],
    ),
    (
        DataType::HomeContact,
        &[DataUse::ComposeLetterToSubject, DataUse::SendPackageToSubject],
    ),
    (
        DataType::Nonpersonal,
        &[
            DataUse::Intranet,
            DataUse::Www,
            DataUse::Report,
            DataUse::Analytics,
        ],
    ),
];

/// Renders and records authorization decisions against one store.
pub struct AuthorizationEngine<'a, DB> {
    db: &'a DB,
}

impl<'a, DB: DataStore> AuthorizationEngine<'a, DB> {
    pub fn new(db: &'a DB) -> Self {
        Self { db }
    }

    /// Decide one request and append the outcome to the audit trail.
    #[instrument(skip_all, fields(client_id = %client.id, data_type = %bundle.data_type()))]
    pub async fn authorize(
        &self,
        client: &Client,
        bundle: &AuthorizationBundle,
        process: AuthorizationProcess,
        now: OffsetDateTime,
    ) -> Result<AuthorizationResult, EscrowAgentError> {
        let result = match (process, bundle) {
            (AuthorizationProcess::Default, AuthorizationBundle::Decryption(decryption)) => {
                default_decryption(decryption)
            }
            (AuthorizationProcess::Default, AuthorizationBundle::Encryption(encryption)) => {
                self.default_encryption(client, encryption).await?
            }
            (
                AuthorizationProcess::DataSubjectRules,
                AuthorizationBundle::Decryption(decryption),
            ) => self.subject_decryption(client, decryption, now).await?,
            (
                AuthorizationProcess::DataSubjectRules,
                AuthorizationBundle::Encryption(encryption),
            ) => self.subject_encryption(client, encryption, now).await?,
        };

        self.db
            .append_audit_entry(AuditEntry::for_decision(client, bundle, process, result, now))
            .await?;
        info!(%result, %process, "authorization decision recorded");
        Ok(result)
    }

    /// Default policy for stores: an update to an already-stored field is
    /// always allowed; a first-time store is allowed but leaves a locked
    /// rule behind, so reads stay denied until the subject opens them.
    async fn default_encryption(
        &self,
        client: &Client,
        bundle: &EncryptionBundle,
    ) -> Result<AuthorizationResult, EscrowAgentError> {
        if !bundle.update {
            self.ensure_default_rule(client, bundle.data_type).await?;
        }
        Ok(AuthorizationResult::Allowed)
    }

    /// Subject rules for reads: some rule covering the data type must carry
    /// an allowable action whose window covers `now` and whose use subsumes
    /// the requested one.
    async fn subject_decryption(
        &self,
        client: &Client,
        bundle: &DecryptionBundle,
        now: OffsetDateTime,
    ) -> Result<AuthorizationResult, EscrowAgentError> {
        let rules = self
            .db
            .find_rules(&client.data_subject_id, &client.data_controller_id)
            .await?;
        let result = decision(applicable(&rules, bundle.data_type)
            .any(|rule| rule.permits_use(bundle.data_use, now)));
        Ok(result)
    }

    /// Subject rules for stores: updates need a matching allowable
    /// provenance; first-time stores behave as under the default policy.
    async fn subject_encryption(
        &self,
        client: &Client,
        bundle: &EncryptionBundle,
        now: OffsetDateTime,
    ) -> Result<AuthorizationResult, EscrowAgentError> {
        if !bundle.update {
            self.ensure_default_rule(client, bundle.data_type).await?;
            return Ok(AuthorizationResult::Allowed);
        }

        let rules = self
            .db
            .find_rules(&client.data_subject_id, &client.data_controller_id)
            .await?;
        let result = decision(applicable(&rules, bundle.data_type)
            .any(|rule| rule.permits_provenance(bundle.data_provenance, now)));
        Ok(result)
    }

    async fn ensure_default_rule(
        &self,
        client: &Client,
        data_type: DataType,
    ) -> Result<(), EscrowAgentError> {
        let existing = self
            .db
            .find_rule(&client.data_subject_id, &client.data_controller_id, data_type)
            .await?;
        if existing.is_none() {
            self.db
                .add_rule(AuthorizationRule::locked(
                    client.data_subject_id.clone(),
                    client.data_controller_id.clone(),
                    data_type,
                ))
                .await?;
            info!(%data_type, "created locked default rule for first-time store");
        }
        Ok(())
    }
}

/// Default policy for reads: consult the static allow-list, independent of
/// subject and controller identity.
fn default_decryption(bundle: &DecryptionBundle) -> AuthorizationResult {
    decision(DEFAULT_DECRYPTION_USES.iter().any(|(data_type, uses)| {
        *data_type == bundle.data_type && uses.contains(&bundle.data_use)
    }))
}

fn applicable(
    rules: &[AuthorizationRule],
    data_type: DataType,
) -> impl Iterator<Item = &AuthorizationRule> {
    rules.iter().filter(move |rule| rule.applies_to(data_type))
}

fn decision(allowed: bool) -> AuthorizationResult {
    if allowed {
        AuthorizationResult::Allowed
    } else {
        AuthorizationResult::DeniedByDataSubject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_escrow::types::taxonomy::InteractionPurpose;

    fn decryption(data_type: DataType, data_use: DataUse) -> DecryptionBundle {
        DecryptionBundle {
            data_type,
            data_use,
            interaction_purpose: InteractionPurpose::Informative,
        }
    }

    #[test]
    fn default_policy_allows_listed_uses() {
        assert_eq!(
            AuthorizationResult::Allowed,
            default_decryption(&decryption(DataType::Personal, DataUse::Intranet))
        );
        assert_eq!(
            AuthorizationResult::Allowed,
            default_decryption(&decryption(DataType::Identity, DataUse::ComposeEmailToSubject))
        );
    }

    #[test]
    fn default_policy_denies_unlisted_uses() {
        assert_eq!(
            AuthorizationResult::DeniedByDataSubject,
            default_decryption(&decryption(DataType::Personal, DataUse::SendPackageToSubject))
        );
        assert_eq!(
            AuthorizationResult::DeniedByDataSubject,
            default_decryption(&decryption(DataType::Identity, DataUse::SendSmsToSubject))
        );
    }

    /// The allow-list is keyed by the exact type: a grant on PERSONAL does
    /// not open GIVEN_NAME under the default policy.
    #[test]
    fn default_policy_does_not_inherit_down_the_tree() {
        assert_eq!(
            AuthorizationResult::DeniedByDataSubject,
            default_decryption(&decryption(DataType::GivenName, DataUse::Intranet))
        );
    }
}
