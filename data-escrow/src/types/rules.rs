//! Data-subject authorization rules and their validity windows.
//!
//! Rules follow lock-down semantics: a rule created for a data type grants
//! nothing until the data subject records allowable uses or provenances in
//! it, and an entry whose vocabulary slot is empty matches no request.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::types::database::client::{ControllerId, SubjectId};
use crate::types::taxonomy::{DataProvenance, DataType, DataUse, Subsumption};

/// Time span in which a grant or a key is usable. An absent `valid_to`
/// leaves the grant open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub valid_from: OffsetDateTime,
    pub valid_to: Option<OffsetDateTime>,
}

impl ValidityWindow {
    pub fn starting(valid_from: OffsetDateTime, length: Duration) -> Self {
        Self {
            valid_from,
            valid_to: Some(valid_from + length),
        }
    }

    pub fn open_ended(valid_from: OffsetDateTime) -> Self {
        Self {
            valid_from,
            valid_to: None,
        }
    }

    /// Inclusive at both edges.
    pub fn covers(&self, instant: OffsetDateTime) -> bool {
        instant >= self.valid_from && self.valid_to.map_or(true, |until| instant <= until)
    }
}

/// A use the data subject has opened, inside a validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowableAction {
    pub data_use: Option<DataUse>,
    pub window: ValidityWindow,
}

impl AllowableAction {
    pub fn permits(&self, requested: DataUse, now: OffsetDateTime) -> bool {
        self.window.covers(now)
            && self
                .data_use
                .map_or(false, |granted| requested.is(granted))
    }
}

/// A provenance the data subject accepts updates from, inside a validity
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowableProvenance {
    pub data_provenance: Option<DataProvenance>,
    pub window: ValidityWindow,
}

impl AllowableProvenance {
    pub fn permits(&self, requested: DataProvenance, now: OffsetDateTime) -> bool {
        self.window.covers(now)
            && self
                .data_provenance
                .map_or(false, |granted| requested.is(granted))
    }
}

/// One (subject, controller, data type) authorization rule: the sets of
/// uses and provenances the subject has opened for that slice of their data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRule {
    pub data_subject_id: SubjectId,
    pub data_controller_id: ControllerId,
    pub data_type: DataType,
    pub actions: Vec<AllowableAction>,
    pub provenances: Vec<AllowableProvenance>,
}

impl AuthorizationRule {
    /// A freshly created rule grants nothing until the subject edits it.
    pub fn locked(
        data_subject_id: SubjectId,
        data_controller_id: ControllerId,
        data_type: DataType,
    ) -> Self {
        Self {
            data_subject_id,
            data_controller_id,
            data_type,
            actions: Vec::new(),
            provenances: Vec::new(),
        }
    }

    /// Whether a request against `requested` falls under this rule: the rule
    /// covers its own data type and every type beneath it.
    pub fn applies_to(&self, requested: DataType) -> bool {
        requested.is(self.data_type)
    }

    pub fn permits_use(&self, requested: DataUse, now: OffsetDateTime) -> bool {
        self.actions.iter().any(|action| action.permits(requested, now))
    }

    pub fn permits_provenance(&self, requested: DataProvenance, now: OffsetDateTime) -> bool {
        self.provenances
            .iter()
            .any(|provenance| provenance.permits(requested, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn rule_with_action(data_type: DataType, data_use: Option<DataUse>) -> AuthorizationRule {
        let mut rule = AuthorizationRule::locked(
            SubjectId::from("subject"),
            ControllerId::from("controller"),
            data_type,
        );
        rule.actions.push(AllowableAction {
            data_use,
            window: ValidityWindow::open_ended(now() - Duration::days(1)),
        });
        rule
    }

    #[test]
    fn windows_are_inclusive_at_both_edges() {
        let window = ValidityWindow::starting(now(), Duration::hours(1));

        assert!(window.covers(now()));
        assert!(window.covers(now() + Duration::hours(1)));
        assert!(!window.covers(now() - Duration::milliseconds(1)));
        assert!(!window.covers(now() + Duration::hours(1) + Duration::milliseconds(1)));
    }

    #[test]
    fn open_ended_windows_never_expire() {
        let window = ValidityWindow::open_ended(now());
        assert!(window.covers(now() + Duration::days(10_000)));
    }

    #[test]
    fn a_locked_rule_grants_nothing() {
        let rule = AuthorizationRule::locked(
            SubjectId::from("subject"),
            ControllerId::from("controller"),
            DataType::Surname,
        );

        assert!(!rule.permits_use(DataUse::Report, now()));
        assert!(!rule.permits_provenance(DataProvenance::DataSubjectExplicit, now()));
    }

    #[test]
    fn an_action_without_a_use_matches_no_request() {
        let rule = rule_with_action(DataType::Surname, None);
        assert!(!rule.permits_use(DataUse::Report, now()));
    }

    #[test]
    fn a_matching_action_inside_its_window_permits() {
        let rule = rule_with_action(DataType::Surname, Some(DataUse::Report));

        assert!(rule.permits_use(DataUse::Report, now()));
        assert!(!rule.permits_use(DataUse::Analytics, now()));
    }

    #[test]
    fn an_elapsed_window_denies() {
        let mut rule = rule_with_action(DataType::Surname, Some(DataUse::Report));
        rule.actions[0].window =
            ValidityWindow::starting(now() - Duration::days(2), Duration::days(1));

        assert!(!rule.permits_use(DataUse::Report, now()));
    }

    #[test]
    fn rules_apply_to_subsumed_data_types() {
        let rule = rule_with_action(DataType::Personal, Some(DataUse::Report));

        assert!(rule.applies_to(DataType::Surname));
        assert!(rule.applies_to(DataType::Personal));
        assert!(!rule.applies_to(DataType::Nonpersonal));
    }

    #[test]
    fn provenances_follow_the_same_window_semantics() {
        let mut rule = AuthorizationRule::locked(
            SubjectId::from("subject"),
            ControllerId::from("controller"),
            DataType::Surname,
        );
        rule.provenances.push(AllowableProvenance {
            data_provenance: Some(DataProvenance::DataSubjectExplicit),
            window: ValidityWindow::open_ended(now() - Duration::days(1)),
        });

        assert!(rule.permits_provenance(DataProvenance::DataSubjectExplicit, now()));
        assert!(!rule.permits_provenance(DataProvenance::ThirdParty, now()));
    }
}
