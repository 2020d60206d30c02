//! The data-semantics vocabulary: what a datum is, where it came from, and
//! what it may be used for.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Walks a subsumption hierarchy: a value `is` itself and any ancestor.
pub trait Subsumption: Copy + PartialEq + Sized {
    /// The immediate parent in the hierarchy, if any.
    fn parent(&self) -> Option<Self>;

    /// True when `other` equals `self` or one of `self`'s ancestors.
    fn is(&self, other: Self) -> bool {
        if *self == other {
            return true;
        }
        let mut cursor = self.parent();
        while let Some(current) = cursor {
            if current == other {
                return true;
            }
            cursor = current.parent();
        }
        false
    }
}

/// The kind of personal datum a request is about, arranged as a tree:
/// concrete types roll up into families (IDENTITY, WORK_CONTACT, ...) which
/// roll up into PERSONAL or SENSITIVE. A grant scoped to a family covers
/// every type beneath it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Personal,

    /// Data that is typically used to identify a data subject.
    Identity,
    GivenName,
    Surname,
    Initials,
    Pseudonym,
    GenerationQualifier,
    Title,
    CommonName,
    Country,
    Organization,
    OrganizationalUnit,
    BirthDate,
    BirthYear,
    FatherGivenName,
    MotherGivenName,
    FatherMaidenName,
    Nationality,

    /// Data used to contact the data subject at work.
    WorkContact,
    WorkLandlinePhone,
    WorkMobilePhone,
    WorkEmail,
    WorkDepartment,
    WorkStreetAddress,
    WorkCity,
    WorkStateOrProvince,
    WorkCountry,
    WorkPostalCode,

    /// Data used to contact the data subject at home.
    HomeContact,
    HomePhone,
    PersonalMobilePhone,
    PersonalEmail,
    HomeStreetAddress,
    HomeCity,
    HomeStateOrProvince,
    HomeCountry,
    HomePostalCode,

    Biometrical,
    Photograph,
    Signature,
    Fingerprint,
    IrisScan,

    OfficialIdentification,
    TaxIdentificationNumber,
    SocialSecurityIdentificationNumber,
    PersonalIdentificationNumber,
    DriverLicenseNumber,
    PassportNumber,
    PassportExpiryDate,
    PassportIssueCountry,

    /// A handle to an online service.
    OnlineHandle,
    WorkWebPage,
    PersonalWebPage,
    TwitterId,
    FacebookId,
    LinkedinId,
    GooglePlusId,
    YahooId,
    AimId,
    SkypeId,
    JabberId,
    IrcId,

    /// Data whose disclosure can harm the data subject.
    Sensitive,
    RacialOrigin,
    EthnicOrigin,
    PoliticalOpinions,
    ReligiousBeliefs,
    TradeUnionMembership,
    PhilosophicalBeliefs,
    Health,
    SexLife,

    Nonpersonal,
}

impl Subsumption for DataType {
    fn parent(&self) -> Option<Self> {
        use DataType::*;
        match self {
            Personal | Sensitive | Nonpersonal => None,

            Identity | WorkContact | HomeContact | Biometrical | OfficialIdentification
            | OnlineHandle => Some(Personal),

            GivenName | Surname | Initials | Pseudonym | GenerationQualifier | Title
            | CommonName | Country | Organization | OrganizationalUnit | BirthDate
            | BirthYear | FatherGivenName | MotherGivenName | FatherMaidenName | Nationality => {
                Some(Identity)
            }

            WorkLandlinePhone | WorkMobilePhone | WorkEmail | WorkDepartment
            | WorkStreetAddress | WorkCity | WorkStateOrProvince | WorkCountry
            | WorkPostalCode => Some(WorkContact),

            HomePhone | PersonalMobilePhone | PersonalEmail | HomeStreetAddress | HomeCity
            | HomeStateOrProvince | HomeCountry | HomePostalCode => Some(HomeContact),

            Photograph | Signature | Fingerprint | IrisScan => Some(Biometrical),

            TaxIdentificationNumber | SocialSecurityIdentificationNumber
            | PersonalIdentificationNumber | DriverLicenseNumber | PassportNumber
            | PassportExpiryDate | PassportIssueCountry => Some(OfficialIdentification),

            WorkWebPage | PersonalWebPage | TwitterId | FacebookId | LinkedinId
            | GooglePlusId | YahooId | AimId | SkypeId | JabberId | IrcId => Some(OnlineHandle),

            RacialOrigin | EthnicOrigin | PoliticalOpinions | ReligiousBeliefs
            | TradeUnionMembership | PhilosophicalBeliefs | Health | SexLife => Some(Sensitive),
        }
    }
}

/// What the requested data will be used for. Flat vocabulary: `is()`
/// degenerates to equality.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataUse {
    ComposeEmailToSubject,
    ComposeLetterToSubject,
    SendPackageToSubject,
    SendSmsToSubject,
    VisitSubject,
    InteractWithSubjectOverPhone,
    InteractWithSubjectOverChat,
    QueryThirdParty,
    NotifyThirdParty,
    UpdateThirdPartyData,
    /// Data will be posted to the data controller's intranet.
    Intranet,
    /// Data will be posted to the world wide web.
    Www,
    PublishInternal,
    PublishWorld,
    BroadcastVoice,
    BroadcastVideo,
    /// Data will be aggregated for reporting purposes.
    Report,
    /// Data will be used for analytical processing.
    Analytics,
    ApplicationDesktop,
    ApplicationRemote,
    Other,
}

impl Subsumption for DataUse {
    fn parent(&self) -> Option<Self> {
        None
    }
}

/// Where a stored datum was obtained from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataProvenance {
    /// The subject handed the data over explicitly.
    DataSubjectExplicit,
    /// Derived from observing the subject's behavior.
    DataSubjectBehavior,
    DataController,
    PublicRegistry,
    PublicData,
    ThirdParty,
    Other,
}

impl Subsumption for DataProvenance {
    fn parent(&self) -> Option<Self> {
        None
    }
}

/// The purpose of the interaction a decryption request serves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionPurpose {
    Advert,
    Informative,
    Important,
    Contractual,
    Regulatory,
    Critical,
    Alert,
    Emergency,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn subsumption_walks_ancestors() {
        assert!(DataType::Surname.is(DataType::Surname));
        assert!(DataType::Surname.is(DataType::Identity));
        assert!(DataType::Surname.is(DataType::Personal));
        assert!(DataType::AimId.is(DataType::OnlineHandle));
        assert!(DataType::Health.is(DataType::Sensitive));
    }

    #[test]
    fn subsumption_is_directional() {
        assert!(!DataType::Personal.is(DataType::Surname));
        assert!(!DataType::Identity.is(DataType::WorkContact));
        assert!(!DataType::Nonpersonal.is(DataType::Personal));
    }

    /// Every data type must reach a root in a handful of steps; a cycle in
    /// the parent table would hang `is()`.
    #[test]
    fn every_data_type_reaches_a_root() {
        for data_type in DataType::iter() {
            let mut cursor = Some(data_type);
            let mut depth = 0;
            while let Some(current) = cursor {
                cursor = current.parent();
                depth += 1;
                assert!(depth <= 4, "{data_type} does not reach a root");
            }
        }
    }

    #[test]
    fn wire_names_round_trip() {
        assert_eq!("AIM_ID", DataType::AimId.to_string());
        assert_eq!(Ok(DataType::AimId), "AIM_ID".parse());
        assert_eq!("COMPOSE_EMAIL_TO_SUBJECT", DataUse::ComposeEmailToSubject.to_string());
        assert_eq!(Ok(DataUse::Analytics), "ANALYTICS".parse());
        assert_eq!(Ok(DataProvenance::DataSubjectExplicit), "DATA_SUBJECT_EXPLICIT".parse());
        assert_eq!(Ok(InteractionPurpose::Advert), "ADVERT".parse());
        assert!("NOT_A_TYPE".parse::<DataType>().is_err());
    }

    #[test]
    fn flat_vocabularies_subsume_only_themselves() {
        assert!(DataUse::Report.is(DataUse::Report));
        assert!(!DataUse::Report.is(DataUse::Analytics));
        assert!(DataProvenance::ThirdParty.is(DataProvenance::ThirdParty));
        assert!(!DataProvenance::ThirdParty.is(DataProvenance::PublicData));
    }
}
