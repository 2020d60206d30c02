//! What a data controller is asking to do, carried by value through the
//! whole protocol run.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::constants::params;
use crate::types::taxonomy::{DataProvenance, DataType, DataUse, InteractionPurpose};

/// Whether the protocol run seeks to store or to read personal data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Encryption,
    Decryption,
}

/// Semantics of a request to store (encrypt) a datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionBundle {
    pub data_type: DataType,
    pub data_provenance: DataProvenance,
    /// True when an existing field is overwritten rather than stored for the
    /// first time.
    pub update: bool,
}

/// Semantics of a request to read (decrypt) a datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionBundle {
    pub data_type: DataType,
    pub data_use: DataUse,
    pub interaction_purpose: InteractionPurpose,
}

/// The request payload an authorization decision is made against. Never
/// persisted; dispatched by the caller per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationBundle {
    Encryption(EncryptionBundle),
    Decryption(DecryptionBundle),
}

impl AuthorizationBundle {
    pub fn request_type(&self) -> RequestType {
        match self {
            Self::Encryption(_) => RequestType::Encryption,
            Self::Decryption(_) => RequestType::Decryption,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Encryption(bundle) => bundle.data_type,
            Self::Decryption(bundle) => bundle.data_type,
        }
    }

    /// The parameters this bundle contributes to a signed authorization
    /// call, beyond the standard set.
    pub fn signature_parameters(&self) -> Vec<(&'static str, String)> {
        let mut parameters = vec![
            (params::REQUEST_TYPE, self.request_type().to_string()),
            (params::DATA_TYPE, self.data_type().to_string()),
        ];
        match self {
            Self::Encryption(bundle) => {
                parameters.push((params::DATA_PROVENANCE, bundle.data_provenance.to_string()));
                parameters.push((params::UPDATE, bundle.update.to_string()));
            }
            Self::Decryption(bundle) => {
                parameters.push((params::DATA_USE, bundle.data_use.to_string()));
                parameters.push((
                    params::INTERACTION_PURPOSE,
                    bundle.interaction_purpose.to_string(),
                ));
            }
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_types_parse_from_their_wire_names() {
        assert_eq!(Ok(RequestType::Encryption), "ENCRYPTION".parse());
        assert_eq!(Ok(RequestType::Decryption), "DECRYPTION".parse());
        assert!("STORAGE".parse::<RequestType>().is_err());
    }

    #[test]
    fn encryption_bundles_sign_their_provenance_and_update_flag() {
        let bundle = AuthorizationBundle::Encryption(EncryptionBundle {
            data_type: DataType::Surname,
            data_provenance: DataProvenance::DataSubjectExplicit,
            update: false,
        });

        let parameters = bundle.signature_parameters();
        assert!(parameters.contains(&(params::REQUEST_TYPE, "ENCRYPTION".to_string())));
        assert!(parameters.contains(&(params::DATA_TYPE, "SURNAME".to_string())));
        assert!(parameters.contains(&(params::DATA_PROVENANCE, "DATA_SUBJECT_EXPLICIT".to_string())));
        assert!(parameters.contains(&(params::UPDATE, "false".to_string())));
    }

    #[test]
    fn decryption_bundles_sign_their_use_and_purpose() {
        let bundle = AuthorizationBundle::Decryption(DecryptionBundle {
            data_type: DataType::AimId,
            data_use: DataUse::Analytics,
            interaction_purpose: InteractionPurpose::Advert,
        });

        let parameters = bundle.signature_parameters();
        assert!(parameters.contains(&(params::DATA_USE, "ANALYTICS".to_string())));
        assert!(parameters.contains(&(params::INTERACTION_PURPOSE, "ADVERT".to_string())));
        assert_eq!(DataType::AimId, bundle.data_type());
    }
}
