//! Constants that are shared between other crates in this workspace.
//! Crate-specific constants should go in their respective crates.

pub const LOCAL_AGENT_URI: &str = "https://localhost:9443";

/// Service endpoints, relative to the agent's base URI. Signatures commit to
/// the full endpoint URL, so clients and the agent must agree on these.
pub mod services {
    pub const REGISTRATION: &str = "/escrow/register";
    pub const REQUEST_TOKEN: &str = "/escrow/request_token";
    pub const AUTHORIZATION: &str = "/escrow/authorize_request_token";
    pub const KEY_EXCHANGE: &str = "/escrow/request_token_exchange";
}

/// Wire names of request parameters.
pub mod params {
    pub const CLIENT_ID: &str = "client_id";
    pub const SIGNATURE: &str = "signature";
    pub const NONCE: &str = "nonce";
    pub const TIMESTAMP: &str = "timestamp";
    pub const REQUEST_TOKEN: &str = "request_token";

    pub const REQUEST_TYPE: &str = "request_type";
    pub const DATA_TYPE: &str = "data_type";
    pub const DATA_USE: &str = "data_use";
    pub const INTERACTION_PURPOSE: &str = "interaction_purpose";
    pub const DATA_PROVENANCE: &str = "data_provenance";
    pub const UPDATE: &str = "update";
    pub const AUTHORIZATION_PROCESS: &str = "authorization_process";

    pub const DATA_SUBJECT_ID: &str = "data_subject_id";
    pub const DATA_CONTROLLER_ID: &str = "data_controller_id";
    pub const AUTH_APP_ID: &str = "auth_app_id";
}
