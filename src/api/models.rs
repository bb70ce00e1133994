use serde::{Deserialize, Serialize};

/// Credentials presented to the token endpoint
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    pub client_id: String,
    pub refresh_token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret: String,
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub jwt: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Error payload returned by the API server on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error_code: Option<i64>,
    pub error_message: String,
}
