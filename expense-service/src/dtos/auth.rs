use serde::{Deserialize, Serialize};

/// Login exchanges an identity-provider ID token for a session.
///
/// `id_token` is optional here so a missing token yields the same
/// "No token provided" error as an empty one.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "idToken", default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
