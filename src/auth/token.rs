use serde::{Deserialize, Serialize};

/// Access/refresh pair minted by the login endpoint.
///
/// # Example
/// ```
/// use keyward::auth::Credentials;
///
/// let creds: Credentials = serde_json::from_str(
///     r#"{"access_token": "a-1", "refresh_token": "r-1", "token_type": "bearer"}"#,
/// ).unwrap();
/// assert_eq!(creds.refresh_token, "r-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body returned by the refresh endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Body returned by the probe endpoint when asked for the current profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub current_user: CurrentUser,
}

impl UserProfile {
    pub fn role(&self) -> &str {
        &self.current_user.role
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
