//! Authentication payloads and the cached user profile.

use serde::{Deserialize, Serialize};

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email_or_phone: String,
    pub password: String,
}

/// Profile of the logged-in operator, cached next to the credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_staff: bool,
}

impl UserProfile {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub exp: String,
    pub data: UserProfile,
}

impl LoginResponse {
    pub fn credentials(&self) -> CredentialPair {
        CredentialPair {
            access: self.access.clone(),
            refresh: self.refresh.clone(),
            expiry: self.exp.clone(),
        }
    }
}

/// Access/refresh credentials as issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub expiry: String,
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Refresh response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}
