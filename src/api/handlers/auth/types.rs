//! Request/response types for auth and admin endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::account::models::{Account, VerificationDocument};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct GoogleLoginRequest {
    /// Google ID token. `credential` is accepted as an alias for clients
    /// posting the raw Google Sign-In callback payload.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl GoogleLoginRequest {
    #[must_use]
    pub fn assertion(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or(self.credential.as_deref())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DocumentReference {
    pub filename: String,
    pub url: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct CompleteProfileRequest {
    pub role: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub service_types: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// References returned by the upload service for evidence files.
    #[serde(default)]
    pub documents: Vec<DocumentReference>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ReviewRequest {
    /// `approved` or `rejected`.
    pub decision: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Safe account view returned to clients. `is_verified` is derived from
/// `verification_status` and kept on the wire for client compatibility.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub provider: String,
    pub role: String,
    pub profile_completed: bool,
    pub verification_status: String,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub service_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub certifications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub documents: Vec<VerificationDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name.clone(),
            email: account.email.clone(),
            avatar_url: account.avatar_url.clone(),
            provider: account.provider.as_db().to_string(),
            role: account.role.as_db().to_string(),
            profile_completed: account.profile_completed,
            verification_status: account.verification_status.as_db().to_string(),
            is_verified: account.is_verified(),
            specialization: account.specialization.clone(),
            experience_years: account.experience_years,
            hourly_rate: account.hourly_rate,
            bio: account.bio.clone(),
            service_types: account.service_types.clone(),
            certifications: account.certifications.clone(),
            phone: account.phone.clone(),
            address: account.address.clone(),
            documents: account.documents.clone(),
            admin_notes: account.admin_notes.clone(),
            created_at: account.created_at.to_rfc3339(),
            updated_at: account.updated_at.to_rfc3339(),
        }
    }
}

/// Login/register response: session token plus the account it references.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionIssued {
    pub token: String,
    pub account: AccountResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountListResponse {
    pub count: usize,
    pub accounts: Vec<AccountResponse>,
}
