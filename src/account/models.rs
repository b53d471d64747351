//! Account record and the enums describing its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use utoipa::ToSchema;
use uuid::Uuid;

/// Role held by an account. `Pending` is the initial state for accounts
/// that have not yet completed their profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pending,
    Customer,
    Tutor,
    RepairSpecialist,
    Admin,
}

impl Role {
    /// Parse the persisted `accounts.role` textual value into a typed enum.
    pub(crate) fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "customer" => Ok(Self::Customer),
            "tutor" => Ok(Self::Tutor),
            "repair_specialist" => Ok(Self::RepairSpecialist),
            "admin" => Ok(Self::Admin),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid accounts.role value: {value}"),
            )))),
        }
    }

    #[must_use]
    pub const fn as_db(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Customer => "customer",
            Self::Tutor => "tutor",
            Self::RepairSpecialist => "repair_specialist",
            Self::Admin => "admin",
        }
    }

    /// Roles a user may select during profile completion. `pending` and
    /// `admin` are never selectable.
    #[must_use]
    pub const fn selectable(self) -> bool {
        matches!(self, Self::Customer | Self::Tutor | Self::RepairSpecialist)
    }

    /// Roles whose access is gated on admin approval.
    #[must_use]
    pub const fn professional(self) -> bool {
        matches!(self, Self::Tutor | Self::RepairSpecialist)
    }
}

/// Identity provider an account was created through. Immutable after
/// creation; determines which login path is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Local,
    Google,
}

impl AuthProvider {
    pub(crate) fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "local" => Ok(Self::Local),
            "google" => Ok(Self::Google),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid accounts.provider value: {value}"),
            )))),
        }
    }

    #[must_use]
    pub const fn as_db(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
        }
    }
}

/// Admin-review outcome gating professional-role access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    None,
    PendingApproval,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub(crate) fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "none" => Ok(Self::None),
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid accounts.verification_status value: {value}"),
            )))),
        }
    }

    #[must_use]
    pub const fn as_db(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Reference to an uploaded evidence file. Upload mechanics live in a
/// separate service; only the stored reference is kept here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerificationDocument {
    pub filename: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A user account row loaded from `accounts`.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Stored normalized (trimmed, lowercased); unique across providers.
    pub email: String,
    pub avatar_url: Option<String>,
    pub provider: AuthProvider,
    pub google_sub: Option<String>,
    pub password_hash: Option<String>,
    pub role: Role,
    pub profile_completed: bool,
    pub verification_status: VerificationStatus,
    pub documents: Vec<VerificationDocument>,
    // Tutor fields
    pub specialization: Option<String>,
    pub experience_years: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub bio: Option<String>,
    // Repair specialist fields
    pub service_types: Vec<String>,
    pub certifications: Vec<String>,
    // Customer fields
    pub phone: Option<String>,
    pub address: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Derived convenience flag; the database stores only
    /// `verification_status`, so the two can never disagree.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self.verification_status, VerificationStatus::Approved)
    }
}

impl<'r> FromRow<'r, PgRow> for Account {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let provider: String = row.try_get("provider")?;
        let role: String = row.try_get("role")?;
        let status: String = row.try_get("verification_status")?;
        let documents: serde_json::Value = row.try_get("documents")?;
        let documents: Vec<VerificationDocument> =
            serde_json::from_value(documents).map_err(|err| {
                sqlx::Error::Decode(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("invalid accounts.documents value: {err}"),
                )))
            })?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            avatar_url: row.try_get("avatar_url")?,
            provider: AuthProvider::from_db(&provider)?,
            google_sub: row.try_get("google_sub")?,
            password_hash: row.try_get("password_hash")?,
            role: Role::from_db(&role)?,
            profile_completed: row.try_get("profile_completed")?,
            verification_status: VerificationStatus::from_db(&status)?,
            documents,
            specialization: row.try_get("specialization")?,
            experience_years: row.try_get("experience_years")?,
            hourly_rate: row.try_get("hourly_rate")?,
            bio: row.try_get("bio")?,
            service_types: row.try_get("service_types")?,
            certifications: row.try_get("certifications")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            admin_notes: row.try_get("admin_notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
