//! Pure authorization checks applied after token authentication.
//!
//! `authorize` is a function of the freshly loaded account and the route's
//! requirements only; it never mutates anything, so repeated evaluation with
//! the same inputs yields the same result.

use thiserror::Error;
use uuid::Uuid;

use super::models::{Account, Role, VerificationStatus};

/// Authenticated identity attached to a request once the bearer token has
/// been resolved against the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub account_id: Uuid,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub const fn of(account: &Account) -> Self {
        Self {
            account_id: account.id,
            role: account.role,
        }
    }
}

/// Why an authenticated caller was denied access to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("access denied for this role")]
    WrongRole,
    #[error("profile incomplete")]
    ProfileIncomplete,
    #[error("verification pending")]
    PendingApproval,
    #[error("verification rejected")]
    Rejected,
}

/// Role membership plus, when the route requires it, the verification gate.
///
/// # Errors
/// `WrongRole` when the account's role is outside `allowed`;
/// `ProfileIncomplete` for pending or unfinished profiles;
/// `PendingApproval` / `Rejected` for professionals awaiting or refused
/// admin approval. Customers and admins pass once their profile is complete.
pub fn authorize(
    account: &Account,
    allowed: &[Role],
    require_verified: bool,
) -> Result<(), AccessDenied> {
    if !allowed.contains(&account.role) {
        return Err(AccessDenied::WrongRole);
    }
    if require_verified {
        return verification_gate(account);
    }
    Ok(())
}

fn verification_gate(account: &Account) -> Result<(), AccessDenied> {
    if account.role == Role::Pending || !account.profile_completed {
        return Err(AccessDenied::ProfileIncomplete);
    }
    if account.role.professional() {
        return match account.verification_status {
            VerificationStatus::Approved => Ok(()),
            VerificationStatus::Rejected => Err(AccessDenied::Rejected),
            VerificationStatus::None | VerificationStatus::PendingApproval => {
                Err(AccessDenied::PendingApproval)
            }
        };
    }
    // Customers and admins always pass once their profile is complete.
    Ok(())
}
