//! Authenticated principal extraction and authorization helpers.
//!
//! Flow Overview: read the bearer token, resolve it to a session, re-fetch
//! the account row and return it with a typed principal. Role and
//! verification state always come from the store, never from the token, so
//! admin decisions take effect on the next request.

use axum::http::{HeaderMap, StatusCode};
use sqlx::PgPool;
use tracing::error;

use crate::account::guard::{authorize, AccessDenied, Principal};
use crate::account::models::{Account, Role};
use crate::account::repo::fetch_account;

use super::session::extract_bearer_token;
use super::storage::lookup_session;
use super::utils::hash_session_token;

/// Account plus the principal derived from it, produced once per request.
pub(crate) struct AuthContext {
    pub(crate) principal: Principal,
    pub(crate) account: Account,
}

/// Resolve the bearer token into an account, or return the 401 reason.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<AuthContext, (StatusCode, String)> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err((StatusCode::UNAUTHORIZED, "No token".to_string()));
    };

    // Only the hash is stored; never compare raw tokens against the database.
    let token_hash = hash_session_token(&token);
    let account_id = match lookup_session(pool, &token_hash).await {
        Ok(Some(account_id)) => account_id,
        Ok(None) => return Err((StatusCode::UNAUTHORIZED, "Invalid token".to_string())),
        Err(err) => {
            error!("Failed to lookup session: {err}");
            return Err(internal_error());
        }
    };

    match fetch_account(pool, account_id).await {
        Ok(Some(account)) => Ok(AuthContext {
            principal: Principal::of(&account),
            account,
        }),
        // The session outlived its account.
        Ok(None) => Err((StatusCode::UNAUTHORIZED, "Account not found".to_string())),
        Err(err) => {
            error!("Failed to fetch account for session: {err}");
            Err(internal_error())
        }
    }
}

/// Authenticate and enforce the route's role/verification requirements.
pub(crate) async fn require_access(
    headers: &HeaderMap,
    pool: &PgPool,
    allowed: &[Role],
    require_verified: bool,
) -> Result<AuthContext, (StatusCode, String)> {
    let context = require_auth(headers, pool).await?;
    authorize(&context.account, allowed, require_verified).map_err(denial_response)?;
    Ok(context)
}

pub(crate) fn denial_response(denied: AccessDenied) -> (StatusCode, String) {
    let message = match denied {
        AccessDenied::WrongRole => "Access denied".to_string(),
        AccessDenied::ProfileIncomplete => "Profile incomplete".to_string(),
        AccessDenied::PendingApproval => "Verification pending".to_string(),
        AccessDenied::Rejected => "Verification rejected".to_string(),
    };
    (StatusCode::FORBIDDEN, message)
}

pub(crate) fn internal_error() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}
