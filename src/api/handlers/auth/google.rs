//! Google sign-in endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::account::machine::{login_gates, ApprovalBlock, CredentialError};
use crate::account::models::{Account, AuthProvider};
use crate::account::repo::{create_google_account, fetch_by_email, CreateOutcome};

use super::principal::internal_error;
use super::state::AuthState;
use super::storage::insert_session;
use super::types::{AccountResponse, GoogleLoginRequest, SessionIssued};
use super::utils::normalize_email;
use super::verifier::AssertionError;

#[utoipa::path(
    post,
    path = "/v1/auth/google",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionIssued),
        (status = 400, description = "Missing token", body = String),
        (status = 401, description = "Assertion rejected", body = String),
        (status = 403, description = "Account not approved", body = String),
        (status = 409, description = "Account uses the local sign-in path", body = String),
        (status = 502, description = "Identity provider unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn google_login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<GoogleLoginRequest>>,
) -> impl IntoResponse {
    let request: GoogleLoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let Some(token) = request.assertion() else {
        return (StatusCode::BAD_REQUEST, "No token provided".to_string()).into_response();
    };

    let assertion = match auth_state.verifier().verify(token).await {
        Ok(assertion) => assertion,
        Err(AssertionError::Invalid(reason)) => {
            return (
                StatusCode::UNAUTHORIZED,
                format!("Google authentication failed: {reason}"),
            )
                .into_response();
        }
        Err(AssertionError::Unavailable(reason)) => {
            error!("Assertion verifier unavailable: {reason}");
            return (
                StatusCode::BAD_GATEWAY,
                "Identity provider unavailable".to_string(),
            )
                .into_response();
        }
    };

    let email = normalize_email(&assertion.email);
    let account = match resolve_account(&pool, &email, &assertion).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let token = match insert_session(
        &pool,
        account.id,
        auth_state.config().session_ttl_seconds(),
    )
    .await
    {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to create session: {err}");
            return internal_error().into_response();
        }
    };

    let response = SessionIssued {
        token,
        account: AccountResponse::from(&account),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Find the account for a verified assertion, creating an auto-approved
/// customer on first login. Accounts born on the local path never resolve
/// here and vice versa.
async fn resolve_account(
    pool: &PgPool,
    email: &str,
    assertion: &super::verifier::VerifiedAssertion,
) -> Result<Account, axum::response::Response> {
    match fetch_by_email(pool, email).await {
        Ok(Some(account)) => match login_gates(&account, AuthProvider::Google) {
            Ok(()) => Ok(account),
            Err(err) => Err(gate_response(&err)),
        },
        Ok(None) => {
            let created = create_google_account(
                pool,
                &assertion.name,
                email,
                assertion.avatar_url.as_deref(),
                &assertion.subject,
            )
            .await;
            match created {
                Ok(CreateOutcome::Created(account)) => Ok(*account),
                // Lost a creation race; the retry path is the next login.
                Ok(CreateOutcome::EmailTaken) => Err((
                    StatusCode::CONFLICT,
                    "Email already registered".to_string(),
                )
                    .into_response()),
                Err(err) => {
                    error!("Failed to create google account: {err}");
                    Err(internal_error().into_response())
                }
            }
        }
        Err(err) => {
            error!("Failed to lookup account: {err}");
            Err(internal_error().into_response())
        }
    }
}

fn gate_response(err: &CredentialError) -> axum::response::Response {
    match err {
        CredentialError::WrongProvider => (
            StatusCode::CONFLICT,
            "Account uses email and password sign-in".to_string(),
        )
            .into_response(),
        CredentialError::NotApproved {
            reason: ApprovalBlock::Pending,
        } => (
            StatusCode::FORBIDDEN,
            "Account is awaiting admin approval".to_string(),
        )
            .into_response(),
        CredentialError::NotApproved {
            reason: ApprovalBlock::Rejected,
        } => (
            StatusCode::FORBIDDEN,
            "Account verification was rejected".to_string(),
        )
            .into_response(),
        CredentialError::NotFound | CredentialError::BadCredential => (
            StatusCode::UNAUTHORIZED,
            "Invalid credentials".to_string(),
        )
            .into_response(),
    }
}
