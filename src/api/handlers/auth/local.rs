//! Email and password registration and login.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::account::machine::{login_gates, ApprovalBlock, CredentialError};
use crate::account::models::AuthProvider;
use crate::account::repo::{create_local_account, fetch_by_email, CreateOutcome};

use super::principal::internal_error;
use super::state::AuthState;
use super::storage::insert_session;
use super::types::{AccountResponse, LoginRequest, RegisterRequest, SessionIssued};
use super::utils::{
    hash_password, normalize_email, valid_email, verify_password, MIN_PASSWORD_LEN,
};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionIssued),
        (status = 400, description = "Invalid payload", body = String),
        (status = 409, description = "Email already registered", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let name = request.name.trim();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Name is required".to_string()).into_response();
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email address".to_string()).into_response();
    }

    if request.password.len() < MIN_PASSWORD_LEN {
        return (
            StatusCode::BAD_REQUEST,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        )
            .into_response();
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return internal_error().into_response();
        }
    };

    let account = match create_local_account(&pool, name, &email, &password_hash).await {
        Ok(CreateOutcome::Created(account)) => *account,
        Ok(CreateOutcome::EmailTaken) => {
            return (
                StatusCode::CONFLICT,
                "Email already registered".to_string(),
            )
                .into_response();
        }
        Err(err) => {
            error!("Failed to create account: {err}");
            return internal_error().into_response();
        }
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
    (StatusCode::CREATED, Json(response)).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionIssued),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Invalid credentials", body = String),
        (status = 403, description = "Account not approved", body = String),
        (status = 409, description = "Account uses Google sign-in", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Email and password are required".to_string(),
        )
            .into_response();
    }

    let account = match fetch_by_email(&pool, &email).await {
        Ok(Some(account)) => account,
        Ok(None) => return invalid_credentials().into_response(),
        Err(err) => {
            error!("Failed to lookup account: {err}");
            return internal_error().into_response();
        }
    };

    if let Err(err) = login_gates(&account, AuthProvider::Local) {
        return match err {
            CredentialError::WrongProvider => (
                StatusCode::CONFLICT,
                "Account uses Google sign-in".to_string(),
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
            CredentialError::NotFound | CredentialError::BadCredential => {
                invalid_credentials().into_response()
            }
        };
    }

    let Some(hash) = account.password_hash.as_deref() else {
        return invalid_credentials().into_response();
    };
    if !verify_password(&request.password, hash) {
        return invalid_credentials().into_response();
    }

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

// A single message for every credential failure keeps account existence
// unguessable.
fn invalid_credentials() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
}

#[cfg(test)]
mod tests {
    use super::super::state::{AuthConfig, AuthState};
    use super::super::verifier::tests::{static_verifier, TEST_AUDIENCE};
    use super::*;
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(
            AuthConfig::new(TEST_AUDIENCE.to_string()),
            static_verifier("token", "bea@example.com"),
        ))
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/melodymart")
            .unwrap()
    }

    #[tokio::test]
    async fn register_rejects_blank_name() {
        let request = RegisterRequest {
            name: "  ".to_string(),
            email: "bea@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        let response = register(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_bad_email() {
        let request = RegisterRequest {
            name: "Bea".to_string(),
            email: "not-an-email".to_string(),
            password: "correct horse".to_string(),
        };
        let response = register(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let request = RegisterRequest {
            name: "Bea".to_string(),
            email: "bea@example.com".to_string(),
            password: "short".to_string(),
        };
        let response = register(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_rejects_empty_fields() {
        let request = LoginRequest {
            email: String::new(),
            password: String::new(),
        };
        let response = login(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
