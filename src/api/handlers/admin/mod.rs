//! Admin review endpoints.
//!
//! Every handler here requires an authenticated `admin` account; the
//! verification queue and account listing are read-only, `review` drives the
//! approve/reject transition.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::error;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::account::machine::{ReviewDecision, TransitionError};
use crate::account::models::Role;
use crate::account::repo::{list_accounts, list_pending, review_account, ReviewOutcome};

use super::auth::principal::{internal_error, require_access};
use super::auth::types::{AccountListResponse, AccountResponse, ReviewRequest};

#[utoipa::path(
    get,
    path = "/v1/admin/accounts/pending",
    responses(
        (status = 200, description = "Accounts awaiting review", body = AccountListResponse),
        (status = 401, description = "Not authenticated", body = String),
        (status = 403, description = "Not an admin", body = String)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn pending_accounts(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(response) = require_access(&headers, &pool, &[Role::Admin], false).await {
        return response.into_response();
    }

    match list_pending(&pool).await {
        Ok(accounts) => (StatusCode::OK, Json(account_list(&accounts))).into_response(),
        Err(err) => {
            error!("Failed to list pending accounts: {err}");
            internal_error().into_response()
        }
    }
}

/// Filters for the account listing. `role=all` and an absent `verified`
/// both mean "no filter".
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListFilter {
    role: Option<String>,
    verified: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/admin/accounts",
    params(ListFilter),
    responses(
        (status = 200, description = "Accounts matching the filter", body = AccountListResponse),
        (status = 400, description = "Invalid filter", body = String),
        (status = 401, description = "Not authenticated", body = String),
        (status = 403, description = "Not an admin", body = String)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn accounts(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    filter: Query<ListFilter>,
) -> impl IntoResponse {
    if let Err(response) = require_access(&headers, &pool, &[Role::Admin], false).await {
        return response.into_response();
    }

    let role = match filter.role.as_deref() {
        None | Some("all") => None,
        Some("pending") => Some(Role::Pending),
        Some("customer") => Some(Role::Customer),
        Some("tutor") => Some(Role::Tutor),
        Some("repair_specialist") => Some(Role::RepairSpecialist),
        Some("admin") => Some(Role::Admin),
        Some(other) => {
            return (StatusCode::BAD_REQUEST, format!("Invalid role filter: {other}"))
                .into_response();
        }
    };

    let verified = match filter.verified.as_deref() {
        None => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(other) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid verified filter: {other}"),
            )
                .into_response();
        }
    };

    match list_accounts(&pool, role, verified).await {
        Ok(accounts) => (StatusCode::OK, Json(account_list(&accounts))).into_response(),
        Err(err) => {
            error!("Failed to list accounts: {err}");
            internal_error().into_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/v1/admin/accounts/{account_id}/review",
    params(("account_id" = Uuid, Path, description = "Account under review")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review recorded", body = AccountResponse),
        (status = 400, description = "Invalid decision or account not reviewable", body = String),
        (status = 401, description = "Not authenticated", body = String),
        (status = 403, description = "Not an admin, or target is an admin", body = String),
        (status = 404, description = "Account not found", body = String)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn review(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    Path(account_id): Path<Uuid>,
    payload: Option<Json<ReviewRequest>>,
) -> impl IntoResponse {
    if let Err(response) = require_access(&headers, &pool, &[Role::Admin], false).await {
        return response.into_response();
    }

    let request: ReviewRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let decision = match request.decision.as_str() {
        "approved" => ReviewDecision::Approved,
        "rejected" => ReviewDecision::Rejected,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid decision: {other}"),
            )
                .into_response();
        }
    };

    match review_account(&pool, account_id, decision, request.admin_notes).await {
        Ok(ReviewOutcome::Updated(account)) => {
            (StatusCode::OK, Json(AccountResponse::from(account.as_ref()))).into_response()
        }
        Ok(ReviewOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response()
        }
        Ok(ReviewOutcome::Refused(TransitionError::CannotModifyAdmin)) => (
            StatusCode::FORBIDDEN,
            "Admin accounts cannot be reviewed".to_string(),
        )
            .into_response(),
        Ok(ReviewOutcome::Refused(_)) => (
            StatusCode::BAD_REQUEST,
            "Account is not awaiting review".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to record review: {err}");
            internal_error().into_response()
        }
    }
}

fn account_list(accounts: &[crate::account::models::Account]) -> AccountListResponse {
    AccountListResponse {
        count: accounts.len(),
        accounts: accounts.iter().map(AccountResponse::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/melodymart")
            .unwrap()
    }

    #[tokio::test]
    async fn pending_requires_token() {
        let response = pending_accounts(Extension(lazy_pool()), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn listing_requires_token() {
        let filter = Query(ListFilter {
            role: Some("tutor".to_string()),
            verified: None,
        });
        let response = accounts(Extension(lazy_pool()), HeaderMap::new(), filter)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn review_requires_token() {
        let response = review(
            Extension(lazy_pool()),
            HeaderMap::new(),
            Path(Uuid::now_v7()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
