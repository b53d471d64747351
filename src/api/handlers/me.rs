//! Authenticated self-service endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;

use super::auth::principal::require_auth;
use super::auth::types::AccountResponse;

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "The authenticated account", body = AccountResponse),
        (status = 401, description = "Missing or invalid session token", body = String)
    ),
    security(("bearer" = [])),
    tag = "me"
)]
pub async fn get_me(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    match require_auth(&headers, &pool).await {
        Ok(context) => {
            (StatusCode::OK, Json(AccountResponse::from(&context.account))).into_response()
        }
        Err(response) => response.into_response(),
    }
}
