//! Role selection and profile completion.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use tracing::error;

use crate::account::machine::{DocumentUpload, ProfileSubmission, TransitionError};
use crate::account::models::Role;
use crate::account::repo::{complete_profile as persist_profile, ProfileOutcome};

use super::principal::{internal_error, require_auth};
use super::types::{AccountResponse, CompleteProfileRequest};

#[utoipa::path(
    post,
    path = "/v1/auth/complete-profile",
    request_body = CompleteProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 400, description = "Invalid role or missing documents", body = String),
        (status = 401, description = "Not authenticated", body = String),
        (status = 403, description = "Admin accounts cannot change roles", body = String)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn complete_profile(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<CompleteProfileRequest>>,
) -> impl IntoResponse {
    let context = match require_auth(&headers, &pool).await {
        Ok(context) => context,
        Err(response) => return response.into_response(),
    };

    let request: CompleteProfileRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Unknown or non-selectable role strings fall through as `None` and are
    // refused by the transition itself.
    let submission = ProfileSubmission {
        role: selectable_role(&request.role),
        specialization: request.specialization,
        experience_years: request.experience_years,
        hourly_rate: request.hourly_rate,
        bio: request.bio,
        service_types: request.service_types,
        certifications: request.certifications,
        phone: request.phone,
        address: request.address,
        documents: request
            .documents
            .into_iter()
            .map(|doc| DocumentUpload {
                filename: doc.filename,
                url: doc.url,
            })
            .collect(),
    };

    match persist_profile(&pool, context.principal.account_id, submission).await {
        Ok(ProfileOutcome::Updated(account)) => {
            (StatusCode::OK, Json(AccountResponse::from(account.as_ref()))).into_response()
        }
        Ok(ProfileOutcome::NotFound) => {
            (StatusCode::UNAUTHORIZED, "Account not found".to_string()).into_response()
        }
        Ok(ProfileOutcome::Refused(reason)) => refusal_response(reason).into_response(),
        Err(err) => {
            error!("Failed to complete profile: {err}");
            internal_error().into_response()
        }
    }
}

fn selectable_role(value: &str) -> Option<Role> {
    match value.trim() {
        "customer" => Some(Role::Customer),
        "tutor" => Some(Role::Tutor),
        "repair_specialist" => Some(Role::RepairSpecialist),
        _ => None,
    }
}

fn refusal_response(reason: TransitionError) -> (StatusCode, String) {
    match reason {
        TransitionError::InvalidRole => (
            StatusCode::BAD_REQUEST,
            "Invalid role selection".to_string(),
        ),
        TransitionError::MissingDocuments => (
            StatusCode::BAD_REQUEST,
            "Professional roles require at least one verification document".to_string(),
        ),
        TransitionError::NotReviewable | TransitionError::CannotModifyAdmin => (
            StatusCode::FORBIDDEN,
            "Admin accounts cannot change roles here".to_string(),
        ),
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

    #[test]
    fn role_strings_map_to_selectable_roles() {
        assert_eq!(selectable_role("customer"), Some(Role::Customer));
        assert_eq!(selectable_role(" tutor "), Some(Role::Tutor));
        assert_eq!(
            selectable_role("repair_specialist"),
            Some(Role::RepairSpecialist)
        );
        assert_eq!(selectable_role("admin"), None);
        assert_eq!(selectable_role("pending"), None);
        assert_eq!(selectable_role(""), None);
    }

    #[test]
    fn refusals_map_to_client_errors() {
        let (status, _) = refusal_response(TransitionError::InvalidRole);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, message) = refusal_response(TransitionError::MissingDocuments);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("document"));
        let (status, _) = refusal_response(TransitionError::CannotModifyAdmin);
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let response = complete_profile(Extension(lazy_pool()), HeaderMap::new(), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
