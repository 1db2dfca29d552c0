//! On-demand tenant lookup for UI that needs live data.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::session::require_session;
use super::state::AuthState;
use super::storage::fetch_tenant_info;
use super::types::{ErrorResponse, TenantInfoResponse, TenantResponse, UserTenantResponse};

#[utoipa::path(
    get,
    path = "/v1/user/tenant-info",
    responses(
        (status = 200, description = "Active primary tenant for the caller.", body = TenantInfoResponse),
        (status = 401, description = "Missing or invalid session token.", body = ErrorResponse),
        (status = 404, description = "No active primary tenant.", body = ErrorResponse),
    ),
    tag = "user"
)]
/// Re-joins the caller's primary membership and tenant from the database.
/// This is the fresh-read counterpart to the claims baked into the token;
/// a deactivated tenant reads as `404`, not as a stale success.
pub async fn tenant_info(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let payload = match require_session(&headers, auth_state.config()) {
        Ok(payload) => payload,
        Err(status) => {
            return (
                status,
                Json(ErrorResponse {
                    error: "Unauthorized".to_string(),
                }),
            )
                .into_response()
        }
    };

    match fetch_tenant_info(&pool, payload.claims.user_id).await {
        Ok(Some((tenant, membership))) => {
            let response = TenantInfoResponse {
                tenant: TenantResponse {
                    id: tenant.id.to_string(),
                    name: tenant.name,
                    slug: tenant.slug,
                    settings: tenant.settings,
                    features: tenant.features,
                    is_active: tenant.is_active,
                    created_at: tenant.created_at,
                },
                user_tenant: UserTenantResponse {
                    id: membership.id.to_string(),
                    user_id: membership.user_id.to_string(),
                    tenant_id: membership.tenant_id.to_string(),
                    role: membership.role,
                    is_primary: membership.is_primary,
                    joined_at: membership.joined_at,
                },
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No tenant found for user".to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to fetch tenant info: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
                .into_response()
        }
    }
}
