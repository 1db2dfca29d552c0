//! Authenticated self-service endpoints.
//!
//! Flow Overview:
//! 1) Authenticate via the signed session token.
//! 2) Resolve the current user row from the database.
//! 3) Apply allow-listed profile updates.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::session::require_session;
use super::auth::AuthState;

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub locale: Option<String>,
    pub preferred_locales: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct MeUpdateRequest {
    pub display_name: Option<String>,
    pub locale: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Return the authenticated user profile.", body = MeResponse),
        (status = 401, description = "Missing or invalid session token."),
        (status = 404, description = "User no longer active."),
    ),
    tag = "me"
)]
pub async fn get_me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let payload = match require_session(&headers, auth_state.config()) {
        Ok(payload) => payload,
        Err(status) => return status.into_response(),
    };

    match fetch_profile(&pool, payload.claims.user_id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch /me profile: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/v1/me",
    request_body = MeUpdateRequest,
    responses(
        (status = 200, description = "Profile updated.", body = MeResponse),
        (status = 400, description = "Invalid update payload."),
        (status = 401, description = "Missing or invalid session token."),
        (status = 404, description = "User no longer active."),
    ),
    tag = "me"
)]
pub async fn patch_me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Json(payload): Json<MeUpdateRequest>,
) -> impl IntoResponse {
    let session = match require_session(&headers, auth_state.config()) {
        Ok(session) => session,
        Err(status) => return status.into_response(),
    };

    let display_name = normalize_optional(payload.display_name);
    let locale = normalize_optional(payload.locale);

    if display_name.is_none() && locale.is_none() {
        return (StatusCode::BAD_REQUEST, "No updates provided.").into_response();
    }

    match update_profile(&pool, session.claims.user_id, display_name, locale).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to update /me profile: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<MeResponse>, sqlx::Error> {
    let query = r#"
        SELECT
            id::text AS id,
            email,
            display_name,
            locale,
            preferred_locales,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
        FROM users
        WHERE id = $1 AND is_active
        LIMIT 1
    "#;
    let row = sqlx::query(query).bind(user_id).fetch_optional(pool).await?;
    Ok(row.map(|row| MeResponse {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        locale: row.get("locale"),
        preferred_locales: row.get("preferred_locales"),
        created_at: row.get("created_at"),
    }))
}

async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    display_name: Option<String>,
    locale: Option<String>,
) -> Result<Option<MeResponse>, sqlx::Error> {
    let query = r#"
        UPDATE users
        SET
            display_name = COALESCE($1, display_name),
            locale = COALESCE($2, locale)
        WHERE id = $3 AND is_active
        RETURNING
            id::text AS id,
            email,
            display_name,
            locale,
            preferred_locales,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
    "#;
    let row = sqlx::query(query)
        .bind(display_name)
        .bind(locale)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| MeResponse {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        locale: row.get("locale"),
        preferred_locales: row.get("preferred_locales"),
        created_at: row.get("created_at"),
    }))
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
