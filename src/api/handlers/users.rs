//! Login history listing.
//!
//! Exposes the append-only `login_events` rows for a user, newest first.
//! Callers may only read their own history unless their session carries the
//! admin flag; anything else reads as `404` to avoid user-id probing.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::auth::session::require_session;
use super::auth::AuthState;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginHistoryParams {
    /// Events per page (1..=100, default 10).
    pub limit: Option<i64>,
    /// 1-based page number.
    pub page: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginEventResponse {
    pub id: String,
    pub user_id: String,
    pub tenant_id: Option<String>,
    pub login_at: String,
    pub login_ip: Option<String>,
    pub user_agent: Option<String>,
    #[schema(value_type = Object)]
    pub device_info: serde_json::Value,
    pub success: bool,
    pub session_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/logins",
    params(
        ("user_id" = String, Path, description = "User id"),
        LoginHistoryParams,
    ),
    responses(
        (status = 200, description = "Login events, newest first.", body = [LoginEventResponse]),
        (status = 401, description = "Missing or invalid session token."),
        (status = 404, description = "Unknown user or not visible to the caller."),
    ),
    tag = "users"
)]
pub async fn list_user_logins(
    Path(user_id): Path<String>,
    Query(params): Query<LoginHistoryParams>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let session = match require_session(&headers, auth_state.config()) {
        Ok(session) => session,
        Err(status) => return status.into_response(),
    };

    let Ok(user_id) = Uuid::parse_str(user_id.trim()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if user_id != session.claims.user_id && !session.claims.is_admin {
        return StatusCode::NOT_FOUND.into_response();
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1).saturating_mul(limit);

    match fetch_login_events(&pool, user_id, limit, offset).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => {
            error!("Failed to list login events: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn fetch_login_events(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<LoginEventResponse>, sqlx::Error> {
    let query = r#"
        SELECT
            id::text AS id,
            user_id::text AS user_id,
            tenant_id::text AS tenant_id,
            to_char(login_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS login_at,
            login_ip,
            user_agent,
            device_info::text AS device_info,
            success,
            session_id::text AS session_id
        FROM login_events
        WHERE user_id = $1
        ORDER BY login_at DESC
        LIMIT $2 OFFSET $3
    "#;
    let rows = sqlx::query(query)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            let device_text: String = row.get("device_info");
            let device_info = serde_json::from_str(&device_text)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
            Ok(LoginEventResponse {
                id: row.get("id"),
                user_id: row.get("user_id"),
                tenant_id: row.get("tenant_id"),
                login_at: row.get("login_at"),
                login_ip: row.get("login_ip"),
                user_agent: row.get("user_agent"),
                device_info,
                success: row.get("success"),
                session_id: row.get("session_id"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::claims::SessionClaims;
    use crate::api::handlers::auth::types::Role;
    use axum::http::HeaderValue;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn state() -> Arc<AuthState> {
        Arc::new(AuthState::new(
            crate::api::handlers::auth::AuthConfig::new(
                "https://foyer.dev".to_string(),
                SecretString::from("test-secret".to_string()),
            ),
        ))
    }

    fn lazy_pool() -> PgPool {
        match PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://nobody@127.0.0.1:1/nowhere")
        {
            Ok(pool) => pool,
            Err(err) => panic!("lazy pool must construct: {err}"),
        }
    }

    fn bearer_for(state: &AuthState, claims: SessionClaims) -> HeaderMap {
        use crate::api::handlers::auth::session::tests_support::encode_for_tests;

        let token = encode_for_tests(state.config(), claims);
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("auth header"),
        );
        headers
    }

    #[tokio::test]
    async fn other_users_history_reads_as_not_found() {
        let state = state();
        let claims = SessionClaims {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::Retailer,
            tenant_slug: "jane".to_string(),
            is_admin: false,
        };
        let headers = bearer_for(&state, claims);

        let response = list_user_logins(
            Path(Uuid::new_v4().to_string()),
            Query(LoginHistoryParams {
                limit: None,
                page: None,
            }),
            headers,
            Extension(lazy_pool()),
            Extension(state),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unauthenticated_history_is_401() {
        let response = list_user_logins(
            Path(Uuid::new_v4().to_string()),
            Query(LoginHistoryParams {
                limit: None,
                page: None,
            }),
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(state()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
