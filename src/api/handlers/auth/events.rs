//! Best-effort login event recording.
//!
//! Sign-in and the track-login endpoint append one `login_events` row with
//! request metadata. The write runs on a detached task whose outcome is never
//! awaited by the critical path: a failure is logged and swallowed, so audit
//! trouble can never block authentication.

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, Instrument};
use uuid::Uuid;

use super::session::require_session;
use super::state::AuthState;
use super::types::{ErrorResponse, TrackLoginResponse};
use super::utils::extract_client_ip;

const MOBILE_TOKENS: &[&str] = &["Mobile", "Android", "iPhone", "iPad"];

/// Request metadata captured before the recording task detaches.
#[derive(Clone, Debug, Default)]
pub(crate) struct RequestMeta {
    pub(crate) login_ip: Option<String>,
    pub(crate) user_agent: Option<String>,
}

impl RequestMeta {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            login_ip: extract_client_ip(headers),
            user_agent: headers
                .get("user-agent")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Coarse device classification derived from the user-agent string.
#[derive(Debug, Eq, PartialEq, Serialize)]
pub(crate) struct DeviceInfo {
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub(crate) user_agent: Option<String>,
    #[serde(rename = "isMobile")]
    pub(crate) is_mobile: bool,
    pub(crate) browser: &'static str,
}

impl DeviceInfo {
    pub(crate) fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return Self {
                user_agent: None,
                is_mobile: false,
                browser: "Unknown",
            };
        };
        // Chrome ships "Safari" in its user-agent, so the precedence matters.
        let browser = if ua.contains("Chrome") {
            "Chrome"
        } else if ua.contains("Firefox") {
            "Firefox"
        } else if ua.contains("Safari") {
            "Safari"
        } else {
            "Unknown"
        };
        Self {
            user_agent: Some(ua.to_string()),
            is_mobile: MOBILE_TOKENS.iter().any(|token| ua.contains(token)),
            browser,
        }
    }
}

/// Spawn a detached task that records one login event.
///
/// The handle is returned for tests; production callers drop it.
pub(crate) fn spawn_login_recorder(
    pool: PgPool,
    user_id: Uuid,
    tenant_id: Option<Uuid>,
    meta: RequestMeta,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        record_login(&pool, user_id, tenant_id, meta).await;
    })
}

/// Append a login event, swallowing any failure.
pub(crate) async fn record_login(
    pool: &PgPool,
    user_id: Uuid,
    tenant_id: Option<Uuid>,
    meta: RequestMeta,
) {
    if let Err(err) = insert_login_event(pool, user_id, tenant_id, &meta).await {
        // Audit failures are logged only; authentication already succeeded.
        error!("Failed to record login event: {err:#}");
    }
}

async fn insert_login_event(
    pool: &PgPool,
    user_id: Uuid,
    tenant_id: Option<Uuid>,
    meta: &RequestMeta,
) -> Result<Uuid> {
    let device_info = DeviceInfo::from_user_agent(meta.user_agent.as_deref());
    let device_json =
        serde_json::to_string(&device_info).context("failed to serialize device info")?;

    // The event id doubles as the session correlation id.
    let event_id = Uuid::new_v4();

    let query = r"
        INSERT INTO login_events
            (id, user_id, tenant_id, login_ip, user_agent, device_info, location, success, session_id)
        VALUES ($1, $2, $3, $4, $5, $6::jsonb, '{}'::jsonb, TRUE, $1)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(event_id)
        .bind(user_id)
        .bind(tenant_id)
        .bind(meta.login_ip.as_deref())
        .bind(meta.user_agent.as_deref())
        .bind(device_json)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert login event")?;

    Ok(event_id)
}

#[utoipa::path(
    post,
    path = "/v1/auth/track-login",
    responses(
        (status = 200, description = "Login event queued.", body = TrackLoginResponse),
        (status = 401, description = "Missing or invalid session token.", body = ErrorResponse),
    ),
    tag = "auth"
)]
/// Records a login event for the authenticated session.
/// The HTTP call is awaited by clients, but the write itself is detached, so
/// the response does not depend on the audit insert succeeding.
pub async fn track_login(
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

    let meta = RequestMeta::from_headers(&headers);
    spawn_login_recorder(
        pool.0.clone(),
        payload.claims.user_id,
        Some(payload.claims.tenant_id),
        meta,
    );

    (StatusCode::OK, Json(TrackLoginResponse { success: true })).into_response()
}
