//! Sign-in handshake.
//!
//! Flow Overview:
//! 1) Gate on a supported provider asserting a verified email.
//! 2) Resolve-or-create the user, then its primary tenant and membership.
//! 3) Build session claims, sign the token, and set the session cookie.
//! 4) Set the row-level-security context (best-effort) and detach a login
//!    recording task.
//!
//! Provisioning failures deny the sign-in (fail closed); only the audit write
//! and the RLS context call are allowed to fail quietly.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use super::claims::{build_claims, rehydrate_session, SessionView};
use super::events::{spawn_login_recorder, RequestMeta};
use super::session::session_cookie;
use super::state::AuthState;
use super::storage::{resolve_tenant_for_user, resolve_user, set_session_context};
use super::token::{encode_session_token, now_unix_seconds, TokenPayload};
use super::types::SigninRequest;
use super::utils::{normalize_email, valid_email};
use super::SUPPORTED_PROVIDERS;

#[utoipa::path(
    post,
    path = "/v1/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Session established.", body = SessionView),
        (status = 401, description = "Unsupported provider or missing verified email."),
        (status = 404, description = "Primary tenant exists but is deactivated."),
        (status = 500, description = "Provisioning failed; sign-in denied."),
    ),
    tag = "auth"
)]
/// Consumes a verified provider callback and establishes a session.
/// On first sign-in this provisions the user and its owning tenant; repeat
/// sign-ins resolve the existing rows. The response carries the session view
/// and a `Set-Cookie` header with the signed token.
pub async fn signin(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Json(payload): Json<SigninRequest>,
) -> impl IntoResponse {
    if !SUPPORTED_PROVIDERS.contains(&payload.provider.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let email = payload
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|email| valid_email(email));
    let Some(email) = email else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let config = auth_state.config();

    let user = match resolve_user(&pool, &email, payload.name.as_deref()).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    let (tenant, membership) = match resolve_tenant_for_user(&pool, &user, config).await {
        Ok(pair) => pair,
        Err(err) => return err.into_response(),
    };

    let claims = build_claims(&user, &tenant, &membership, config);
    let token_payload = TokenPayload {
        claims,
        name: payload.name,
        email: Some(user.email.clone()),
        image: payload.image,
        exp: now_unix_seconds() + config.session_ttl_seconds(),
    };

    let token = match encode_session_token(&token_payload, config.session_secret_bytes()) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to encode session token: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Best-effort row-level-security context; the response must not depend on it.
    if let Err(err) = set_session_context(&pool, tenant.id, user.id).await {
        warn!("Failed to set session context: {err}");
    }

    spawn_login_recorder(
        pool.0.clone(),
        user.id,
        Some(tenant.id),
        RequestMeta::from_headers(&headers),
    );

    let mut response_headers = HeaderMap::new();
    match session_cookie(config, &token) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    (
        StatusCode::OK,
        response_headers,
        Json(rehydrate_session(&token_payload)),
    )
        .into_response()
}
