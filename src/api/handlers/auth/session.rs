//! Session rehydration endpoints and cookie plumbing.
//!
//! Every request rebuilds its session view by decoding the signed token from
//! the cookie (or a bearer header). There is no database read on this path;
//! the explicit tenant-info endpoint exists for callers that need live data.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::claims::{rehydrate_session, SessionView};
use super::state::{AuthConfig, AuthState};
use super::token::{decode_session_token, now_unix_seconds, TokenError, TokenPayload};

const SESSION_COOKIE_NAME: &str = "foyer_session";

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionView),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    match authenticate_session(&headers, auth_state.config()) {
        Some(payload) => (StatusCode::OK, Json(rehydrate_session(&payload))).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // The token is self-contained, so logout is just clearing the cookie.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

/// Decode the presented token into its payload, if any.
///
/// Missing, malformed, tampered, and expired tokens all read as "no session";
/// none of them is an application error.
pub(crate) fn authenticate_session(
    headers: &HeaderMap,
    config: &AuthConfig,
) -> Option<TokenPayload> {
    let token = extract_session_token(headers)?;
    match decode_session_token(&token, config.session_secret_bytes(), now_unix_seconds()) {
        Ok(payload) => Some(payload),
        Err(TokenError::Malformed | TokenError::InvalidSignature | TokenError::Expired) => None,
    }
}

/// Resolve the session token or return 401 for protected handlers.
pub(crate) fn require_session(
    headers: &HeaderMap,
    config: &AuthConfig,
) -> Result<TokenPayload, StatusCode> {
    authenticate_session(headers, config).ok_or(StatusCode::UNAUTHORIZED)
}

/// Build a secure `HttpOnly` cookie carrying the session token.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    // Only mark cookies secure when the frontend is served over HTTPS.
    let secure = config.session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::claims::SessionClaims;
    use crate::api::handlers::auth::token::encode_session_token;
    use crate::api::handlers::auth::types::Role;
    use secrecy::SecretString;
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig::new(
            "https://foyer.dev".to_string(),
            SecretString::from("test-secret".to_string()),
        )
    }

    fn signed_token(config: &AuthConfig, exp_offset: i64) -> String {
        let payload = TokenPayload {
            claims: SessionClaims {
                user_id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                role: Role::Retailer,
                tenant_slug: "jane".to_string(),
                is_admin: false,
            },
            name: None,
            email: Some("jane@example.com".to_string()),
            image: None,
            exp: now_unix_seconds() + exp_offset,
        };
        match encode_session_token(&payload, config.session_secret_bytes()) {
            Ok(token) => token,
            Err(err) => panic!("token must encode: {err}"),
        }
    }

    #[test]
    fn cookie_token_is_accepted() {
        let config = config();
        let token = signed_token(&config, 3600);
        let mut headers = HeaderMap::new();
        let cookie = format!("other=1; {SESSION_COOKIE_NAME}={token}");
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&cookie).expect("cookie header"),
        );

        assert!(authenticate_session(&headers, &config).is_some());
    }

    #[test]
    fn bearer_token_is_accepted() {
        let config = config();
        let token = signed_token(&config, 3600);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("auth header"),
        );

        assert!(authenticate_session(&headers, &config).is_some());
    }

    #[test]
    fn expired_token_reads_as_no_session() {
        let config = config();
        let token = signed_token(&config, -10);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("auth header"),
        );

        assert!(authenticate_session(&headers, &config).is_none());
        assert_eq!(
            require_session(&headers, &config).err(),
            Some(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let config = config();
        let headers = HeaderMap::new();
        assert_eq!(
            require_session(&headers, &config).err(),
            Some(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn session_cookie_flags() {
        let config = config();
        let cookie = session_cookie(&config, "tok");
        let Ok(cookie) = cookie else {
            panic!("cookie must build");
        };
        let Ok(value) = cookie.to_str() else {
            panic!("cookie must be ascii");
        };
        assert!(value.starts_with("foyer_session=tok"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Secure"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let config = config();
        let Ok(cookie) = clear_session_cookie(&config) else {
            panic!("cookie must build");
        };
        let Ok(value) = cookie.to_str() else {
            panic!("cookie must be ascii");
        };
        assert!(value.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn session_endpoint_rehydrates_without_database() {
        let config = config();
        let token = signed_token(&config, 3600);
        let state = Arc::new(AuthState::new(config));

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("auth header"),
        );

        let response = session(headers, Extension(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = session(HeaderMap::new(), Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn logout_always_clears_cookie() {
        let state = Arc::new(AuthState::new(config()));
        let response = logout(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(SET_COOKIE).is_some());
    }
}
