//! Request-level access gate.
//!
//! Per-path policy for the HTTP surface: the sign-in page and API-prefixed
//! paths are always allowed through, the root path is public for both session
//! states, and any other path without a valid session is redirected to
//! sign-in. Already-authenticated requests to the sign-in path bounce home.
//!
//! The decision is a pure function over `(path, authenticated)` so the policy
//! stays testable without a router.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::handlers::auth::{session::authenticate_session, AuthState};

pub(crate) const SIGNIN_PATH: &str = "/signin";
pub(crate) const HOME_PATH: &str = "/";

/// Prefixes that bypass the gate; API handlers do their own auth and answer
/// with status codes instead of redirects.
const OPEN_PREFIXES: &[&str] = &["/v1", "/health", "/swagger-ui", "/api-docs"];

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum GateDecision {
    Allow,
    RedirectToSignin,
    RedirectToHome,
}

pub(crate) fn decide(path: &str, authenticated: bool) -> GateDecision {
    if path.starts_with(SIGNIN_PATH) {
        return if authenticated {
            GateDecision::RedirectToHome
        } else {
            GateDecision::Allow
        };
    }

    // The root path is public for both authenticated and unauthenticated
    // visitors.
    if path == HOME_PATH {
        return GateDecision::Allow;
    }

    if OPEN_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return GateDecision::Allow;
    }

    if authenticated {
        GateDecision::Allow
    } else {
        GateDecision::RedirectToSignin
    }
}

/// Axum middleware applying [`decide`] to every request.
pub(crate) async fn access_gate(request: Request, next: Next) -> Response {
    let authenticated = request
        .extensions()
        .get::<Arc<AuthState>>()
        .is_some_and(|state| authenticate_session(request.headers(), state.config()).is_some());

    match decide(request.uri().path(), authenticated) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectToSignin => Redirect::temporary(SIGNIN_PATH).into_response(),
        GateDecision::RedirectToHome => Redirect::temporary(HOME_PATH).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signin_path_is_public_until_authenticated() {
        assert_eq!(decide("/signin", false), GateDecision::Allow);
        assert_eq!(decide("/signin/callback", false), GateDecision::Allow);
        assert_eq!(decide("/signin", true), GateDecision::RedirectToHome);
    }

    #[test]
    fn root_is_public_for_both_states() {
        assert_eq!(decide("/", false), GateDecision::Allow);
        assert_eq!(decide("/", true), GateDecision::Allow);
    }

    #[test]
    fn api_paths_bypass_the_gate() {
        assert_eq!(decide("/v1/auth/session", false), GateDecision::Allow);
        assert_eq!(decide("/health", false), GateDecision::Allow);
        assert_eq!(decide("/swagger-ui/index.html", false), GateDecision::Allow);
    }

    #[test]
    fn other_paths_require_a_session() {
        assert_eq!(decide("/dashboard", false), GateDecision::RedirectToSignin);
        assert_eq!(decide("/dashboard", true), GateDecision::Allow);
        assert_eq!(decide("/settings/profile", false), GateDecision::RedirectToSignin);
    }
}
