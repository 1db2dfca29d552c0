//! Auth state and configuration.

use secrecy::{ExposeSecret, SecretString};

use super::utils::normalize_email;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    admin_email: Option<String>,
    session_secret: SecretString,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, session_secret: SecretString) -> Self {
        Self {
            frontend_base_url,
            admin_email: None,
            session_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    /// Designate the platform administrator identity.
    ///
    /// The email is normalized so the comparison at sign-in is case-insensitive.
    #[must_use]
    pub fn with_admin_email(mut self, email: Option<String>) -> Self {
        self.admin_email = email
            .map(|email| normalize_email(&email))
            .filter(|email| !email.is_empty());
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    /// Admin status is derived from the configured identity, not the stored role.
    pub(crate) fn is_admin_email(&self, email_normalized: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin == email_normalized)
    }

    pub(crate) fn session_secret_bytes(&self) -> &[u8] {
        self.session_secret.expose_secret().as_bytes()
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
