//! Sign-in handshake, session rehydration, and login recording.
//!
//! The sign-in handshake consumes a verified external identity, provisions
//! the user and its owning tenant, and bakes the result into a signed session
//! token. Every later request rehydrates its session by decoding that token;
//! the database is only consulted again by the explicit tenant-info lookup.
//!
//! Flow Overview:
//! 1) Provider callback posts the verified identity to `/v1/auth/signin`.
//! 2) The provisioning resolver creates or finds the user, tenant, and
//!    primary membership, relying on the store's uniqueness constraints for
//!    correctness under concurrent first sign-ins.
//! 3) Claims are projected once, signed, and set as an `HttpOnly` cookie.
//! 4) A detached task appends a login event; its failure never surfaces.

pub(crate) mod claims;
pub(crate) mod events;
pub(crate) mod session;
pub(crate) mod signin;
mod state;
mod storage;
pub(crate) mod tenant_info;
mod token;
pub(crate) mod types;
mod utils;

pub use self::state::{AuthConfig, AuthState};

/// Identity providers whose callbacks are accepted by the handshake.
const SUPPORTED_PROVIDERS: &[&str] = &["google"];

/// Fixed tenant identity for the designated platform administrator.
const ADMIN_TENANT_NAME: &str = "Foyer Admin";
const ADMIN_TENANT_SLUG: &str = "foyer-admin";

/// Attempt budget for suffixing a colliding tenant slug.
const SLUG_MAX_ATTEMPTS: usize = 5;
