//! # Foyer (Identity & Session Bootstrap)
//!
//! `foyer` is the identity and session bootstrap layer for a multi-tenant web
//! application. On first sign-in it provisions a user record and an owning
//! tenant, attaches role information to a signed session token, and records
//! login events.
//!
//! ## Tenant Model
//!
//! Every user has exactly one *primary* membership binding it to a tenant
//! with a role (`retailer`, `brand`, `admin`, or `platform`). The primary
//! membership determines the tenant and role surfaced in the session.
//!
//! - **Slug Derivation:** A new tenant's slug is derived from the owning
//!   user's email local-part; every non-alphanumeric character becomes `-`.
//!   Collisions are resolved with a numeric suffix.
//! - **Uniqueness:** Email uniqueness among active users and slug uniqueness
//!   among active tenants are enforced by partial unique indexes, so
//!   provisioning stays correct under concurrent first-sign-in attempts.
//!
//! ## Sessions
//!
//! Session claims (user id, tenant id, role, tenant slug, admin flag) are
//! computed once at sign-in, embedded in an HMAC-signed token, and rehydrated
//! on every request by decoding the token. The request hot path performs no
//! database reads.
//!
//! ## Login Recording
//!
//! Login events are appended best-effort from a detached task. A failed write
//! is logged and swallowed; it never blocks authentication.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
