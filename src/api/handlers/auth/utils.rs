//! Small helpers for identity validation, slug derivation, and conflict detection.

use regex::Regex;

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Return the local part of an email (everything before the first `@`).
pub(crate) fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Derive a URL-safe tenant slug from an email local-part.
///
/// Every character outside `[a-zA-Z0-9]` becomes `-`; case is preserved.
pub(crate) fn slugify(local_part: &str) -> String {
    local_part
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
        .collect()
}

/// Append a numeric suffix to a slug to resolve a uniqueness conflict.
pub(crate) fn slug_with_suffix(base: &str, suffix: usize) -> String {
    format!("{base}-{suffix}")
}

/// Returns `true` when `err` is a database unique-violation (SQLSTATE `23505`).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Returns `true` when `err` is a unique-violation on the named constraint.
pub(crate) fn is_unique_violation_on(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().is_some_and(|code| code.as_ref() == "23505")
                && db_err.constraint().is_some_and(|name| name == constraint)
        }
        _ => false,
    }
}

/// Extract a client IP from common proxy headers.
///
/// Precedence: first hop of `x-forwarded-for`, then `x-real-ip`, then
/// `cf-connecting-ip`.
pub(crate) fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if real_ip.is_some() {
        return real_ip.map(str::to_string);
    }
    headers
        .get("cf-connecting-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
