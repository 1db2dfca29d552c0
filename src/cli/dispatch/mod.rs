//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::auth;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let frontend_base_url = matches
        .get_one::<String>(auth::ARG_FRONTEND_BASE_URL)
        .cloned()
        .context("missing required argument: --frontend-base-url")?;

    let session_secret = matches
        .get_one::<String>(auth::ARG_SESSION_SECRET)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --session-secret")?;

    let session_ttl_seconds = matches
        .get_one::<i64>(auth::ARG_SESSION_TTL_SECONDS)
        .copied()
        .unwrap_or(604_800);

    let admin_email = matches.get_one::<String>(auth::ARG_ADMIN_EMAIL).cloned();

    Ok(Action::Server(Args {
        port,
        dsn,
        frontend_base_url,
        admin_email,
        session_secret,
        session_ttl_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn server_args_from_matches() {
        temp_env::with_vars(
            [
                ("FOYER_SESSION_SECRET", None::<&str>),
                ("FOYER_ADMIN_EMAIL", None::<&str>),
                ("FOYER_PORT", None::<&str>),
                ("FOYER_FRONTEND_BASE_URL", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "foyer",
                    "--dsn",
                    "postgres://user@localhost:5432/foyer",
                    "--session-secret",
                    "sekret",
                    "--admin-email",
                    "root@foyer.dev",
                ]);
                let action = handler(&matches);
                assert!(action.is_ok());
                if let Ok(Action::Server(args)) = action {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.dsn, "postgres://user@localhost:5432/foyer");
                    assert_eq!(args.frontend_base_url, "https://foyer.dev");
                    assert_eq!(args.admin_email.as_deref(), Some("root@foyer.dev"));
                    assert_eq!(args.session_secret.expose_secret(), "sekret");
                    assert_eq!(args.session_ttl_seconds, 604_800);
                }
            },
        );
    }
}
