use crate::api;
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub admin_email: Option<String>,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config =
        api::handlers::auth::AuthConfig::new(args.frontend_base_url, args.session_secret)
            .with_session_ttl_seconds(args.session_ttl_seconds)
            .with_admin_email(args.admin_email);

    api::new(args.port, args.dsn, auth_config).await
}
