use crate::api;
use crate::credential::AuthConfig;
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub jwt_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub verify_token_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub refresh_remember_ttl_seconds: i64,
    pub resend_api_key: Option<SecretString>,
    pub email_from: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the credential store cannot be reached or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.frontend_base_url, args.jwt_secret)
        .with_access_token_ttl_seconds(args.access_token_ttl_seconds)
        .with_verify_token_ttl_seconds(args.verify_token_ttl_seconds)
        .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds)
        .with_refresh_token_ttl_seconds(args.refresh_token_ttl_seconds)
        .with_refresh_remember_ttl_seconds(args.refresh_remember_ttl_seconds);

    let mut email_config = api::email::EmailConfig::new().with_from_address(args.email_from);
    if let Some(api_key) = args.resend_api_key {
        email_config = email_config.with_resend_api_key(api_key);
    }

    api::new(args.port, args.dsn, auth_config, email_config).await
}
