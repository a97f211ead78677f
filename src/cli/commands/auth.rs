use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_ACCESS_TOKEN_TTL_SECONDS: &str = "access-token-ttl-seconds";
pub const ARG_VERIFY_TOKEN_TTL_SECONDS: &str = "verify-token-ttl-seconds";
pub const ARG_RESET_TOKEN_TTL_SECONDS: &str = "reset-token-ttl-seconds";
pub const ARG_REFRESH_TOKEN_TTL_SECONDS: &str = "refresh-token-ttl-seconds";
pub const ARG_REFRESH_REMEMBER_TTL_SECONDS: &str = "refresh-remember-ttl-seconds";

const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Options {
    pub frontend_base_url: String,
    pub jwt_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub verify_token_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub refresh_remember_ttl_seconds: i64,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let jwt_secret = matches.get_one::<String>(ARG_JWT_SECRET).cloned();
        let jwt_secret = match jwt_secret {
            Some(value) if !value.trim().is_empty() => SecretString::from(value),
            _ => anyhow::bail!("missing required argument: --{ARG_JWT_SECRET}"),
        };

        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FRONTEND_BASE_URL.to_string());

        // TTL args carry clap defaults, so the fallbacks only restate them
        let ttl = |id: &str, default: i64| matches.get_one::<i64>(id).copied().unwrap_or(default);

        Ok(Self {
            frontend_base_url,
            jwt_secret,
            access_token_ttl_seconds: ttl(ARG_ACCESS_TOKEN_TTL_SECONDS, 3600),
            verify_token_ttl_seconds: ttl(ARG_VERIFY_TOKEN_TTL_SECONDS, 3600),
            reset_token_ttl_seconds: ttl(ARG_RESET_TOKEN_TTL_SECONDS, 900),
            refresh_token_ttl_seconds: ttl(ARG_REFRESH_TOKEN_TTL_SECONDS, 604_800),
            refresh_remember_ttl_seconds: ttl(ARG_REFRESH_REMEMBER_TTL_SECONDS, 2_592_000),
        })
    }
}

pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    with_link_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign and verify access tokens")
                .env("ATESTI_JWT_SECRET"),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .long(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .help("Access token TTL in seconds")
                .env("ATESTI_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .long(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .help("Refresh token TTL in seconds")
                .env("ATESTI_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_REMEMBER_TTL_SECONDS)
                .long(ARG_REFRESH_REMEMBER_TTL_SECONDS)
                .help("Refresh token TTL in seconds when remember is requested")
                .env("ATESTI_REFRESH_REMEMBER_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_link_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for verification and reset links")
                .env("ATESTI_FRONTEND_BASE_URL")
                .default_value(DEFAULT_FRONTEND_BASE_URL),
        )
        .arg(
            Arg::new(ARG_VERIFY_TOKEN_TTL_SECONDS)
                .long(ARG_VERIFY_TOKEN_TTL_SECONDS)
                .help("Email verification token TTL in seconds")
                .env("ATESTI_VERIFY_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_RESET_TOKEN_TTL_SECONDS)
                .long(ARG_RESET_TOKEN_TTL_SECONDS)
                .help("Password reset token TTL in seconds")
                .env("ATESTI_RESET_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
}
