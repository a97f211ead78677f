use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_RESEND_API_KEY: &str = "resend-api-key";
pub const ARG_EMAIL_FROM: &str = "email-from";

const DEFAULT_EMAIL_FROM: &str = "Atesti <onboarding@resend.dev>";

#[derive(Debug, Clone)]
pub struct Options {
    pub resend_api_key: Option<SecretString>,
    pub from_address: String,
}

impl Options {
    /// Parse email arguments from matches.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        // Empty strings slip through when env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        Self {
            resend_api_key: get_non_empty(ARG_RESEND_API_KEY).map(SecretString::from),
            from_address: get_non_empty(ARG_EMAIL_FROM)
                .unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_RESEND_API_KEY)
                .long(ARG_RESEND_API_KEY)
                .help("Resend API key; without it emails are logged instead of sent")
                .env("ATESTI_RESEND_API_KEY"),
        )
        .arg(
            Arg::new(ARG_EMAIL_FROM)
                .long(ARG_EMAIL_FROM)
                .help("From address for verification and reset emails")
                .env("ATESTI_EMAIL_FROM")
                .default_value(DEFAULT_EMAIL_FROM),
        )
}
