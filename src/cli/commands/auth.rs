use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_GOOGLE_CLIENT_ID: &str = "google-client-id";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_ID)
                .long(ARG_GOOGLE_CLIENT_ID)
                .help("Google OAuth client id used as the expected token audience")
                .env("MELODYMART_GOOGLE_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("MELODYMART_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub google_client_id: String,
    pub session_ttl_seconds: i64,
}

impl Options {
    /// Extract auth options from parsed CLI matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let google_client_id = matches
            .get_one::<String>(ARG_GOOGLE_CLIENT_ID)
            .cloned()
            .context("missing required argument: --google-client-id")?;
        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(604_800);

        Ok(Self {
            google_client_id,
            session_ttl_seconds,
        })
    }
}
