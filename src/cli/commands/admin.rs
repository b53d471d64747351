use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const CMD_CREATE_ADMIN: &str = "create-admin";
pub const ARG_ADMIN_EMAIL: &str = "email";
pub const ARG_ADMIN_PASSWORD: &str = "password";
pub const ARG_ADMIN_NAME: &str = "name";

#[must_use]
pub fn command() -> Command {
    Command::new(CMD_CREATE_ADMIN)
        .about("Seed or promote the admin account and exit")
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Admin email address")
                .env("MELODYMART_ADMIN_EMAIL")
                .default_value("admin@melodymart.com"),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Admin password")
                .env("MELODYMART_ADMIN_PASSWORD")
                .required(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_NAME)
                .long(ARG_ADMIN_NAME)
                .help("Admin display name")
                .env("MELODYMART_ADMIN_NAME")
                .default_value("Admin User"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Options {
    /// Extract bootstrap options from the subcommand matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let email = matches
            .get_one::<String>(ARG_ADMIN_EMAIL)
            .cloned()
            .context("missing required argument: --email")?;
        let password = matches
            .get_one::<String>(ARG_ADMIN_PASSWORD)
            .cloned()
            .context("missing required argument: --password")?;
        let name = matches
            .get_one::<String>(ARG_ADMIN_NAME)
            .cloned()
            .context("missing required argument: --name")?;

        Ok(Self {
            email,
            password,
            name,
        })
    }
}
