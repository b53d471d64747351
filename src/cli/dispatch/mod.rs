//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{admin as admin_action, server, Action};
use crate::cli::commands::{admin, auth};
use anyhow::{Context, Result};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    if let Some(sub) = matches.subcommand_matches(admin::CMD_CREATE_ADMIN) {
        let options = admin::Options::parse(sub)?;
        return Ok(Action::CreateAdmin(admin_action::Args {
            dsn,
            email: options.email,
            password: options.password,
            name: options.name,
        }));
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(server::Args {
        port,
        dsn,
        google_client_id: auth_opts.google_client_id,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
    }))
}
