//! Map parsed CLI arguments to the action the binary executes.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::auth;
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if arguments are inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(3001);
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        jwt_secret: auth_opts.jwt_secret,
        client_url: auth_opts.client_url,
        environment: auth_opts.environment,
        otp_ttl_seconds: auth_opts.otp_ttl_seconds,
        sms_enabled: auth_opts.sms_enabled,
        uidai_secret: auth_opts.uidai_secret,
    }))
}
