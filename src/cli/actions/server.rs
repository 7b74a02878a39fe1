use crate::civiai::{
    self,
    state::{AppState, AuthConfig, Environment},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub jwt_secret: SecretString,
    pub client_url: String,
    pub environment: Environment,
    pub otp_ttl_seconds: i64,
    pub sms_enabled: bool,
    pub uidai_secret: SecretString,
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.client_url.clone())
            .with_environment(self.environment)
            .with_otp_ttl_seconds(self.otp_ttl_seconds)
            .with_sms_enabled(self.sms_enabled)
            .with_uidai_secret(self.uidai_secret.clone())
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing secret is missing or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    if args.uidai_secret.expose_secret().is_empty() {
        warn!("UIDAI secret is empty; eKYC request hashes are unsalted");
    }

    let state = AppState::new(args.auth_config(), args.jwt_secret)
        .context("Refusing to start")?;

    civiai::new(args.port, Arc::new(state)).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("environment", args.environment.to_string()),
        ("client_url", args.client_url.clone()),
        ("otp_ttl_seconds", args.otp_ttl_seconds.to_string()),
        ("sms_enabled", args.sms_enabled.to_string()),
        (
            "jwt_secret_set",
            (!args.jwt_secret.expose_secret().trim().is_empty()).to_string(),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
