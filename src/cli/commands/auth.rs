use crate::civiai::{
    otp::{DEFAULT_OTP_TTL_SECONDS, MAX_OTP_TTL_SECONDS},
    state::Environment,
};
use anyhow::anyhow;
use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_CLIENT_URL: &str = "client-url";
pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_OTP_TTL_SECONDS: &str = "otp-ttl-seconds";
pub const ARG_SMS_ENABLED: &str = "sms-enabled";
pub const ARG_UIDAI_SECRET: &str = "uidai-secret";

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub client_url: String,
    pub environment: Environment,
    pub otp_ttl_seconds: i64,
    pub sms_enabled: bool,
    pub uidai_secret: SecretString,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// A missing signing secret is not rejected here; the server refuses to
    /// start without one.
    ///
    /// # Errors
    /// Returns an error if the environment name or the code TTL is invalid.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = |id: &str| {
            SecretString::from(matches.get_one::<String>(id).cloned().unwrap_or_default())
        };

        let environment = matches
            .get_one::<String>(ARG_ENVIRONMENT)
            .map_or(Ok(Environment::default()), |value| value.parse::<Environment>())
            .map_err(|err| anyhow!(err))?;

        let otp_ttl_seconds = matches
            .get_one::<i64>(ARG_OTP_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_OTP_TTL_SECONDS);
        if otp_ttl_seconds <= 0 {
            anyhow::bail!("--{ARG_OTP_TTL_SECONDS} must be greater than zero");
        }
        if otp_ttl_seconds > MAX_OTP_TTL_SECONDS {
            anyhow::bail!("--{ARG_OTP_TTL_SECONDS} must not exceed {MAX_OTP_TTL_SECONDS}");
        }

        Ok(Self {
            jwt_secret: secret(ARG_JWT_SECRET),
            client_url: matches
                .get_one::<String>(ARG_CLIENT_URL)
                .cloned()
                .unwrap_or_default(),
            environment,
            otp_ttl_seconds,
            sms_enabled: matches.get_flag(ARG_SMS_ENABLED),
            uidai_secret: secret(ARG_UIDAI_SECRET),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign session tokens")
                .env("CIVIAI_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_CLIENT_URL)
                .long(ARG_CLIENT_URL)
                .help("Web client URL allowed by CORS")
                .env("CIVIAI_CLIENT_URL")
                .default_value("http://localhost:5173"),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment: development or production")
                .env("CIVIAI_ENV")
                .default_value("development"),
        )
        .arg(
            Arg::new(ARG_OTP_TTL_SECONDS)
                .long(ARG_OTP_TTL_SECONDS)
                .help("One-time code lifetime in seconds")
                .env("CIVIAI_OTP_TTL_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SMS_ENABLED)
                .long(ARG_SMS_ENABLED)
                .help("Allow one-time codes to be sent by SMS")
                .env("CIVIAI_SMS_ENABLED")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_UIDAI_SECRET)
                .long(ARG_UIDAI_SECRET)
                .help("Secret mixed into eKYC request hashes")
                .env("CIVIAI_UIDAI_SECRET")
                .hide_env_values(true),
        )
}
