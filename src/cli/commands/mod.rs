pub mod auth;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("civiai")
        .about("CiviAI OTP login and session service")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("3001")
                .env("CIVIAI_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civiai::state::Environment;
    use anyhow::Result;
    use secrecy::ExposeSecret;

    const ENV_VARS: [&str; 8] = [
        "CIVIAI_PORT",
        "CIVIAI_JWT_SECRET",
        "CIVIAI_CLIENT_URL",
        "CIVIAI_ENV",
        "CIVIAI_OTP_TTL_SECONDS",
        "CIVIAI_SMS_ENABLED",
        "CIVIAI_UIDAI_SECRET",
        "CIVIAI_LOG_LEVEL",
    ];

    fn clean_env<F: FnOnce()>(f: F) {
        temp_env::with_vars(ENV_VARS.map(|key| (key, None::<&str>)), f);
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "civiai");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("CiviAI OTP login and session service".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        clean_env(|| {
            let matches = new().get_matches_from(vec!["civiai"]);
            assert_eq!(matches.get_one::<u16>("port").copied(), Some(3001));
            assert_eq!(
                matches
                    .get_one::<String>(auth::ARG_CLIENT_URL)
                    .map(String::as_str),
                Some("http://localhost:5173")
            );
            assert_eq!(
                matches.get_one::<i64>(auth::ARG_OTP_TTL_SECONDS).copied(),
                Some(600)
            );
            assert!(!matches.get_flag(auth::ARG_SMS_ENABLED));
            assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(0));
        });
    }

    #[test]
    fn test_check_args() -> Result<()> {
        let matches = new().try_get_matches_from(vec![
            "civiai",
            "--port",
            "8080",
            "--jwt-secret",
            "s3cr3t",
            "--client-url",
            "https://civiai.gov.in",
            "--environment",
            "production",
            "--otp-ttl-seconds",
            "120",
            "--sms-enabled",
            "--uidai-secret",
            "uidai",
        ])?;

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(8080));

        let options = auth::Options::parse(&matches)?;
        assert_eq!(options.jwt_secret.expose_secret(), "s3cr3t");
        assert_eq!(options.client_url, "https://civiai.gov.in");
        assert_eq!(options.environment, Environment::Production);
        assert_eq!(options.otp_ttl_seconds, 120);
        assert!(options.sms_enabled);
        assert_eq!(options.uidai_secret.expose_secret(), "uidai");
        Ok(())
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("CIVIAI_PORT", Some("443")),
                ("CIVIAI_JWT_SECRET", Some("from-env")),
                ("CIVIAI_ENV", Some("prod")),
                ("CIVIAI_OTP_TTL_SECONDS", Some("300")),
                ("CIVIAI_SMS_ENABLED", Some("true")),
                ("CIVIAI_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["civiai"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(443));
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));

                let options = auth::Options::parse(&matches);
                assert!(options.is_ok());
                if let Ok(options) = options {
                    assert_eq!(options.jwt_secret.expose_secret(), "from-env");
                    assert_eq!(options.environment, Environment::Production);
                    assert_eq!(options.otp_ttl_seconds, 300);
                    assert!(options.sms_enabled);
                }
            },
        );
    }

    #[test]
    fn test_rejects_unknown_environment() {
        clean_env(|| {
            let matches =
                new().get_matches_from(vec!["civiai", "--environment", "staging"]);
            assert!(auth::Options::parse(&matches).is_err());
        });
    }

    #[test]
    fn test_rejects_zero_ttl() {
        clean_env(|| {
            let matches = new().get_matches_from(vec!["civiai", "--otp-ttl-seconds", "0"]);
            assert!(auth::Options::parse(&matches).is_err());
        });
    }

    #[test]
    fn test_rejects_oversized_ttl() {
        clean_env(|| {
            let matches = new().get_matches_from(vec!["civiai", "--otp-ttl-seconds", "86401"]);
            assert!(auth::Options::parse(&matches).is_err());

            let matches = new().get_matches_from(vec![
                "civiai",
                "--otp-ttl-seconds",
                i64::MAX.to_string().as_str(),
            ]);
            assert!(auth::Options::parse(&matches).is_err());

            let matches = new().get_matches_from(vec!["civiai", "--otp-ttl-seconds", "86400"]);
            let options = auth::Options::parse(&matches);
            assert!(options.is_ok_and(|options| options.otp_ttl_seconds == 86_400));
        });
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("CIVIAI_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["civiai"]);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5_usize {
            temp_env::with_vars([("CIVIAI_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["civiai".to_string()];

                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
