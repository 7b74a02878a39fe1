//! Service configuration and the shared state handed to handlers.

use axum::response::{IntoResponse, Response};
use chrono::Duration;
use secrecy::SecretString;
use std::{fmt, str::FromStr, sync::Arc};

use super::{
    ekyc::{MockUidai, UidaiClient},
    error::ApiError,
    identity::IdentityStore,
    notify::{LogOtpSender, OtpSender},
    otp::{OtpStore, DEFAULT_OTP_TTL_SECONDS, MAX_OTP_TTL_SECONDS},
    session::{SessionError, SessionIssuer},
};

const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    client_url: String,
    environment: Environment,
    otp_ttl_seconds: i64,
    sms_enabled: bool,
    uidai_secret: SecretString,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_URL.to_string())
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new(client_url: String) -> Self {
        Self {
            client_url,
            environment: Environment::Development,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            sms_enabled: false,
            uidai_secret: SecretString::from(String::new()),
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Values outside `1..=MAX_OTP_TTL_SECONDS` are clamped.
    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: i64) -> Self {
        self.otp_ttl_seconds = seconds.clamp(1, MAX_OTP_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_sms_enabled(mut self, enabled: bool) -> Self {
        self.sms_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_uidai_secret(mut self, secret: SecretString) -> Self {
        self.uidai_secret = secret;
        self
    }

    #[must_use]
    pub fn client_url(&self) -> &str {
        &self.client_url
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn otp_ttl_seconds(&self) -> i64 {
        self.otp_ttl_seconds
    }

    #[must_use]
    pub fn sms_enabled(&self) -> bool {
        self.sms_enabled
    }

    pub(crate) fn uidai_secret(&self) -> &SecretString {
        &self.uidai_secret
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.environment == Environment::Production
    }

    pub(crate) fn expose_error_detail(&self) -> bool {
        self.environment != Environment::Production
    }
}

/// Everything a request handler needs, owned in one place.
pub struct AppState {
    config: AuthConfig,
    otps: OtpStore,
    identities: IdentityStore,
    sessions: SessionIssuer,
    sender: Arc<dyn OtpSender>,
    uidai: Arc<dyn UidaiClient>,
}

impl AppState {
    /// Build state with the logging sender and the mock UIDAI client.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if the signing secret is empty.
    pub fn new(config: AuthConfig, jwt_secret: SecretString) -> Result<Self, SessionError> {
        let sender = Arc::new(LogOtpSender::new(config.sms_enabled()));
        Self::with_clients(config, jwt_secret, sender, Arc::new(MockUidai))
    }

    /// # Errors
    /// Returns `SessionError::Configuration` if the signing secret is empty.
    pub fn with_clients(
        config: AuthConfig,
        jwt_secret: SecretString,
        sender: Arc<dyn OtpSender>,
        uidai: Arc<dyn UidaiClient>,
    ) -> Result<Self, SessionError> {
        let sessions = SessionIssuer::new(jwt_secret)?;
        let otps = OtpStore::new(Duration::seconds(config.otp_ttl_seconds()));
        Ok(Self {
            config,
            otps,
            identities: IdentityStore::new(),
            sessions,
            sender,
            uidai,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn otps(&self) -> &OtpStore {
        &self.otps
    }

    #[must_use]
    pub fn identities(&self) -> &IdentityStore {
        &self.identities
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    pub(crate) fn sender(&self) -> &dyn OtpSender {
        self.sender.as_ref()
    }

    pub(crate) fn uidai(&self) -> &dyn UidaiClient {
        self.uidai.as_ref()
    }

    /// Turn a handler result into a response, rendering errors in the JSON envelope.
    pub(crate) fn respond<T: IntoResponse>(&self, result: Result<T, ApiError>) -> Response {
        match result {
            Ok(value) => value.into_response(),
            Err(err) => err.into_envelope(self.config.expose_error_detail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::default();
        assert_eq!(config.client_url(), DEFAULT_CLIENT_URL);
        assert_eq!(config.environment(), Environment::Development);
        assert_eq!(config.otp_ttl_seconds(), DEFAULT_OTP_TTL_SECONDS);
        assert!(!config.sms_enabled());
        assert!(!config.session_cookie_secure());
        assert!(config.expose_error_detail());
        assert_eq!(config.uidai_secret().expose_secret(), "");

        let config = AuthConfig::new("https://civiai.gov.in".to_string())
            .with_environment(Environment::Production)
            .with_otp_ttl_seconds(120)
            .with_sms_enabled(true)
            .with_uidai_secret(SecretString::from("uidai".to_string()));

        assert_eq!(config.client_url(), "https://civiai.gov.in");
        assert_eq!(config.otp_ttl_seconds(), 120);
        assert!(config.sms_enabled());
        assert!(config.session_cookie_secure());
        assert!(!config.expose_error_detail());
        assert_eq!(config.uidai_secret().expose_secret(), "uidai");
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn app_state_requires_signing_secret() {
        let result = AppState::new(AuthConfig::default(), SecretString::from(String::new()));
        assert!(matches!(result, Err(SessionError::Configuration)));
    }

    #[test]
    fn app_state_uses_configured_otp_ttl() -> Result<(), SessionError> {
        let state = AppState::new(
            AuthConfig::default().with_otp_ttl_seconds(90),
            SecretString::from("secret".to_string()),
        )?;
        assert_eq!(state.otps().ttl(), Duration::seconds(90));
        Ok(())
    }

    #[test]
    fn otp_ttl_is_clamped_to_one_day() -> Result<(), SessionError> {
        let config = AuthConfig::default().with_otp_ttl_seconds(i64::MAX);
        assert_eq!(config.otp_ttl_seconds(), MAX_OTP_TTL_SECONDS);
        assert_eq!(AuthConfig::default().with_otp_ttl_seconds(0).otp_ttl_seconds(), 1);

        let state = AppState::new(config, SecretString::from("secret".to_string()))?;
        assert_eq!(state.otps().ttl(), Duration::days(1));
        Ok(())
    }
}
