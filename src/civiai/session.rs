//! Session minting and validation.
//!
//! Sessions are self-contained `HS256` tokens. Nothing is stored
//! server-side; a token is valid while its signature checks out and `exp`
//! has not passed.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{identity::UserIdentity, jwt, otp::Channel};

pub const SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session signing secret is not configured")]
    Configuration,
    #[error("failed to sign session token")]
    Signing(#[source] jwt::Error),
    #[error("missing, malformed or expired session token")]
    Unauthenticated,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionClaims {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

pub struct SessionIssuer {
    secret: SecretString,
    ttl: Duration,
}

impl SessionIssuer {
    /// Build an issuer signing with `secret`.
    ///
    /// # Errors
    /// Returns `Configuration` if the secret is empty.
    pub fn new(secret: SecretString) -> Result<Self, SessionError> {
        if secret.expose_secret().trim().is_empty() {
            return Err(SessionError::Configuration);
        }
        Ok(Self {
            secret,
            ttl: Duration::seconds(SESSION_TTL_SECONDS),
        })
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `identity`, claiming the contact that was just verified.
    ///
    /// # Errors
    /// Returns `Signing` if the claims cannot be encoded.
    pub fn mint(
        &self,
        identity: &UserIdentity,
        channel: Channel,
        address: &str,
    ) -> Result<String, SessionError> {
        self.mint_at(identity, channel, address, Utc::now())
    }

    /// # Errors
    /// Returns `Signing` if the claims cannot be encoded.
    pub fn mint_at(
        &self,
        identity: &UserIdentity,
        channel: Channel,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let (email, phone) = match channel {
            Channel::Email => (Some(address.to_string()), None),
            Channel::Phone => (None, Some(address.to_string())),
        };
        let claims = SessionClaims {
            id: identity.id.clone(),
            email,
            phone,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jwt::encode_hs256(self.secret.expose_secret().as_bytes(), &claims)
            .map_err(SessionError::Signing)
    }

    /// Check signature and expiry of `token`.
    ///
    /// # Errors
    /// Returns `Unauthenticated` for any token that is not currently valid.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        self.validate_at(token, Utc::now())
    }

    /// # Errors
    /// Returns `Unauthenticated` for any token that is not valid at `now`.
    pub fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, SessionError> {
        let claims: SessionClaims =
            jwt::decode_hs256(self.secret.expose_secret().as_bytes(), token).map_err(|err| {
                debug!("rejected session token: {err}");
                SessionError::Unauthenticated
            })?;

        if now.timestamp() >= claims.exp {
            debug!(user_id = %claims.id, "session token expired");
            return Err(SessionError::Unauthenticated);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> Result<SessionIssuer, SessionError> {
        SessionIssuer::new(SecretString::from("test-secret".to_string()))
    }

    fn identity() -> UserIdentity {
        UserIdentity {
            id: "01HZX".to_string(),
            email: Some("a@b.com".to_string()),
            ..UserIdentity::default()
        }
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let result = SessionIssuer::new(SecretString::from(String::new()));
        assert!(matches!(result, Err(SessionError::Configuration)));
        let result = SessionIssuer::new(SecretString::from("  ".to_string()));
        assert!(matches!(result, Err(SessionError::Configuration)));
    }

    #[test]
    fn minted_token_validates_before_expiry() -> Result<(), SessionError> {
        let issuer = issuer()?;
        let now = Utc::now();
        let token = issuer.mint_at(&identity(), Channel::Email, "a@b.com", now)?;

        let claims = issuer.validate_at(&token, now + Duration::days(6))?;
        assert_eq!(claims.id, "01HZX");
        assert_eq!(claims.email.as_deref(), Some("a@b.com"));
        assert_eq!(claims.phone, None);
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn minted_token_fails_after_expiry() -> Result<(), SessionError> {
        let issuer = issuer()?;
        let now = Utc::now();
        let token = issuer.mint_at(&identity(), Channel::Phone, "+911234567890", now)?;

        let result = issuer.validate_at(&token, now + Duration::days(7));
        assert!(matches!(result, Err(SessionError::Unauthenticated)));
        Ok(())
    }

    #[test]
    fn token_from_another_secret_is_rejected() -> Result<(), SessionError> {
        let token = issuer()?.mint(&identity(), Channel::Email, "a@b.com")?;
        let other = SessionIssuer::new(SecretString::from("other".to_string()))?;
        assert!(matches!(
            other.validate(&token),
            Err(SessionError::Unauthenticated)
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() -> Result<(), SessionError> {
        let issuer = issuer()?;
        assert!(matches!(
            issuer.validate("not-a-token"),
            Err(SessionError::Unauthenticated)
        ));
        assert!(matches!(
            issuer.validate(""),
            Err(SessionError::Unauthenticated)
        ));
        Ok(())
    }
}
