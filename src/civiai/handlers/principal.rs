//! Session token transport and authenticated principal extraction.
//!
//! The token is read from the `Authorization: Bearer` header first, then from
//! the `token` cookie. A principal is only produced for a token that passes
//! signature and expiry checks.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

use crate::civiai::{
    error::ApiError,
    otp::Channel,
    state::{AppState, AuthConfig},
};

pub(crate) const SESSION_COOKIE_NAME: &str = "token";

/// Authenticated user context derived from the session token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Principal {
    #[must_use]
    pub fn contact(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Email => self.email.as_deref(),
            Channel::Phone => self.phone.as_deref(),
        }
    }
}

/// Resolve the request's session token into a principal.
///
/// # Errors
/// `Unauthenticated` when no token is present or it does not validate.
pub fn require_auth(headers: &HeaderMap, state: &AppState) -> Result<Principal, ApiError> {
    let token =
        extract_session_token(headers).ok_or(ApiError::Unauthenticated("Not authenticated"))?;
    let claims = state.sessions().validate(&token)?;

    Ok(Principal {
        user_id: claims.id,
        email: claims.email,
        phone: claims.phone,
    })
}

/// Build the `HttpOnly`, `SameSite=Strict` session cookie.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
    max_age_seconds: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    session_cookie(config, "", 0)
}

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let value = headers.get(COOKIE)?.to_str().ok()?;
    value.split(';').find_map(|pair| {
        let (key, val) = pair.trim().split_once('=')?;
        let val = val.trim();
        (key.trim() == SESSION_COOKIE_NAME && !val.is_empty()).then(|| val.to_string())
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civiai::{identity::UserIdentity, state::Environment};
    use anyhow::Result;
    use secrecy::SecretString;

    fn state() -> Result<AppState> {
        Ok(AppState::new(
            AuthConfig::default(),
            SecretString::from("secret".to_string()),
        )?)
    }

    #[test]
    fn bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("token=def"));
        assert_eq!(extract_session_token(&headers), Some("abc".to_string()));
    }

    #[test]
    fn cookie_token_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; token=def; lang=hi"),
        );
        assert_eq!(extract_session_token(&headers), Some("def".to_string()));
    }

    #[test]
    fn empty_or_missing_tokens_are_ignored() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(COOKIE, HeaderValue::from_static("token="));
        assert_eq!(extract_session_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn session_cookie_is_strict_and_secure_in_production() -> Result<()> {
        let cookie = session_cookie(&AuthConfig::default(), "jwt", 604_800)?;
        let cookie = cookie.to_str()?;
        assert_eq!(
            cookie,
            "token=jwt; Path=/; HttpOnly; SameSite=Strict; Max-Age=604800"
        );

        let production = AuthConfig::default().with_environment(Environment::Production);
        let cookie = session_cookie(&production, "jwt", 604_800)?;
        assert!(cookie.to_str()?.ends_with("; Secure"));

        let cleared = clear_session_cookie(&AuthConfig::default())?;
        assert!(cleared.to_str()?.contains("token=; "));
        assert!(cleared.to_str()?.contains("Max-Age=0"));
        Ok(())
    }

    #[test]
    fn require_auth_accepts_minted_token() -> Result<()> {
        let state = state()?;
        let identity = UserIdentity {
            id: "01J".to_string(),
            phone: Some("+911234567890".to_string()),
            ..UserIdentity::default()
        };
        let token = state
            .sessions()
            .mint(&identity, Channel::Phone, "+911234567890")?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);

        let principal = require_auth(&headers, &state)?;
        assert_eq!(principal.user_id, "01J");
        assert_eq!(principal.contact(Channel::Phone), Some("+911234567890"));
        assert_eq!(principal.contact(Channel::Email), None);
        Ok(())
    }

    #[test]
    fn require_auth_rejects_missing_and_bad_tokens() -> Result<()> {
        let state = state()?;
        let result = require_auth(&HeaderMap::new(), &state);
        assert!(matches!(
            result,
            Err(ApiError::Unauthenticated("Not authenticated"))
        ));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("token=forged.token.value"));
        let result = require_auth(&headers, &state);
        assert!(matches!(
            result,
            Err(ApiError::Unauthenticated("Invalid or expired token"))
        ));
        Ok(())
    }
}
