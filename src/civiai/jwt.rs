//! Minimal `HS256` JWT encoding and verification.
//!
//! Only the compact serialization is supported. Segments are base64url
//! without padding. Claim checks such as `exp` belong to the caller.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Header {
    alg: String,
    typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: DeserializeOwned>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn mac(secret: &[u8], signing_input: &str) -> Result<HmacSha256, Error> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::Key)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

/// Sign `claims` with `secret`.
///
/// # Errors
/// Returns an error if the claims cannot be serialized.
pub fn encode_hs256<T: Serialize>(secret: &[u8], claims: &T) -> Result<String, Error> {
    let signing_input = format!("{}.{}", b64e_json(&Header::hs256())?, b64e_json(claims)?);
    let signature = mac(secret, &signing_input)?.finalize().into_bytes();

    Ok(format!(
        "{signing_input}.{}",
        Base64UrlUnpadded::encode_string(&signature)
    ))
}

/// Verify the signature of `token` and decode its claims.
///
/// # Errors
/// Returns an error if the token is malformed, uses another algorithm, or the
/// signature does not match.
pub fn decode_hs256<T: DeserializeOwned>(secret: &[u8], token: &str) -> Result<T, Error> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::TokenFormat);
    };

    let header: Header = b64d_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(Error::UnsupportedAlg(header.alg));
    }

    let signature = Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| Error::Base64)?;
    mac(secret, &format!("{header_b64}.{claims_b64}"))?
        .verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    b64d_json(claims_b64)
}
