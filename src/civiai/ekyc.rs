//! Aadhaar (UIDAI) confirmation.
//!
//! The UIDAI integration is mocked: `MockUidai` pretends to send an OTP and
//! accepts a single fixed code. Requests are bound to the Aadhaar number by a
//! salted hash handed to the client on `send` and checked on `verify`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::info;

pub const MOCK_UIDAI_OTP: &str = "123456";

/// Client for the UIDAI OTP API.
pub trait UidaiClient: Send + Sync {
    /// Ask UIDAI to send an OTP to the phone linked with `aadhaar_number`.
    ///
    /// # Errors
    /// Returns an error if the request could not be placed.
    fn request_otp(&self, aadhaar_number: &str) -> anyhow::Result<()>;

    /// Whether `otp` confirms `aadhaar_number`.
    fn verify_otp(&self, aadhaar_number: &str, otp: &str) -> bool;
}

#[derive(Clone, Debug, Default)]
pub struct MockUidai;

impl UidaiClient for MockUidai {
    fn request_otp(&self, aadhaar_number: &str) -> anyhow::Result<()> {
        info!(last_four = last_four(aadhaar_number), "uidai otp request stub");
        Ok(())
    }

    fn verify_otp(&self, _aadhaar_number: &str, otp: &str) -> bool {
        otp == MOCK_UIDAI_OTP
    }
}

/// Hex `sha256(aadhaar_number || secret)`, binding a verification request to its number.
#[must_use]
pub fn request_hash(aadhaar_number: &str, secret: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(aadhaar_number.as_bytes());
    hasher.update(secret.expose_secret().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Last four characters of an Aadhaar number.
#[must_use]
pub fn last_four(aadhaar_number: &str) -> &str {
    aadhaar_number
        .char_indices()
        .rev()
        .nth(3)
        .map_or(aadhaar_number, |(start, _)| &aadhaar_number[start..])
}
