//! Pending one-time codes keyed by `channel:address`.
//!
//! Each key holds at most one live code. Issuing again overwrites the entry
//! and resets its timer. Expired entries are never swept; they are dropped by
//! the next verification attempt for their key.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use utoipa::ToSchema;

pub const DEFAULT_OTP_TTL_SECONDS: i64 = 10 * 60;
/// Longest accepted code lifetime: one day.
pub const MAX_OTP_TTL_SECONDS: i64 = 24 * 60 * 60;

const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

/// Contact medium a code is delivered over.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Phone,
}

impl Channel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            other => Err(format!("unsupported channel: {other}")),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("no pending code")]
    NotFound,
    #[error("code does not match")]
    Invalid,
    #[error("code expired")]
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpEntry {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

pub struct OtpStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, OtpEntry>>,
}

impl OtpStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh code for `channel:address`, replacing any pending one.
    pub async fn issue(&self, channel: Channel, address: &str) -> OtpEntry {
        self.issue_at(channel, address, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn issue_at(&self, channel: Channel, address: &str, now: DateTime<Utc>) -> OtpEntry {
        let entry = OtpEntry {
            code: generate_code(),
            expires_at: now + self.ttl,
        };

        let mut entries = self.entries.lock().await;
        if entries.insert(key(channel, address), entry.clone()).is_some() {
            debug!("replaced pending code");
        }

        entry
    }

    /// Check `submitted` against the pending code and consume it on success.
    ///
    /// # Errors
    /// `NotFound` when nothing is pending, `Invalid` on a mismatch (the entry
    /// is kept unless it has expired), `Expired` when the right code arrives
    /// too late.
    pub async fn verify(
        &self,
        channel: Channel,
        address: &str,
        submitted: &str,
    ) -> Result<(), OtpError> {
        self.verify_at(channel, address, submitted, Utc::now()).await
    }

    #[instrument(skip(self, submitted))]
    pub async fn verify_at(
        &self,
        channel: Channel,
        address: &str,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        let key = key(channel, address);
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get(&key) else {
            return Err(OtpError::NotFound);
        };

        let matches = entry.code == submitted;

        if now > entry.expires_at {
            entries.remove(&key);
            debug!("dropped expired code");
            return Err(if matches {
                OtpError::Expired
            } else {
                OtpError::Invalid
            });
        }

        if !matches {
            return Err(OtpError::Invalid);
        }

        entries.remove(&key);

        Ok(())
    }
}

fn key(channel: Channel, address: &str) -> String {
    format!("{channel}:{address}")
}

fn generate_code() -> String {
    OsRng.gen_range(OTP_MIN..=OTP_MAX).to_string()
}
