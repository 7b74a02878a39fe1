//! In-memory user identities.
//!
//! Identities are created on the first successful OTP verification for a
//! contact value and never deleted. Lookups are a linear scan.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument};
use ulid::Ulid;
use utoipa::ToSchema;

use super::otp::Channel;

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aadhaar_last_four: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_aadhaar_verified: Option<bool>,
}

impl UserIdentity {
    fn new(channel: Channel, address: &str) -> Self {
        let mut identity = Self {
            id: Ulid::new().to_string(),
            ..Self::default()
        };
        *identity.contact_mut(channel) = Some(address.to_string());
        identity
    }

    /// Contact value stored for `channel`, if any.
    #[must_use]
    pub fn contact(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Email => self.email.as_deref(),
            Channel::Phone => self.phone.as_deref(),
        }
    }

    fn contact_mut(&mut self, channel: Channel) -> &mut Option<String> {
        match channel {
            Channel::Email => &mut self.email,
            Channel::Phone => &mut self.phone,
        }
    }
}

#[derive(Default)]
pub struct IdentityStore {
    identities: Mutex<Vec<UserIdentity>>,
}

impl IdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the identity owning `address` on `channel`, creating it if needed.
    #[instrument(skip(self))]
    pub async fn resolve_or_create(&self, channel: Channel, address: &str) -> UserIdentity {
        let mut identities = self.identities.lock().await;

        if let Some(existing) = identities
            .iter()
            .find(|identity| identity.contact(channel) == Some(address))
        {
            return existing.clone();
        }

        let identity = UserIdentity::new(channel, address);
        info!(user_id = %identity.id, "created identity");
        identities.push(identity.clone());
        identity
    }

    pub async fn find(&self, id: &str) -> Option<UserIdentity> {
        let identities = self.identities.lock().await;
        identities.iter().find(|identity| identity.id == id).cloned()
    }

    /// Record a confirmed Aadhaar number on the identity.
    ///
    /// Returns the updated identity, or `None` if `id` is unknown.
    #[instrument(skip(self))]
    pub async fn attach_aadhaar(&self, id: &str, last_four: &str) -> Option<UserIdentity> {
        let mut identities = self.identities.lock().await;
        let identity = identities.iter_mut().find(|identity| identity.id == id)?;
        identity.aadhaar_last_four = Some(last_four.to_string());
        identity.is_aadhaar_verified = Some(true);
        Some(identity.clone())
    }
}
