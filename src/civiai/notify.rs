//! One-time code delivery.
//!
//! Handlers call an `OtpSender` right after issuing a code. The default
//! sender only logs; SMS delivery is refused unless it was enabled at
//! startup, mirroring a deployment without a configured SMS gateway.

use thiserror::Error;
use tracing::{error, info};

use super::otp::Channel;

const EMAIL_SUBJECT: &str = "Your CiviAI Verification Code";

#[derive(Debug, Error)]
#[error("failed to send verification code")]
pub struct DeliveryError {
    #[source]
    source: anyhow::Error,
}

impl DeliveryError {
    #[must_use]
    pub fn new(source: anyhow::Error) -> Self {
        Self { source }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpMessage {
    pub channel: Channel,
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
}

impl OtpMessage {
    /// Render the delivery message for `code`.
    #[must_use]
    pub fn new(channel: Channel, to: &str, code: &str, ttl_minutes: i64) -> Self {
        match channel {
            Channel::Email => Self {
                channel,
                to: to.to_string(),
                subject: Some(EMAIL_SUBJECT.to_string()),
                body: format!(
                    "Your verification code is: {code}\n\nThis code will expire in {ttl_minutes} minutes.\nIf you didn't request this code, please ignore this email."
                ),
            },
            Channel::Phone => Self {
                channel,
                to: to.to_string(),
                subject: None,
                body: format!("Your CiviAI verification code is: {code}"),
            },
        }
    }
}

/// Delivery abstraction for one-time codes.
pub trait OtpSender: Send + Sync {
    /// Deliver `message` or report why it could not be sent.
    ///
    /// # Errors
    /// Returns `DeliveryError` when the message was not handed off.
    fn send(&self, message: &OtpMessage) -> Result<(), DeliveryError>;
}

/// Local sender that logs messages instead of talking to a gateway.
#[derive(Clone, Debug, Default)]
pub struct LogOtpSender {
    sms_enabled: bool,
}

impl LogOtpSender {
    #[must_use]
    pub fn new(sms_enabled: bool) -> Self {
        Self { sms_enabled }
    }
}

impl OtpSender for LogOtpSender {
    fn send(&self, message: &OtpMessage) -> Result<(), DeliveryError> {
        if message.channel == Channel::Phone && !self.sms_enabled {
            error!(to = %message.to, "sms delivery is not configured");
            return Err(DeliveryError::new(anyhow::anyhow!(
                "Notification type {} not configured",
                message.channel
            )));
        }

        info!(
            channel = %message.channel,
            to = %message.to,
            subject = message.subject.as_deref().unwrap_or(""),
            body = %message.body,
            "otp delivery stub"
        );
        Ok(())
    }
}
