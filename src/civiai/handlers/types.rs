//! Request/response types for the API and their validation.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::civiai::{
    error::{ApiError, FieldErrors},
    identity::UserIdentity,
    otp::Channel,
};

const MIN_ADDRESS_LEN: usize = 5;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct SendOtpRequest {
    #[serde(rename = "type", default)]
    #[schema(value_type = String, example = "email")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct VerifyOtpRequest {
    #[serde(rename = "type", default)]
    #[schema(value_type = String, example = "email")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AadhaarOtpRequest {
    #[serde(default)]
    pub aadhaar_number: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AadhaarVerifyRequest {
    #[serde(default)]
    pub aadhaar_number: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
}

/// A validated contact: which channel and the address on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contact {
    pub channel: Channel,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpSubmission {
    pub contact: Contact,
    pub otp: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AadhaarSubmission {
    pub aadhaar_number: String,
    pub otp: String,
    pub hash: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub status: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpData {
    pub user: UserIdentity,
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpResponse {
    pub status: String,
    pub message: String,
    pub data: VerifyOtpData,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserData {
    pub user: UserIdentity,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub status: String,
    pub data: UserData,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AadhaarHash {
    pub hash: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AadhaarOtpResponse {
    pub status: String,
    pub message: String,
    pub data: AadhaarHash,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AadhaarLastFour {
    pub last_four: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AadhaarVerifyResponse {
    pub status: String,
    pub message: String,
    pub data: AadhaarLastFour,
}

pub(crate) fn success() -> String {
    "success".to_string()
}

#[derive(Default)]
struct Checker {
    errors: FieldErrors,
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn required<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        if value.is_none() {
            self.fail(field, "Required");
        }
        value
    }

    fn channel(&mut self, value: Option<&str>) -> Option<Channel> {
        let value = self.required("type", value)?;
        match value.parse::<Channel>() {
            Ok(channel) => Some(channel),
            Err(_) => {
                self.fail(
                    "type",
                    format!("Invalid enum value. Expected 'email' | 'phone', received '{value}'"),
                );
                None
            }
        }
    }

    fn address(&mut self, value: Option<&str>) -> Option<String> {
        let value = self.required("value", value)?;
        if value.chars().count() < MIN_ADDRESS_LEN {
            self.fail(
                "value",
                format!("String must contain at least {MIN_ADDRESS_LEN} character(s)"),
            );
            return None;
        }
        Some(value.to_string())
    }

    fn digits(&mut self, field: &str, value: Option<&str>, len: usize) -> Option<String> {
        let value = self.required(field, value)?;
        if value.chars().count() != len {
            self.fail(
                field,
                format!("String must contain exactly {len} character(s)"),
            );
            return None;
        }
        if !only_digits(value) {
            self.fail(field, "Must contain only digits");
            return None;
        }
        Some(value.to_string())
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ApiError> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(ApiError::Validation(self.errors)),
        }
    }
}

fn only_digits(value: &str) -> bool {
    Regex::new(r"^[0-9]+$").is_ok_and(|re| re.is_match(value))
}

impl SendOtpRequest {
    /// # Errors
    /// Returns `ApiError::Validation` with per-field messages.
    pub fn validate(&self) -> Result<Contact, ApiError> {
        let mut checker = Checker::default();
        let channel = checker.channel(self.kind.as_deref());
        let address = checker.address(self.value.as_deref());
        let contact = channel
            .zip(address)
            .map(|(channel, address)| Contact { channel, address });
        checker.finish(contact)
    }
}

impl VerifyOtpRequest {
    /// # Errors
    /// Returns `ApiError::Validation` with per-field messages.
    pub fn validate(&self) -> Result<OtpSubmission, ApiError> {
        let mut checker = Checker::default();
        let channel = checker.channel(self.kind.as_deref());
        let address = checker.address(self.value.as_deref());
        let otp = checker.digits("otp", self.otp.as_deref(), 6);
        let submission = match (channel, address, otp) {
            (Some(channel), Some(address), Some(otp)) => Some(OtpSubmission {
                contact: Contact { channel, address },
                otp,
            }),
            _ => None,
        };
        checker.finish(submission)
    }
}

impl AadhaarOtpRequest {
    /// # Errors
    /// Returns `ApiError::Validation` with per-field messages.
    pub fn validate(&self) -> Result<String, ApiError> {
        let mut checker = Checker::default();
        let number = checker.digits("aadhaarNumber", self.aadhaar_number.as_deref(), 12);
        checker.finish(number)
    }
}

impl AadhaarVerifyRequest {
    /// # Errors
    /// Returns `ApiError::Validation` with per-field messages.
    pub fn validate(&self) -> Result<AadhaarSubmission, ApiError> {
        let mut checker = Checker::default();
        let number = checker.digits("aadhaarNumber", self.aadhaar_number.as_deref(), 12);
        let otp = checker.digits("otp", self.otp.as_deref(), 6);
        let hash = checker.required("hash", self.hash.as_deref());
        let submission = match (number, otp, hash) {
            (Some(aadhaar_number), Some(otp), Some(hash)) => Some(AadhaarSubmission {
                aadhaar_number,
                otp,
                hash: hash.to_string(),
            }),
            _ => None,
        };
        checker.finish(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};

    fn field_errors(result: Result<impl std::fmt::Debug, ApiError>) -> Result<FieldErrors> {
        match result {
            Err(ApiError::Validation(errors)) => Ok(errors),
            other => bail!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn send_otp_request_accepts_email() -> Result<()> {
        let request: SendOtpRequest =
            serde_json::from_str(r#"{"type":"email","value":"a@b.com"}"#)?;
        let contact = request.validate()?;
        assert_eq!(contact.channel, Channel::Email);
        assert_eq!(contact.address, "a@b.com");
        Ok(())
    }

    #[test]
    fn send_otp_request_reports_every_field() -> Result<()> {
        let errors = field_errors(SendOtpRequest::default().validate())?;
        assert_eq!(errors["type"], vec!["Required".to_string()]);
        assert_eq!(errors["value"], vec!["Required".to_string()]);

        let request: SendOtpRequest = serde_json::from_str(r#"{"type":"fax","value":"1234"}"#)?;
        let errors = field_errors(request.validate())?;
        assert!(errors["type"][0].contains("received 'fax'"));
        assert!(errors["value"][0].contains("at least 5"));
        Ok(())
    }

    #[test]
    fn verify_otp_request_requires_six_digits() -> Result<()> {
        let request: VerifyOtpRequest =
            serde_json::from_str(r#"{"type":"phone","value":"+911234567890","otp":"12345"}"#)?;
        let errors = field_errors(request.validate())?;
        assert!(errors["otp"][0].contains("exactly 6"));
        assert!(!errors.contains_key("type"));

        let request: VerifyOtpRequest =
            serde_json::from_str(r#"{"type":"phone","value":"+911234567890","otp":"12a456"}"#)?;
        let errors = field_errors(request.validate())?;
        assert_eq!(errors["otp"], vec!["Must contain only digits".to_string()]);

        let request: VerifyOtpRequest =
            serde_json::from_str(r#"{"type":"phone","value":"+911234567890","otp":"483920"}"#)?;
        let submission = request.validate()?;
        assert_eq!(submission.contact.channel, Channel::Phone);
        assert_eq!(submission.otp, "483920");
        Ok(())
    }

    #[test]
    fn aadhaar_requests_validate_lengths() -> Result<()> {
        let request: AadhaarOtpRequest = serde_json::from_str(r#"{"aadhaarNumber":"1234"}"#)?;
        let errors = field_errors(request.validate())?;
        assert!(errors["aadhaarNumber"][0].contains("exactly 12"));

        let request: AadhaarVerifyRequest = serde_json::from_str(
            r#"{"aadhaarNumber":"123456789012","otp":"123456","hash":"abc"}"#,
        )?;
        let submission = request.validate()?;
        assert_eq!(submission.aadhaar_number, "123456789012");
        assert_eq!(submission.hash, "abc");

        let errors = field_errors(AadhaarVerifyRequest::default().validate())?;
        assert_eq!(errors.len(), 3);
        Ok(())
    }

    #[test]
    fn non_ascii_digits_are_rejected() -> Result<()> {
        let request = AadhaarOtpRequest {
            aadhaar_number: Some("१२३४५६७८९०१२".to_string()),
        };
        let errors = field_errors(request.validate())?;
        assert_eq!(
            errors["aadhaarNumber"],
            vec!["Must contain only digits".to_string()]
        );

        let request: VerifyOtpRequest =
            serde_json::from_str(r#"{"type":"email","value":"a@b.com","otp":"१२३४५६"}"#)?;
        let errors = field_errors(request.validate())?;
        assert_eq!(errors["otp"], vec!["Must contain only digits".to_string()]);

        let request: VerifyOtpRequest =
            serde_json::from_str(r#"{"type":"email","value":"a@b.com","otp":"١٢٣٤٥٦"}"#)?;
        let errors = field_errors(request.validate())?;
        assert_eq!(errors["otp"], vec!["Must contain only digits".to_string()]);
        Ok(())
    }

    #[test]
    fn send_otp_response_uses_camel_case() -> Result<()> {
        let response = SendOtpResponse {
            status: success(),
            message: "OTP sent to your email".to_string(),
            expires_at: Utc::now(),
        };
        let value = serde_json::to_value(&response)?;
        assert!(value.get("expiresAt").is_some());
        assert_eq!(value["status"], "success");
        Ok(())
    }
}
