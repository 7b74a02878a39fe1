//! Request-level errors and the JSON error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error};
use utoipa::ToSchema;

use super::{notify::DeliveryError, otp::OtpError, session::SessionError};

/// Field name to validation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("OTP expired")]
    ExpiredOtp,
    #[error("{0}")]
    NotFound(String),
    #[error("Failed to send verification code")]
    DeliveryFailed(#[from] DeliveryError),
    #[error("Session signing is not configured")]
    Configuration,
    #[error("Something went wrong")]
    Internal(#[source] anyhow::Error),
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) | Self::InvalidOtp | Self::ExpiredOtp => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DeliveryFailed(_) | Self::Configuration | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render the error envelope. `detail` adds the debug chain as `stack`.
    #[must_use]
    pub fn into_envelope(self, detail: bool) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!("[Error]: {} - {message}: {self:?}", status.as_u16());
        } else {
            debug!("[Error]: {} - {message}", status.as_u16());
        }

        let stack = detail.then(|| format!("{self:?}"));
        let errors = match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        };

        let body = ErrorBody {
            status: "error".to_string(),
            message,
            errors,
            stack,
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_envelope(false)
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        match err {
            // a missing code reads the same as a wrong one to the caller
            OtpError::NotFound | OtpError::Invalid => Self::InvalidOtp,
            OtpError::Expired => Self::ExpiredOtp,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Configuration => Self::Configuration,
            SessionError::Signing(source) => Self::Internal(source.into()),
            SessionError::Unauthenticated => Self::Unauthenticated("Invalid or expired token"),
        }
    }
}
