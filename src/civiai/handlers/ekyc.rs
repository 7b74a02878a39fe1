//! Aadhaar eKYC endpoints. Both require a valid session.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    json_payload,
    principal::require_auth,
    types::{
        success, AadhaarHash, AadhaarLastFour, AadhaarOtpRequest, AadhaarOtpResponse,
        AadhaarVerifyRequest, AadhaarVerifyResponse,
    },
};
use crate::civiai::{
    ekyc::{last_four, request_hash},
    error::{ApiError, ErrorBody},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/ekyc/send-otp",
    request_body = AadhaarOtpRequest,
    responses(
        (status = 200, description = "UIDAI OTP requested", body = AadhaarOtpResponse),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "ekyc"
)]
pub async fn send_otp(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<AadhaarOtpRequest>, JsonRejection>,
) -> impl IntoResponse {
    state.respond(request_aadhaar_otp(&headers, &state, payload).await)
}

#[instrument(skip_all)]
async fn request_aadhaar_otp(
    headers: &HeaderMap,
    state: &AppState,
    payload: Result<Json<AadhaarOtpRequest>, JsonRejection>,
) -> Result<Json<AadhaarOtpResponse>, ApiError> {
    let principal = require_auth(headers, state)?;
    let aadhaar_number = json_payload(payload)?.validate()?;

    state
        .uidai()
        .request_otp(&aadhaar_number)
        .map_err(ApiError::Internal)?;

    info!(user_id = %principal.user_id, last_four = last_four(&aadhaar_number), "aadhaar otp requested");

    Ok(Json(AadhaarOtpResponse {
        status: success(),
        message: "OTP sent successfully".to_string(),
        data: AadhaarHash {
            hash: request_hash(&aadhaar_number, state.config().uidai_secret()),
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/ekyc/verify-otp",
    request_body = AadhaarVerifyRequest,
    responses(
        (status = 200, description = "Aadhaar confirmed", body = AadhaarVerifyResponse),
        (status = 400, description = "Malformed request or hash mismatch", body = ErrorBody),
        (status = 401, description = "Missing session or wrong OTP", body = ErrorBody),
        (status = 404, description = "Identity no longer exists", body = ErrorBody)
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "ekyc"
)]
pub async fn verify_otp(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<AadhaarVerifyRequest>, JsonRejection>,
) -> impl IntoResponse {
    state.respond(confirm_aadhaar(&headers, &state, payload).await)
}

#[instrument(skip_all)]
async fn confirm_aadhaar(
    headers: &HeaderMap,
    state: &AppState,
    payload: Result<Json<AadhaarVerifyRequest>, JsonRejection>,
) -> Result<Json<AadhaarVerifyResponse>, ApiError> {
    let principal = require_auth(headers, state)?;
    let submission = json_payload(payload)?.validate()?;

    let expected = request_hash(&submission.aadhaar_number, state.config().uidai_secret());
    if submission.hash != expected {
        warn!(user_id = %principal.user_id, "aadhaar verification hash mismatch");
        return Err(ApiError::BadRequest(
            "Invalid verification request".to_string(),
        ));
    }

    if !state
        .uidai()
        .verify_otp(&submission.aadhaar_number, &submission.otp)
    {
        return Err(ApiError::InvalidOtp);
    }

    let suffix = last_four(&submission.aadhaar_number);
    state
        .identities()
        .attach_aadhaar(&principal.user_id, suffix)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %principal.user_id, "aadhaar verified");

    Ok(Json(AadhaarVerifyResponse {
        status: success(),
        message: "Aadhaar verified successfully".to_string(),
        data: AadhaarLastFour {
            last_four: suffix.to_string(),
        },
    }))
}
