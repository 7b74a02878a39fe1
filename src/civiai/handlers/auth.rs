//! OTP login, logout and current-user endpoints.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::{
    json_payload,
    principal::{clear_session_cookie, require_auth, session_cookie},
    types::{
        success, MeResponse, MessageResponse, SendOtpRequest, SendOtpResponse, UserData,
        VerifyOtpData, VerifyOtpRequest, VerifyOtpResponse,
    },
};
use crate::civiai::{
    error::{ApiError, ErrorBody},
    identity::UserIdentity,
    notify::OtpMessage,
    otp::Channel,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/send-otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code issued and delivered", body = SendOtpResponse),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 500, description = "Delivery failed", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn send_otp(
    state: Extension<Arc<AppState>>,
    payload: Result<Json<SendOtpRequest>, JsonRejection>,
) -> impl IntoResponse {
    state.respond(issue_and_deliver(&state, payload).await)
}

#[instrument(skip_all)]
async fn issue_and_deliver(
    state: &AppState,
    payload: Result<Json<SendOtpRequest>, JsonRejection>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    let contact = json_payload(payload)?.validate()?;

    let entry = state.otps().issue(contact.channel, &contact.address).await;

    // the code stays valid if delivery fails; it simply expires
    let message = OtpMessage::new(
        contact.channel,
        &contact.address,
        &entry.code,
        state.otps().ttl().num_minutes(),
    );
    state.sender().send(&message)?;

    info!(channel = %contact.channel, "otp issued");

    Ok(Json(SendOtpResponse {
        status: success(),
        message: format!("OTP sent to your {}", contact.channel),
        expires_at: entry.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Authenticated; session cookie set", body = VerifyOtpResponse),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 401, description = "Invalid or expired code", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    state: Extension<Arc<AppState>>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> impl IntoResponse {
    state.respond(verify_and_login(&state, payload).await)
}

#[instrument(skip_all)]
async fn verify_and_login(
    state: &AppState,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<VerifyOtpResponse>), ApiError> {
    let submission = json_payload(payload)?.validate()?;
    let contact = &submission.contact;

    state
        .otps()
        .verify(contact.channel, &contact.address, &submission.otp)
        .await?;

    let identity = state
        .identities()
        .resolve_or_create(contact.channel, &contact.address)
        .await;
    let token = state
        .sessions()
        .mint(&identity, contact.channel, &contact.address)?;

    let mut headers = HeaderMap::new();
    let cookie = session_cookie(state.config(), &token, state.sessions().ttl().num_seconds())
        .map_err(|err| ApiError::Internal(err.into()))?;
    headers.insert(SET_COOKIE, cookie);

    info!(user_id = %identity.id, channel = %contact.channel, "session issued");

    // echo only the contact that was just verified
    let mut user = UserIdentity {
        id: identity.id,
        ..UserIdentity::default()
    };
    match contact.channel {
        Channel::Email => user.email = Some(contact.address.clone()),
        Channel::Phone => user.phone = Some(contact.address.clone()),
    }

    Ok((
        headers,
        Json(VerifyOtpResponse {
            status: success(),
            message: "Authentication successful".to_string(),
            data: VerifyOtpData { user, token },
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(state: Extension<Arc<AppState>>) -> impl IntoResponse {
    // Always clear the cookie; there is no server-side session to revoke.
    let mut headers = HeaderMap::new();
    match clear_session_cookie(state.config()) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build logout cookie: {err}"),
    }

    (
        StatusCode::OK,
        headers,
        Json(MessageResponse {
            status: success(),
            message: "Logged out successfully".to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 404, description = "Identity no longer exists", body = ErrorBody)
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "auth"
)]
pub async fn me(headers: HeaderMap, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    state.respond(current_user(&headers, &state).await)
}

async fn current_user(headers: &HeaderMap, state: &AppState) -> Result<Json<MeResponse>, ApiError> {
    let principal = require_auth(headers, state)?;

    let user = state
        .identities()
        .find(&principal.user_id)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        status: success(),
        data: UserData { user },
    }))
}
