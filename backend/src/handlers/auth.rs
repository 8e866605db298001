//! Authentication HTTP handlers
//!
//! Endpoints for username/password authentication.

use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::auth::SessionOrigin;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthenticatedUser, ClientIp};
use crate::models::{AuthTokensResponse, LoginRequest, RefreshTokenRequest, UserResponse};
use crate::state::AppState;

/// POST /auth/login - Exchange credentials for tokens
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<Json<AuthTokensResponse>> {
    req.validate()?;

    let origin = SessionOrigin {
        ip_address: Some(ip),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };

    let tokens = state
        .auth_service
        .login(&req.username, &req.password, origin)
        .await?;

    Ok(Json(tokens))
}

/// POST /auth/refresh - Refresh access token using refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RefreshTokenRequest>, ApiError>,
) -> ApiResult<Json<AuthTokensResponse>> {
    let tokens = state.auth_service.refresh_tokens(&req.refresh_token).await?;

    Ok(Json(tokens))
}

/// POST /auth/logout - Revoke current session
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    state.auth_service.revoke_session(&user.jti).await?;

    tracing::info!(user_id = %user.user_id, "Session revoked");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth_service.get_user_by_id(user.user_id).await?;

    Ok(Json(user.into()))
}
