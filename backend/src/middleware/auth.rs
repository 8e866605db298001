//! Bearer-token extractors
//!
//! `AuthenticatedUser` rejects the request when no live session backs the
//! token. `OptionalUser` only rejects when the session store cannot be
//! reached; record endpoints use it so that a missing record is reported
//! before a missing identity.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{verify_token, AuthError, AuthService, JwtError, TokenType};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub jti: String,
}

/// Why a bearer token was refused. Everything but `SessionLookupFailed`
/// is the caller's fault and answers 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Missing,
    Expired,
    Invalid,
    WrongKind,
    Revoked,
    SessionLookupFailed,
}

impl TokenRejection {
    pub fn code(&self) -> &'static str {
        match self {
            TokenRejection::Missing => "MISSING_TOKEN",
            TokenRejection::Expired => "TOKEN_EXPIRED",
            TokenRejection::Invalid => "INVALID_TOKEN",
            TokenRejection::WrongKind => "INVALID_TOKEN_TYPE",
            TokenRejection::Revoked => "SESSION_REVOKED",
            TokenRejection::SessionLookupFailed => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            TokenRejection::SessionLookupFailed => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            TokenRejection::Missing => "Authorization header with Bearer token required",
            TokenRejection::Expired => "Token has expired",
            TokenRejection::Invalid => "Invalid token",
            TokenRejection::WrongKind => "Expected access token",
            TokenRejection::Revoked => "Session has been revoked",
            TokenRejection::SessionLookupFailed => "Could not verify session",
        }
    }
}

impl From<JwtError> for TokenRejection {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => TokenRejection::Expired,
            JwtError::WrongKind { .. } => TokenRejection::WrongKind,
            JwtError::EncodingFailed(_) | JwtError::DecodingFailed(_) => TokenRejection::Invalid,
        }
    }
}

impl IntoResponse for TokenRejection {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TokenRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| TokenRejection::Missing)?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let claims = verify_token(bearer.token(), auth_service.jwt_secret(), TokenType::Access)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenRejection::Invalid)?;

        match auth_service.verify_session(&claims.jti).await {
            Ok(_) => {}
            Err(AuthError::SessionNotFound) => {
                tracing::debug!(user_id = %user_id, jti = %claims.jti, "Token for closed session");
                return Err(TokenRejection::Revoked);
            }
            Err(e) => {
                tracing::error!(error = %e, jti = %claims.jti, "Session lookup failed");
                return Err(TokenRejection::SessionLookupFailed);
            }
        }

        Ok(AuthenticatedUser {
            user_id,
            username: claims.username,
            jti: claims.jti,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl OptionalUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TokenRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthenticatedUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err(TokenRejection::SessionLookupFailed) => Err(TokenRejection::SessionLookupFailed),
            Err(_) => Ok(OptionalUser(None)),
        }
    }
}
