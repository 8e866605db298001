//! Authentication service
//!
//! Username/password login, session tracking and token rotation.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{AuthSession, AuthTokensResponse, NewUser, User};

use super::jwt::{generate_access_token, generate_refresh_token, verify_token, JwtError, TokenType};
use super::password::{hash_password_off_thread, verify_password_off_thread, PasswordError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username or email already registered")]
    UserAlreadyExists,

    #[error("Session not found or revoked")]
    SessionNotFound,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::UserAlreadyExists,
            _ => AuthError::DatabaseError(e.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::TokenError(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::TokenError(_)
            | AuthError::InvalidRefreshToken => ApiError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::UserAlreadyExists => ApiError::BadRequest(err.to_string()),
            AuthError::DatabaseError(_) => ApiError::DatabaseError(err.to_string()),
            AuthError::Password(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

/// Client details recorded on a session
#[derive(Debug, Clone, Default)]
pub struct SessionOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_days: i64,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        db_pool: PgPool,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_days: i64,
    ) -> Self {
        Self {
            db_pool,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_days,
        }
    }

    /// Register an account
    pub async fn create_user(&self, new_user: NewUser, bcrypt_cost: u32) -> Result<User, AuthError> {
        let password_hash = hash_password_off_thread(new_user.password.clone(), bcrypt_cost).await?;
        let now = Utc::now();

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING id, username, email, first_name, last_name, password_hash, is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(new_user.email.to_lowercase())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&password_hash)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");

        Ok(user)
    }

    /// Check credentials and open a session
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        origin: SessionOrigin,
    ) -> Result<AuthTokensResponse, AuthError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE username = $1 AND is_active = TRUE
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db_pool)
        .await?;

        let verified = match &user {
            Some(user) => {
                verify_password_off_thread(password.to_string(), user.password_hash.clone()).await?
            }
            None => false,
        };

        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::warn!(username, "Failed login attempt");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let jti = Uuid::new_v4().to_string();
        let (access_token, refresh_token) = self.issue_tokens(&user, &jti)?;
        let session_expires_at = Utc::now() + Duration::days(self.refresh_token_ttl_days);

        sqlx::query(
            r#"
            INSERT INTO auth_sessions (id, user_id, jti, refresh_token_hash, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(&jti)
        .bind(hash_token(&refresh_token))
        .bind(&origin.ip_address)
        .bind(&origin.user_agent)
        .bind(session_expires_at)
        .execute(&self.db_pool)
        .await?;

        tracing::info!(user_id = %user.id, "Session opened");

        Ok(self.tokens_response(user, access_token, refresh_token))
    }

    /// Rotate tokens using a valid refresh token
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthTokensResponse, AuthError> {
        verify_token(refresh_token, &self.jwt_secret, TokenType::Refresh).map_err(|e| match e {
            JwtError::WrongKind { .. } => AuthError::InvalidRefreshToken,
            other => other.into(),
        })?;

        let session: AuthSession = sqlx::query_as(
            r#"
            SELECT id, user_id, jti, refresh_token_hash, ip_address, user_agent, expires_at, revoked, revoked_at, created_at, updated_at
            FROM auth_sessions
            WHERE refresh_token_hash = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(hash_token(refresh_token))
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::SessionNotFound)?;

        let user = self.get_user_by_id(session.user_id).await?;

        let jti = Uuid::new_v4().to_string();
        let (access_token, new_refresh_token) = self.issue_tokens(&user, &jti)?;
        let session_expires_at = Utc::now() + Duration::days(self.refresh_token_ttl_days);

        sqlx::query(
            r#"
            UPDATE auth_sessions
            SET jti = $1, refresh_token_hash = $2, expires_at = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&jti)
        .bind(hash_token(&new_refresh_token))
        .bind(session_expires_at)
        .bind(session.id)
        .execute(&self.db_pool)
        .await?;

        Ok(self.tokens_response(user, access_token, new_refresh_token))
    }

    /// Revoke a session (logout)
    pub async fn revoke_session(&self, jti: &str) -> Result<(), AuthError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE auth_sessions
            SET revoked = TRUE, revoked_at = NOW(), updated_at = NOW()
            WHERE jti = $1 AND revoked = FALSE
            "#,
        )
        .bind(jti)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AuthError::SessionNotFound);
        }

        Ok(())
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        sqlx::query_as(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::UserNotFound)
    }

    /// Verify a session is valid (not revoked)
    pub async fn verify_session(&self, jti: &str) -> Result<AuthSession, AuthError> {
        sqlx::query_as(
            r#"
            SELECT id, user_id, jti, refresh_token_hash, ip_address, user_agent, expires_at, revoked, revoked_at, created_at, updated_at
            FROM auth_sessions
            WHERE jti = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::SessionNotFound)
    }

    /// Get JWT secret (for middleware access)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    fn issue_tokens(&self, user: &User, jti: &str) -> Result<(String, String), AuthError> {
        let access_token =
            generate_access_token(user, jti, &self.jwt_secret, self.access_token_ttl_seconds)?;
        let refresh_token = generate_refresh_token(
            user,
            &Uuid::new_v4().to_string(),
            &self.jwt_secret,
            self.refresh_token_ttl_days,
        )?;
        Ok((access_token, refresh_token))
    }

    fn tokens_response(
        &self,
        user: User,
        access_token: String,
        refresh_token: String,
    ) -> AuthTokensResponse {
        AuthTokensResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
            user: user.into(),
        }
    }
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("refresh-token");
        let b = hash_token("refresh-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_token("other-token"));
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        use axum::http::StatusCode;

        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::UserNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AuthError::UserAlreadyExists).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
