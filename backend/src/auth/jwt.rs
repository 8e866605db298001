//! Signed bearer tokens
//!
//! Access and refresh tokens share one HS256 secret and one claim layout.
//! The `kind` claim keeps a refresh token from being replayed as an access
//! token and the other way round.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::User;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Expected {expected} token, got {found}")]
    WrongKind { expected: TokenType, found: TokenType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    /// Session key; revoking the session invalidates the token
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub kind: TokenType,
}

pub fn generate_access_token(
    user: &User,
    jti: &str,
    secret: &str,
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    sign(user, jti, secret, TokenType::Access, Duration::seconds(ttl_seconds))
}

pub fn generate_refresh_token(
    user: &User,
    jti: &str,
    secret: &str,
    ttl_days: i64,
) -> Result<String, JwtError> {
    sign(user, jti, secret, TokenType::Refresh, Duration::days(ttl_days))
}

fn sign(
    user: &User,
    jti: &str,
    secret: &str,
    kind: TokenType,
    ttl: Duration,
) -> Result<String, JwtError> {
    let issued_at = Utc::now();

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        jti: jti.to_string(),
        iat: issued_at.timestamp(),
        exp: (issued_at + ttl).timestamp(),
        kind,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Check signature and expiry, then require the token to be of `expected` kind
pub fn verify_token(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?
    .claims;

    if claims.kind != expected {
        return Err(JwtError::WrongKind {
            expected,
            found: claims.kind,
        });
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "jwt-test-secret";

    fn borrower() -> User {
        User {
            id: Uuid::new_v4(),
            username: "borrower".to_string(),
            email: "borrower@test.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "Borrower".to_string(),
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_carries_session() {
        let user = borrower();
        let jti = Uuid::new_v4().to_string();

        let token = generate_access_token(&user, &jti, SECRET, 900).unwrap();
        let claims = verify_token(&token, SECRET, TokenType::Access).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "borrower");
        assert_eq!(claims.jti, jti);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_lifetime_in_days() {
        let token = generate_refresh_token(&borrower(), "jti", SECRET, 7).unwrap();
        let claims = verify_token(&token, SECRET, TokenType::Refresh).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let user = borrower();
        let refresh = generate_refresh_token(&user, "jti", SECRET, 7).unwrap();
        let access = generate_access_token(&user, "jti", SECRET, 900).unwrap();

        assert!(matches!(
            verify_token(&refresh, SECRET, TokenType::Access),
            Err(JwtError::WrongKind {
                expected: TokenType::Access,
                found: TokenType::Refresh
            })
        ));
        assert!(matches!(
            verify_token(&access, SECRET, TokenType::Refresh),
            Err(JwtError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_expired_token() {
        // Well past the default 60s leeway
        let token = generate_access_token(&borrower(), "jti", SECRET, -3600).unwrap();
        assert!(matches!(
            verify_token(&token, SECRET, TokenType::Access),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_or_foreign_tokens_rejected() {
        assert!(matches!(
            verify_token("invalid.token.here", SECRET, TokenType::Access),
            Err(JwtError::DecodingFailed(_))
        ));

        let token = generate_access_token(&borrower(), "jti", "other-secret", 900).unwrap();
        assert!(verify_token(&token, SECRET, TokenType::Access).is_err());
    }
}
