//! Authentication module for Loanbook
//!
//! - Username/password login against bcrypt hashes
//! - JWT access and refresh token generation and validation
//! - Session tracking so tokens can be revoked

mod jwt;
mod password;
mod service;

pub use jwt::{generate_access_token, generate_refresh_token, verify_token, Claims, JwtError, TokenType};
pub use password::{
    hash_password, hash_password_off_thread, verify_password, verify_password_off_thread,
};
pub use service::{AuthError, AuthService, SessionOrigin};
