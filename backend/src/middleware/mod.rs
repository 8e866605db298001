//! Middleware for the Loanbook API
//!
//! Request tracing, client address extraction and authentication.

pub mod auth;
mod client_ip;
mod tracing;

pub use auth::{AuthenticatedUser, OptionalUser};
pub use client_ip::ClientIp;
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};
