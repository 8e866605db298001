//! API handlers for the Loanbook backend

pub mod auth;
pub mod health;
pub mod loans;
pub mod payments;

pub use health::{health_check, root};
