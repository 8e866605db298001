//! Loanbook Backend Library
//!
//! Consumer-loan bookkeeping: the debt engine, validation rules and the
//! HTTP API built on top of them.

pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod debt;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod state;
pub mod validation;
