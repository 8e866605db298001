//! Canonical validation rules for loans and payments
//!
//! Every write path goes through these rule sets before anything is
//! persisted. Request-shape checks (string lengths, required fields) live on
//! the DTOs via `validator`; the financial rules live here.

pub mod loan;
pub mod payment;

pub use loan::{validate_debt_terms, validate_loan, LoanDraft, LoanRejection};
pub use payment::{validate_payment, LoanSnapshot, PaymentDraft, PaymentRejection};

/// Version of the rule set below, reported by the health endpoint
pub const RULESET_VERSION: u32 = 1;

/// A set of rules evaluated against a draft record
pub trait RuleSet {
    type Rejection;

    fn check(&self) -> Result<(), Self::Rejection>;
}

/// Machine-readable description of a failed check
pub trait Rejection: std::fmt::Display {
    /// Request field the failure is attributed to
    fn field(&self) -> &'static str;

    /// Stable reason code
    fn reason(&self) -> &'static str;
}
