//! Debt engine: installment, tax and interest calculation plus the payment
//! ledger aggregation built on top of it.

pub mod calculator;
pub mod ledger;

pub use calculator::{
    compute_debt, day_span, installment_count, DebtBreakdown, DebtError, LoanTerms,
};
pub use ledger::{outstanding_balance, projected_total_paid, total_paid, LoanPosition};
