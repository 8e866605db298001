//! Payment ledger aggregation
//!
//! Sums persisted payments for a loan and derives the outstanding balance.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculator::DebtBreakdown;

/// Sum of payment amounts. An empty ledger is exactly zero.
pub fn total_paid<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().fold(Decimal::ZERO, |acc, amount| acc + amount)
}

/// Total debt minus what has been paid so far
pub fn outstanding_balance(total_debt: Decimal, total_paid: Decimal) -> Decimal {
    total_debt - total_paid
}

/// Total paid if a candidate payment were accepted.
///
/// Only the payment validator asks for this; every other figure is computed
/// over persisted payments alone.
pub fn projected_total_paid(total_paid: Decimal, candidate_amount: Decimal) -> Decimal {
    total_paid + candidate_amount
}

/// Debt and repayment position of a single loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoanPosition {
    pub debt: DebtBreakdown,
    pub total_paid: Decimal,
    pub outstanding_balance: Decimal,
}

impl LoanPosition {
    pub fn new<I>(debt: DebtBreakdown, payment_amounts: I) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let paid = total_paid(payment_amounts);
        Self {
            debt,
            total_paid: paid,
            outstanding_balance: outstanding_balance(debt.total_debt, paid),
        }
    }
}
