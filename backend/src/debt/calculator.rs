//! Debt calculation engine
//!
//! Pure functions that turn a loan's principal, monthly rate and date range
//! into an installment count, the IOF transaction tax, interest and total debt.
//! Nothing in here touches the database; callers pass plain values in.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flat IOF rate charged once on the principal (0.38%)
pub const IOF_FLAT_RATE: Decimal = dec!(0.0038);

/// IOF accrual charged per day of the loan (0.0082% a day)
pub const IOF_DAILY_RATE: Decimal = dec!(0.000082);

/// Money figures are reported with two fractional digits
pub const MONEY_SCALE: u32 = 2;

/// Errors raised by the debt engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DebtError {
    #[error("Debt figures exceed the supported decimal range")]
    Overflow,
}

/// The inputs every debt figure is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Decimal,
    /// Percent per month (1.80 means 1.8%)
    pub periodic_rate: Decimal,
    pub origination_date: NaiveDate,
    pub maturity_date: NaiveDate,
}

impl LoanTerms {
    pub fn debt(&self) -> Result<DebtBreakdown, DebtError> {
        compute_debt(
            self.principal,
            self.periodic_rate,
            self.origination_date,
            self.maturity_date,
        )
    }
}

/// Computed debt for a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtBreakdown {
    pub installments: i64,
    /// IOF tax, already folded into `interest`
    pub tax: Decimal,
    pub interest: Decimal,
    pub total_debt: Decimal,
}

/// Whole calendar months between two dates.
///
/// Only month and year are compared, so 2024-01-31 → 2025-01-01 counts as
/// twelve installments just like 2024-01-01 → 2025-01-31.
pub fn installment_count(origination_date: NaiveDate, maturity_date: NaiveDate) -> i64 {
    let months = i64::from(maturity_date.month()) - i64::from(origination_date.month());
    let years = i64::from(maturity_date.year()) - i64::from(origination_date.year());
    months + years * 12
}

/// Number of days between origination and maturity
pub fn day_span(origination_date: NaiveDate, maturity_date: NaiveDate) -> i64 {
    (maturity_date - origination_date).num_days()
}

/// IOF tax: flat charge plus daily accrual, rounded to cents.
pub fn iof_tax(principal: Decimal, day_span: i64) -> Result<Decimal, DebtError> {
    let flat = principal.checked_mul(IOF_FLAT_RATE).ok_or(DebtError::Overflow)?;
    let accrual = principal
        .checked_mul(Decimal::from(day_span))
        .and_then(|v| v.checked_mul(IOF_DAILY_RATE))
        .ok_or(DebtError::Overflow)?;

    flat.checked_add(accrual)
        .map(|tax| tax.round_dp(MONEY_SCALE))
        .ok_or(DebtError::Overflow)
}

/// (1 + rate)^periods by square-and-multiply. Non-positive periods yield 1.
pub fn compound_factor(rate: Decimal, periods: i64) -> Result<Decimal, DebtError> {
    let mut result = Decimal::ONE;
    let mut base = Decimal::ONE.checked_add(rate).ok_or(DebtError::Overflow)?;
    let mut exp = periods.max(0) as u64;

    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(base).ok_or(DebtError::Overflow)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = base.checked_mul(base).ok_or(DebtError::Overflow)?;
        }
    }

    Ok(result)
}

/// Compute tax, interest and total debt for a loan.
///
/// Intermediate terms are kept at full precision; only the tax and the final
/// interest figure are rounded to cents. Compounding runs over the
/// installment count, while the tax accrues over the exact day span.
pub fn compute_debt(
    principal: Decimal,
    periodic_rate_percent: Decimal,
    origination_date: NaiveDate,
    maturity_date: NaiveDate,
) -> Result<DebtBreakdown, DebtError> {
    let installments = installment_count(origination_date, maturity_date);
    let days = day_span(origination_date, maturity_date);

    let tax = iof_tax(principal, days)?;

    let rate = periodic_rate_percent / dec!(100);
    let compounded = principal
        .checked_mul(compound_factor(rate, installments)?)
        .ok_or(DebtError::Overflow)?;

    let interest = (compounded - principal)
        .checked_add(tax)
        .ok_or(DebtError::Overflow)?
        .round_dp(MONEY_SCALE);

    let total_debt = principal.checked_add(interest).ok_or(DebtError::Overflow)?;

    Ok(DebtBreakdown {
        installments,
        tax,
        interest,
        total_debt,
    })
}
