//! Payment validation rules

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::{Rejection, RuleSet};
use crate::debt::{outstanding_balance, projected_total_paid, LoanPosition, LoanTerms};

/// Reasons a payment is refused. Checks run in declaration order.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRejection {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("payment predates loan origination")]
    PredatesOrigination,

    #[error("payment postdates loan maturity")]
    PostdatesMaturity,

    #[error("payment exceeds outstanding balance")]
    ExceedsOutstandingBalance,

    #[error("cumulative payments exceed total debt")]
    ExceedsTotalDebt,
}

impl Rejection for PaymentRejection {
    fn field(&self) -> &'static str {
        match self {
            PaymentRejection::PredatesOrigination | PaymentRejection::PostdatesMaturity => {
                "payment_date"
            }
            _ => "amount",
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            PaymentRejection::NonPositiveAmount => "amount_not_positive",
            PaymentRejection::PredatesOrigination => "payment_predates_origination",
            PaymentRejection::PostdatesMaturity => "payment_postdates_maturity",
            PaymentRejection::ExceedsOutstandingBalance => "exceeds_outstanding_balance",
            PaymentRejection::ExceedsTotalDebt => "exceeds_total_debt",
        }
    }
}

/// The loan figures a payment is checked against.
///
/// `total_paid` covers persisted payments only; the candidate is never part
/// of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanSnapshot {
    pub origination_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub total_debt: Decimal,
    pub total_paid: Decimal,
}

impl LoanSnapshot {
    pub fn new(terms: &LoanTerms, position: &LoanPosition) -> Self {
        Self {
            origination_date: terms.origination_date,
            maturity_date: terms.maturity_date,
            total_debt: position.debt.total_debt,
            total_paid: position.total_paid,
        }
    }

    pub fn outstanding_balance(&self) -> Decimal {
        outstanding_balance(self.total_debt, self.total_paid)
    }
}

/// A payment about to be recorded or rewritten
#[derive(Debug, Clone, Copy)]
pub struct PaymentDraft<'a> {
    pub loan: &'a LoanSnapshot,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub existing_total_paid: Decimal,
}

impl RuleSet for PaymentDraft<'_> {
    type Rejection = PaymentRejection;

    fn check(&self) -> Result<(), PaymentRejection> {
        validate_payment(
            self.loan,
            self.amount,
            self.payment_date,
            self.existing_total_paid,
        )
    }
}

/// Check a candidate payment against its loan. First failing check wins.
pub fn validate_payment(
    loan: &LoanSnapshot,
    candidate_amount: Decimal,
    candidate_date: NaiveDate,
    existing_total_paid: Decimal,
) -> Result<(), PaymentRejection> {
    if candidate_amount <= Decimal::ZERO {
        return Err(PaymentRejection::NonPositiveAmount);
    }

    if candidate_date < loan.origination_date {
        return Err(PaymentRejection::PredatesOrigination);
    }

    if candidate_date > loan.maturity_date {
        return Err(PaymentRejection::PostdatesMaturity);
    }

    if candidate_amount > loan.outstanding_balance() {
        return Err(PaymentRejection::ExceedsOutstandingBalance);
    }

    if projected_total_paid(existing_total_paid, candidate_amount) > loan.total_debt {
        return Err(PaymentRejection::ExceedsTotalDebt);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot(total_debt: Decimal, total_paid: Decimal) -> LoanSnapshot {
        LoanSnapshot {
            origination_date: date(2024, 1, 15),
            maturity_date: date(2025, 1, 15),
            total_debt,
            total_paid,
        }
    }

    #[test]
    fn test_amount_must_be_positive() {
        let loan = snapshot(dec!(5000), dec!(0));
        let on = date(2024, 6, 1);

        assert_eq!(
            validate_payment(&loan, dec!(0), on, dec!(0)),
            Err(PaymentRejection::NonPositiveAmount)
        );
        assert_eq!(
            validate_payment(&loan, dec!(-10), on, dec!(0)),
            Err(PaymentRejection::NonPositiveAmount)
        );
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let loan = snapshot(dec!(5000), dec!(0));

        assert!(validate_payment(&loan, dec!(10), loan.origination_date, dec!(0)).is_ok());
        assert!(validate_payment(&loan, dec!(10), loan.maturity_date, dec!(0)).is_ok());

        assert_eq!(
            validate_payment(
                &loan,
                dec!(10),
                loan.origination_date - Duration::days(1),
                dec!(0)
            ),
            Err(PaymentRejection::PredatesOrigination)
        );
        assert_eq!(
            validate_payment(
                &loan,
                dec!(10),
                loan.maturity_date + Duration::days(1),
                dec!(0)
            ),
            Err(PaymentRejection::PostdatesMaturity)
        );
    }

    #[test]
    fn test_amount_checked_before_dates() {
        let loan = snapshot(dec!(5000), dec!(0));
        assert_eq!(
            validate_payment(&loan, dec!(0), date(2030, 1, 1), dec!(0)),
            Err(PaymentRejection::NonPositiveAmount)
        );
    }

    #[test]
    fn test_prior_payment_limits_new_payment() {
        let loan = snapshot(dec!(5000.00), dec!(3000.00));
        let on = date(2024, 6, 1);

        assert_eq!(
            validate_payment(&loan, dec!(2500.00), on, dec!(3000.00)),
            Err(PaymentRejection::ExceedsOutstandingBalance)
        );
        assert!(validate_payment(&loan, dec!(2000.00), on, dec!(3000.00)).is_ok());
    }

    #[test]
    fn test_cumulative_total_checked_against_debt() {
        // Persisted balance still allows it, but the caller-supplied running
        // total does not.
        let loan = snapshot(dec!(5000.00), dec!(0));
        assert_eq!(
            validate_payment(&loan, dec!(2000.00), date(2024, 6, 1), dec!(4000.00)),
            Err(PaymentRejection::ExceedsTotalDebt)
        );
    }

    #[test]
    fn test_draft_rule_set() {
        let loan = snapshot(dec!(5000.00), dec!(1000.00));
        let draft = PaymentDraft {
            loan: &loan,
            amount: dec!(4000.00),
            payment_date: date(2024, 2, 1),
            existing_total_paid: dec!(1000.00),
        };
        assert!(draft.check().is_ok());
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(PaymentRejection::NonPositiveAmount.field(), "amount");
        assert_eq!(PaymentRejection::PostdatesMaturity.field(), "payment_date");
        assert_eq!(
            PaymentRejection::ExceedsTotalDebt.reason(),
            "exceeds_total_debt"
        );
        assert_eq!(
            PaymentRejection::ExceedsTotalDebt.to_string(),
            "cumulative payments exceed total debt"
        );
    }
}
