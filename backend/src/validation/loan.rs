//! Loan validation rules

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::{Rejection, RuleSet};
use crate::debt::{DebtBreakdown, LoanTerms};

/// Reasons a loan is refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanRejection {
    #[error("principal must be greater than zero")]
    NonPositivePrincipal,

    #[error("rate must be greater than zero")]
    NonPositiveRate,

    #[error("maturity date must be after request date")]
    MaturityNotAfterRequest,

    #[error("loan terms exceed the supported range")]
    DebtOutOfRange,

    #[error("total debt would fall below the amount already paid")]
    TotalDebtBelowPaid,
}

impl Rejection for LoanRejection {
    fn field(&self) -> &'static str {
        match self {
            LoanRejection::NonPositiveRate => "periodic_rate",
            LoanRejection::MaturityNotAfterRequest => "maturity_date",
            _ => "principal",
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            LoanRejection::NonPositivePrincipal => "principal_not_positive",
            LoanRejection::NonPositiveRate => "rate_not_positive",
            LoanRejection::MaturityNotAfterRequest => "maturity_not_after_request",
            LoanRejection::DebtOutOfRange => "debt_out_of_range",
            LoanRejection::TotalDebtBelowPaid => "total_debt_below_total_paid",
        }
    }
}

/// Loan fields as submitted on creation or patch
#[derive(Debug, Clone, Copy)]
pub struct LoanDraft {
    pub principal: Decimal,
    pub periodic_rate: Decimal,
    pub maturity_date: NaiveDate,
    /// Today on creation, the stored origination date on patch
    pub reference_date: NaiveDate,
}

impl RuleSet for LoanDraft {
    type Rejection = Vec<LoanRejection>;

    fn check(&self) -> Result<(), Vec<LoanRejection>> {
        validate_loan(
            self.principal,
            self.periodic_rate,
            self.maturity_date,
            self.reference_date,
        )
    }
}

/// Field-level loan checks. Every failing field is reported.
pub fn validate_loan(
    principal: Decimal,
    periodic_rate: Decimal,
    maturity_date: NaiveDate,
    reference_date: NaiveDate,
) -> Result<(), Vec<LoanRejection>> {
    let mut rejections = Vec::new();

    if principal <= Decimal::ZERO {
        rejections.push(LoanRejection::NonPositivePrincipal);
    }

    if periodic_rate <= Decimal::ZERO {
        rejections.push(LoanRejection::NonPositiveRate);
    }

    if maturity_date <= reference_date {
        rejections.push(LoanRejection::MaturityNotAfterRequest);
    }

    if rejections.is_empty() {
        Ok(())
    } else {
        Err(rejections)
    }
}

/// Compute the debt for terms that already passed `validate_loan` and make
/// sure it still covers what was paid.
pub fn validate_debt_terms(
    terms: &LoanTerms,
    total_paid: Decimal,
) -> Result<DebtBreakdown, LoanRejection> {
    let debt = terms.debt().map_err(|_| LoanRejection::DebtOutOfRange)?;

    if debt.total_debt < total_paid {
        return Err(LoanRejection::TotalDebtBelowPaid);
    }

    Ok(debt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_loan() {
        assert!(validate_loan(dec!(100000), dec!(1.8), date(2025, 1, 15), date(2024, 1, 15)).is_ok());
    }

    #[test]
    fn test_each_field_rejected() {
        let today = date(2024, 1, 15);

        assert_eq!(
            validate_loan(dec!(0), dec!(1.8), date(2025, 1, 15), today),
            Err(vec![LoanRejection::NonPositivePrincipal])
        );
        assert_eq!(
            validate_loan(dec!(1000), dec!(-2.5), date(2025, 1, 15), today),
            Err(vec![LoanRejection::NonPositiveRate])
        );
        assert_eq!(
            validate_loan(dec!(1000), dec!(2.5), today, today),
            Err(vec![LoanRejection::MaturityNotAfterRequest])
        );
    }

    #[test]
    fn test_all_failures_reported_together() {
        let draft = LoanDraft {
            principal: dec!(-1),
            periodic_rate: dec!(0),
            maturity_date: date(2023, 1, 15),
            reference_date: date(2024, 1, 15),
        };

        let rejections = draft.check().unwrap_err();
        assert_eq!(rejections.len(), 3);
        let fields: Vec<_> = rejections.iter().map(|r| r.field()).collect();
        assert_eq!(fields, vec!["principal", "periodic_rate", "maturity_date"]);
    }

    #[test]
    fn test_repricing_below_total_paid() {
        let terms = LoanTerms {
            principal: dec!(1000),
            periodic_rate: dec!(1),
            origination_date: date(2024, 1, 15),
            maturity_date: date(2024, 7, 15),
        };

        let debt = validate_debt_terms(&terms, dec!(0)).unwrap();
        assert!(debt.total_debt > dec!(1000));

        assert_eq!(
            validate_debt_terms(&terms, dec!(5000)),
            Err(LoanRejection::TotalDebtBelowPaid)
        );
    }
}
