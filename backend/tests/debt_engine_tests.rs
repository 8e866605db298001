//! Debt engine and validation rule scenarios
//!
//! Exercises the pure calculation and validation layers end to end, without
//! a database.

use chrono::{Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use loanbook_server::debt::{
    compute_debt, installment_count, outstanding_balance, total_paid, LoanPosition, LoanTerms,
};
use loanbook_server::validation::{
    validate_debt_terms, validate_loan, validate_payment, LoanRejection, LoanSnapshot,
    PaymentRejection,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Debt calculation
// ============================================================================

#[test]
fn test_reference_scenario() {
    let debt = compute_debt(dec!(100000.00), dec!(1.80), date(2024, 1, 15), date(2025, 1, 15)).unwrap();

    assert_eq!(debt.installments, 12);
    assert_eq!(debt.tax, dec!(3381.20));
    assert_eq!(debt.interest, dec!(27253.25));
    assert_eq!(debt.total_debt, dec!(127253.25));
}

#[test]
fn test_two_month_loan() {
    // 60 days across a leap February
    let debt = compute_debt(dec!(1000.00), dec!(2.00), date(2024, 1, 1), date(2024, 3, 1)).unwrap();

    assert_eq!(debt.installments, 2);
    assert_eq!(debt.tax, dec!(8.72));
    assert_eq!(debt.interest, dec!(49.12));
    assert_eq!(debt.total_debt, dec!(1049.12));
}

#[test]
fn test_zero_installments_charge_tax_only() {
    let debt = compute_debt(dec!(1000.00), dec!(2.00), date(2024, 3, 1), date(2024, 3, 31)).unwrap();

    assert_eq!(debt.installments, 0);
    assert_eq!(debt.interest, debt.tax);
    assert_eq!(debt.total_debt, dec!(1006.26));
}

#[test]
fn test_installments_ignore_day_of_month() {
    let d = date(2024, 5, 20);
    assert_eq!(installment_count(d, d), 0);
    assert_eq!(installment_count(date(2024, 1, 31), date(2025, 1, 1)), 12);
    assert_eq!(installment_count(date(2024, 1, 1), date(2025, 1, 31)), 12);
    assert_eq!(installment_count(date(2024, 3, 31), date(2024, 4, 1)), 1);
}

#[test]
fn test_interest_non_decreasing_in_installments() {
    let origination = date(2024, 1, 1);
    let mut previous = Decimal::ZERO;

    for months in 0..=48u32 {
        let maturity = origination
            .checked_add_months(Months::new(months))
            .unwrap()
            + Duration::days(1);
        let debt = compute_debt(dec!(2500.00), dec!(1.50), origination, maturity).unwrap();

        assert!(
            debt.interest >= previous,
            "interest dropped at {} months: {} < {}",
            months,
            debt.interest,
            previous
        );
        previous = debt.interest;
    }
}

#[test]
fn test_interest_non_decreasing_in_rate() {
    let mut previous = Decimal::ZERO;

    for step in 1..=500i64 {
        let rate = Decimal::new(step, 2);
        let debt = compute_debt(dec!(2500.00), rate, date(2024, 1, 1), date(2026, 1, 1)).unwrap();

        assert!(debt.interest >= previous, "interest dropped at rate {}", rate);
        previous = debt.interest;
    }
}

#[test]
fn test_huge_terms_are_rejected_not_panicking() {
    let terms = LoanTerms {
        principal: dec!(9999999999.99),
        periodic_rate: dec!(9999999999.99),
        origination_date: date(2024, 1, 1),
        maturity_date: date(2124, 1, 1),
    };

    assert!(terms.debt().is_err());
    assert_eq!(
        validate_debt_terms(&terms, Decimal::ZERO),
        Err(LoanRejection::DebtOutOfRange)
    );
}

// ============================================================================
// Ledger
// ============================================================================

#[test]
fn test_total_paid_is_idempotent() {
    let amounts = vec![dec!(10.00), dec!(20.50), dec!(0.25)];

    let first = total_paid(amounts.iter().copied());
    let second = total_paid(amounts.iter().copied());

    assert_eq!(first, dec!(30.75));
    assert_eq!(first, second);
    assert_eq!(total_paid(Vec::<Decimal>::new()), Decimal::ZERO);
}

#[test]
fn test_position_tracks_outstanding_balance() {
    let debt = compute_debt(dec!(100000.00), dec!(1.80), date(2024, 1, 15), date(2025, 1, 15)).unwrap();
    let position = LoanPosition::new(debt, [dec!(27253.25)]);

    assert_eq!(position.total_paid, dec!(27253.25));
    assert_eq!(position.outstanding_balance, dec!(100000.00));
    assert_eq!(
        outstanding_balance(debt.total_debt, position.total_paid),
        position.outstanding_balance
    );
}

// ============================================================================
// Payment rules
// ============================================================================

fn loan(total_debt: Decimal, total_paid: Decimal) -> LoanSnapshot {
    LoanSnapshot {
        origination_date: date(2024, 1, 15),
        maturity_date: date(2025, 1, 15),
        total_debt,
        total_paid,
    }
}

#[test]
fn test_prior_payment_scenario() {
    let snapshot = loan(dec!(5000.00), dec!(3000.00));
    let on = date(2024, 6, 1);

    assert_eq!(
        validate_payment(&snapshot, dec!(2500.00), on, dec!(3000.00)),
        Err(PaymentRejection::ExceedsOutstandingBalance)
    );
    assert!(validate_payment(&snapshot, dec!(2000.00), on, dec!(3000.00)).is_ok());
}

#[test]
fn test_cumulative_check_uses_supplied_total() {
    let snapshot = loan(dec!(5000.00), dec!(3000.00));

    assert_eq!(
        validate_payment(&snapshot, dec!(1500.00), date(2024, 6, 1), dec!(4000.00)),
        Err(PaymentRejection::ExceedsTotalDebt)
    );
}

#[test]
fn test_payment_date_boundaries() {
    let snapshot = loan(dec!(5000.00), Decimal::ZERO);

    for on in [snapshot.origination_date, snapshot.maturity_date] {
        assert!(validate_payment(&snapshot, dec!(1.00), on, Decimal::ZERO).is_ok());
    }

    assert_eq!(
        validate_payment(
            &snapshot,
            dec!(1.00),
            snapshot.origination_date - Duration::days(1),
            Decimal::ZERO
        ),
        Err(PaymentRejection::PredatesOrigination)
    );
    assert_eq!(
        validate_payment(
            &snapshot,
            dec!(1.00),
            snapshot.maturity_date + Duration::days(1),
            Decimal::ZERO
        ),
        Err(PaymentRejection::PostdatesMaturity)
    );
}

// ============================================================================
// Loan rules
// ============================================================================

#[test]
fn test_loan_validation_reports_every_field() {
    let today = date(2024, 1, 15);

    assert_eq!(
        validate_loan(dec!(0), dec!(0), today, today),
        Err(vec![
            LoanRejection::NonPositivePrincipal,
            LoanRejection::NonPositiveRate,
            LoanRejection::MaturityNotAfterRequest,
        ])
    );
}

#[test]
fn test_repricing_below_paid_rejected() {
    let terms = LoanTerms {
        principal: dec!(1000.00),
        periodic_rate: dec!(1.00),
        origination_date: date(2024, 1, 1),
        maturity_date: date(2024, 7, 1),
    };
    let debt = terms.debt().unwrap();

    assert_eq!(validate_debt_terms(&terms, debt.total_debt), Ok(debt));
    assert_eq!(
        validate_debt_terms(&terms, debt.total_debt + dec!(0.01)),
        Err(LoanRejection::TotalDebtBelowPaid)
    );
}
