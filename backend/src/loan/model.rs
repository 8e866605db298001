//! Loan records and request/response shapes

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::debt::{LoanPosition, LoanTerms};
use crate::models::validate_money;

/// Loan row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Loan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub principal: Decimal,
    /// Percent per month
    pub periodic_rate: Decimal,
    pub origination_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub source_ip: String,
    pub bank_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.principal,
            periodic_rate: self.periodic_rate,
            origination_date: self.origination_date,
            maturity_date: self.maturity_date,
        }
    }
}

/// Request to open a loan. Origination date, owner and source IP are set
/// by the server.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLoanRequest {
    #[validate(custom = "validate_money")]
    pub principal: Decimal,

    #[validate(custom = "validate_money")]
    pub periodic_rate: Decimal,

    #[validate(length(min = 1, max = 100, message = "bank name must be 1 to 100 characters"))]
    pub bank_name: String,

    pub maturity_date: NaiveDate,
}

/// Partial loan update. Only the pricing fields are mutable; anything
/// else in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLoanRequest {
    #[validate(custom = "validate_money")]
    pub principal: Option<Decimal>,

    #[validate(custom = "validate_money")]
    pub periodic_rate: Option<Decimal>,
}

impl UpdateLoanRequest {
    pub fn is_empty(&self) -> bool {
        self.principal.is_none() && self.periodic_rate.is_none()
    }
}

/// Loan with its computed debt figures
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub principal: Decimal,
    pub periodic_rate: Decimal,
    pub origination_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub bank_name: String,
    pub source_ip: String,
    pub installment_count: i64,
    pub tax: Decimal,
    pub interest: Decimal,
    pub total_debt: Decimal,
    pub total_paid: Decimal,
    pub outstanding_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanResponse {
    pub fn new(loan: Loan, position: LoanPosition) -> Self {
        Self {
            id: loan.id,
            owner_id: loan.owner_id,
            principal: loan.principal,
            periodic_rate: loan.periodic_rate,
            origination_date: loan.origination_date,
            maturity_date: loan.maturity_date,
            bank_name: loan.bank_name,
            source_ip: loan.source_ip,
            installment_count: position.debt.installments,
            tax: position.debt.tax,
            interest: position.debt.interest,
            total_debt: position.debt.total_debt,
            total_paid: position.total_paid,
            outstanding_balance: position.outstanding_balance,
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        }
    }
}

/// Live outstanding balance of a loan
#[derive(Debug, Serialize)]
pub struct OutstandingBalanceResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub outstanding_balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_loan() -> Loan {
        Loan {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            principal: dec!(100000.00),
            periodic_rate: dec!(1.80),
            origination_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            maturity_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            source_ip: "203.0.113.7".to_string(),
            bank_name: "Banco Central".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_carries_computed_figures() {
        let loan = sample_loan();
        let debt = loan.terms().debt().unwrap();
        let position = LoanPosition::new(debt, [dec!(10000.00), dec!(253.25)]);

        let response = LoanResponse::new(loan, position);
        assert_eq!(response.installment_count, 12);
        assert_eq!(response.tax, dec!(3381.20));
        assert_eq!(response.interest, dec!(27253.25));
        assert_eq!(response.total_debt, dec!(127253.25));
        assert_eq!(response.total_paid, dec!(10253.25));
        assert_eq!(response.outstanding_balance, dec!(117000.00));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_debt"], "127253.25");
    }

    #[test]
    fn test_create_request_accepts_strings_and_numbers() {
        let request: CreateLoanRequest = serde_json::from_str(
            r#"{"principal": "1000.00", "periodic_rate": 2, "bank_name": "Bank", "maturity_date": "2030-01-01"}"#,
        )
        .unwrap();
        assert_eq!(request.principal, dec!(1000.00));
        assert_eq!(request.periodic_rate, dec!(2));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_shape_checks() {
        let request = CreateLoanRequest {
            principal: dec!(10.001),
            periodic_rate: dec!(1.5),
            bank_name: String::new(),
            maturity_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("principal"));
        assert!(fields.contains_key("bank_name"));
        assert!(!fields.contains_key("periodic_rate"));
    }

    #[test]
    fn test_update_request_ignores_unknown_fields() {
        let request: UpdateLoanRequest =
            serde_json::from_str(r#"{"bank_name": "Other", "maturity_date": "2031-01-01"}"#).unwrap();
        assert!(request.is_empty());
    }
}
