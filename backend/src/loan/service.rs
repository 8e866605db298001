//! Loan service layer - persistence and repricing for loans

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::debt::{DebtError, LoanPosition, LoanTerms};
use crate::error::ApiError;
use crate::loan::model::{CreateLoanRequest, Loan, UpdateLoanRequest};
use crate::models::PageRequest;
use crate::validation::{validate_debt_terms, LoanDraft, LoanRejection, RuleSet};

const LOAN_COLUMNS: &str = "id, owner_id, principal, periodic_rate, origination_date, maturity_date, \
                            source_ip, bank_name, is_active, created_at, updated_at";

/// Loan service errors
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Loan not found")]
    NotFound,

    #[error("Loan rejected")]
    Rejected(Vec<LoanRejection>),

    #[error(transparent)]
    Debt(#[from] DebtError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<LoanRejection> for LoanError {
    fn from(rejection: LoanRejection) -> Self {
        LoanError::Rejected(vec![rejection])
    }
}

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::NotFound => ApiError::NotFound(err.to_string()),
            LoanError::Rejected(rejections) => rejections.into(),
            LoanError::Debt(e) => e.into(),
            LoanError::Database(e) => e.into(),
        }
    }
}

/// Loan service for managing loan records
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Open a loan for `owner_id`, originated on `today`
    pub async fn create_loan(
        &self,
        owner_id: Uuid,
        source_ip: &str,
        request: CreateLoanRequest,
        today: NaiveDate,
    ) -> Result<(Loan, LoanPosition), LoanError> {
        LoanDraft {
            principal: request.principal,
            periodic_rate: request.periodic_rate,
            maturity_date: request.maturity_date,
            reference_date: today,
        }
        .check()
        .map_err(LoanError::Rejected)?;

        let terms = LoanTerms {
            principal: request.principal,
            periodic_rate: request.periodic_rate,
            origination_date: today,
            maturity_date: request.maturity_date,
        };
        let debt = validate_debt_terms(&terms, Decimal::ZERO)?;

        let now = Utc::now();
        let loan: Loan = sqlx::query_as(&format!(
            r#"
            INSERT INTO loans (id, owner_id, principal, periodic_rate, origination_date, maturity_date,
                               source_ip, bank_name, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $9)
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(request.principal)
        .bind(request.periodic_rate)
        .bind(today)
        .bind(request.maturity_date)
        .bind(source_ip)
        .bind(request.bank_name.trim())
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            loan_id = %loan.id,
            owner_id = %owner_id,
            total_debt = %debt.total_debt,
            "Loan created"
        );

        Ok((loan, LoanPosition::new(debt, std::iter::empty())))
    }

    /// Fetch an active loan
    pub async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, LoanError> {
        let loan: Option<Loan> = sqlx::query_as(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(loan)
    }

    /// Debt and repayment position computed from the active payments
    pub async fn position(&self, loan: &Loan) -> Result<LoanPosition, LoanError> {
        let amounts: Vec<Decimal> = sqlx::query_scalar(
            "SELECT amount FROM payments WHERE loan_id = $1 AND is_active = TRUE",
        )
        .bind(loan.id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(LoanPosition::new(loan.terms().debt()?, amounts))
    }

    /// Reprice a loan. Missing fields keep their stored value and the
    /// maturity check runs against the stored origination date.
    pub async fn update_loan(
        &self,
        id: Uuid,
        request: UpdateLoanRequest,
    ) -> Result<(Loan, LoanPosition), LoanError> {
        let mut tx = self.db_pool.begin().await?;

        let loan = lock_loan(&mut tx, id).await?.ok_or(LoanError::NotFound)?;

        let principal = request.principal.unwrap_or(loan.principal);
        let periodic_rate = request.periodic_rate.unwrap_or(loan.periodic_rate);

        LoanDraft {
            principal,
            periodic_rate,
            maturity_date: loan.maturity_date,
            reference_date: loan.origination_date,
        }
        .check()
        .map_err(LoanError::Rejected)?;

        let amounts: Vec<Decimal> = sqlx::query_scalar(
            "SELECT amount FROM payments WHERE loan_id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        let paid = crate::debt::total_paid(amounts.iter().copied());

        let terms = LoanTerms {
            principal,
            periodic_rate,
            ..loan.terms()
        };
        let debt = validate_debt_terms(&terms, paid)?;

        let updated: Loan = sqlx::query_as(&format!(
            r#"
            UPDATE loans
            SET principal = $1, periodic_rate = $2, updated_at = $3
            WHERE id = $4
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(principal)
        .bind(periodic_rate)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = %id, total_debt = %debt.total_debt, "Loan repriced");

        Ok((updated, LoanPosition::new(debt, amounts)))
    }

    /// Soft-delete a loan
    pub async fn deactivate_loan(&self, id: Uuid) -> Result<(), LoanError> {
        let rows_affected = sqlx::query(
            "UPDATE loans SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(LoanError::NotFound);
        }

        tracing::info!(loan_id = %id, "Loan deactivated");

        Ok(())
    }

    /// One page of the owner's active loans, newest origination first,
    /// with the total count
    pub async fn list_loans(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<(Loan, LoanPosition)>, i64), LoanError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE owner_id = $1 AND is_active = TRUE",
        )
        .bind(owner_id)
        .fetch_one(&self.db_pool)
        .await?;

        let loans: Vec<Loan> = sqlx::query_as(&format!(
            r#"
            SELECT {LOAN_COLUMNS}
            FROM loans
            WHERE owner_id = $1 AND is_active = TRUE
            ORDER BY origination_date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db_pool)
        .await?;

        let ids: Vec<Uuid> = loans.iter().map(|loan| loan.id).collect();
        let totals: HashMap<Uuid, Decimal> = sqlx::query_as::<_, (Uuid, Decimal)>(
            r#"
            SELECT loan_id, SUM(amount)
            FROM payments
            WHERE loan_id = ANY($1) AND is_active = TRUE
            GROUP BY loan_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?
        .into_iter()
        .collect();

        let results = loans
            .into_iter()
            .map(|loan| -> Result<_, LoanError> {
                let debt = loan.terms().debt()?;
                let paid = totals.get(&loan.id).copied();
                Ok((loan, LoanPosition::new(debt, paid)))
            })
            .collect::<Result<Vec<_>, LoanError>>()?;

        Ok((results, count))
    }
}

/// Lock an active loan row for the rest of the transaction
pub(crate) async fn lock_loan(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Loan>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {LOAN_COLUMNS} FROM loans WHERE id = $1 AND is_active = TRUE FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_loan_errors_map_to_status() {
        assert_eq!(
            ApiError::from(LoanError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(LoanError::Rejected(vec![
                LoanRejection::NonPositivePrincipal,
                LoanRejection::NonPositiveRate,
            ]))
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LoanError::Debt(DebtError::Overflow)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejections_keep_every_field() {
        let err = ApiError::from(LoanError::Rejected(vec![
            LoanRejection::NonPositivePrincipal,
            LoanRejection::MaturityNotAfterRequest,
        ]));
        match err {
            ApiError::Validation(violations) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["principal", "maturity_date"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
