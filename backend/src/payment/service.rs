//! Payment service layer
//!
//! Every write locks the parent loan row first, so payments on one loan are
//! validated and written one at a time.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::debt::{DebtError, LoanPosition};
use crate::error::ApiError;
use crate::loan::service::lock_loan;
use crate::models::PageRequest;
use crate::payment::model::{CreatePaymentRequest, OwnedPayment, Payment, UpdatePaymentRequest};
use crate::validation::{LoanSnapshot, PaymentDraft, PaymentRejection, RuleSet};

const PAYMENT_COLUMNS: &str =
    "p.id, p.loan_id, p.payment_date, p.amount, p.is_active, p.created_at, p.updated_at";

/// Payment service errors
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment not found")]
    NotFound,

    #[error("Loan not found")]
    LoanNotFound,

    #[error(transparent)]
    Rejected(#[from] PaymentRejection),

    #[error(transparent)]
    Debt(#[from] DebtError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound | PaymentError::LoanNotFound => {
                ApiError::NotFound(err.to_string())
            }
            PaymentError::Rejected(rejection) => rejection.into(),
            PaymentError::Debt(e) => e.into(),
            PaymentError::Database(e) => e.into(),
        }
    }
}

/// Payment service
#[derive(Clone)]
pub struct PaymentService {
    db_pool: PgPool,
}

impl PaymentService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Validate and record a payment against its loan
    pub async fn record_payment(&self, request: CreatePaymentRequest) -> Result<Payment, PaymentError> {
        let mut tx = self.db_pool.begin().await?;

        let loan = lock_loan(&mut tx, request.loan_id)
            .await?
            .ok_or(PaymentError::LoanNotFound)?;

        let amounts = active_amounts(&mut tx, loan.id, None).await?;
        let position = LoanPosition::new(loan.terms().debt()?, amounts);
        let snapshot = LoanSnapshot::new(&loan.terms(), &position);

        PaymentDraft {
            loan: &snapshot,
            amount: request.amount,
            payment_date: request.payment_date,
            existing_total_paid: position.total_paid,
        }
        .check()?;

        let now = Utc::now();
        let payment: Payment = sqlx::query_as(
            r#"
            INSERT INTO payments (id, loan_id, payment_date, amount, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $5)
            RETURNING id, loan_id, payment_date, amount, is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(loan.id)
        .bind(request.payment_date)
        .bind(request.amount)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            loan_id = %loan.id,
            amount = %payment.amount,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Fetch an active payment on an active loan, with the loan's owner
    pub async fn find_payment(&self, id: Uuid) -> Result<Option<OwnedPayment>, PaymentError> {
        let payment: Option<OwnedPayment> = sqlx::query_as(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}, l.owner_id
            FROM payments p
            JOIN loans l ON l.id = p.loan_id
            WHERE p.id = $1 AND p.is_active = TRUE AND l.is_active = TRUE
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(payment)
    }

    /// Rewrite a payment. Missing fields keep their stored value and the
    /// payment being edited is left out of the loan's totals.
    pub async fn update_payment(
        &self,
        id: Uuid,
        request: UpdatePaymentRequest,
    ) -> Result<Payment, PaymentError> {
        let mut tx = self.db_pool.begin().await?;

        let loan_id: Uuid = sqlx::query_scalar(
            "SELECT loan_id FROM payments WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PaymentError::NotFound)?;

        let loan = lock_loan(&mut tx, loan_id)
            .await?
            .ok_or(PaymentError::LoanNotFound)?;

        let current: Payment = sqlx::query_as(
            r#"
            SELECT id, loan_id, payment_date, amount, is_active, created_at, updated_at
            FROM payments
            WHERE id = $1 AND is_active = TRUE
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PaymentError::NotFound)?;

        let amount = request.amount.unwrap_or(current.amount);
        let payment_date = request.payment_date.unwrap_or(current.payment_date);

        let others = active_amounts(&mut tx, loan.id, Some(id)).await?;
        let position = LoanPosition::new(loan.terms().debt()?, others);
        let snapshot = LoanSnapshot::new(&loan.terms(), &position);

        PaymentDraft {
            loan: &snapshot,
            amount,
            payment_date,
            existing_total_paid: position.total_paid,
        }
        .check()?;

        let payment: Payment = sqlx::query_as(
            r#"
            UPDATE payments
            SET amount = $1, payment_date = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, loan_id, payment_date, amount, is_active, created_at, updated_at
            "#,
        )
        .bind(amount)
        .bind(payment_date)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(payment_id = %id, loan_id = %loan.id, "Payment updated");

        Ok(payment)
    }

    /// Soft-delete a payment
    pub async fn deactivate_payment(&self, id: Uuid) -> Result<(), PaymentError> {
        let rows_affected = sqlx::query(
            "UPDATE payments SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(PaymentError::NotFound);
        }

        tracing::info!(payment_id = %id, "Payment deactivated");

        Ok(())
    }

    /// Payments across every active loan of `owner_id`, latest first
    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<Payment>, i64), PaymentError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM payments p
            JOIN loans l ON l.id = p.loan_id
            WHERE l.owner_id = $1 AND l.is_active = TRUE AND p.is_active = TRUE
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.db_pool)
        .await?;

        let payments: Vec<Payment> = sqlx::query_as(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments p
            JOIN loans l ON l.id = p.loan_id
            WHERE l.owner_id = $1 AND l.is_active = TRUE AND p.is_active = TRUE
            ORDER BY p.payment_date DESC, p.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db_pool)
        .await?;

        Ok((payments, count))
    }

    /// Payments of one loan, latest first
    pub async fn list_for_loan(
        &self,
        loan_id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<Payment>, i64), PaymentError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payments WHERE loan_id = $1 AND is_active = TRUE",
        )
        .bind(loan_id)
        .fetch_one(&self.db_pool)
        .await?;

        let payments: Vec<Payment> = sqlx::query_as(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments p
            WHERE p.loan_id = $1 AND p.is_active = TRUE
            ORDER BY p.payment_date DESC, p.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(loan_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db_pool)
        .await?;

        Ok((payments, count))
    }
}

/// Amounts of the loan's active payments, optionally leaving one out
async fn active_amounts(
    tx: &mut Transaction<'_, Postgres>,
    loan_id: Uuid,
    excluding: Option<Uuid>,
) -> Result<Vec<Decimal>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT amount
        FROM payments
        WHERE loan_id = $1 AND is_active = TRUE AND ($2::uuid IS NULL OR id <> $2)
        "#,
    )
    .bind(loan_id)
    .bind(excluding)
    .fetch_all(&mut **tx)
    .await
}
