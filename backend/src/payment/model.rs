//! Payment records and request shapes

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::validate_money;

/// Payment row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    #[serde(skip_serializing)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment joined with the owner of its loan
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedPayment {
    #[sqlx(flatten)]
    pub payment: Payment,
    pub owner_id: Uuid,
}

/// Request to record a payment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub loan_id: Uuid,

    #[validate(custom = "validate_money")]
    pub amount: Decimal,

    pub payment_date: NaiveDate,
}

/// Partial payment update. The loan a payment belongs to never changes.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    #[validate(custom = "validate_money")]
    pub amount: Option<Decimal>,

    pub payment_date: Option<NaiveDate>,
}
