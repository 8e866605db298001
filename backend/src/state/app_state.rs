//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::AuthService;
use crate::loan::LoanService;
use crate::models::PaginationSettings;
use crate::payment::PaymentService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub loan_service: Arc<LoanService>,
    pub payment_service: Arc<PaymentService>,
    pub auth_service: Arc<AuthService>,
    pub db_pool: PgPool,
    pub pagination: PaginationSettings,
}

impl AppState {
    pub fn new(
        loan_service: Arc<LoanService>,
        payment_service: Arc<PaymentService>,
        auth_service: Arc<AuthService>,
        db_pool: PgPool,
        pagination: PaginationSettings,
    ) -> Self {
        Self {
            loan_service,
            payment_service,
            auth_service,
            db_pool,
            pagination,
        }
    }

    /// Build every service over one pool
    pub fn from_pool(
        db_pool: PgPool,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_days: i64,
        pagination: PaginationSettings,
    ) -> Self {
        Self::new(
            Arc::new(LoanService::new(db_pool.clone())),
            Arc::new(PaymentService::new(db_pool.clone())),
            Arc::new(AuthService::new(
                db_pool.clone(),
                jwt_secret,
                access_token_ttl_seconds,
                refresh_token_ttl_days,
            )),
            db_pool,
            pagination,
        )
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
