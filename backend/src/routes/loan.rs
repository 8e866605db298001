//! Loan route definitions

use axum::{routing::get, Router};

use crate::handlers::loans::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route(
            "/api/loans/:id",
            get(get_loan).patch(update_loan).delete(delete_loan),
        )
        .route("/api/loans/:id/balance", get(get_loan_balance))
        .route("/api/loans/:id/payments", get(list_loan_payments))
}
