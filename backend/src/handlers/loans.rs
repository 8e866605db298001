//! Loan HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::access::authorize;
use crate::error::{ApiError, ApiResult};
use crate::loan::{
    CreateLoanRequest, Loan, LoanResponse, OutstandingBalanceResponse, UpdateLoanRequest,
};
use crate::middleware::{AuthenticatedUser, ClientIp, OptionalUser};
use crate::models::{Page, PageRequest, PaginationParams};
use crate::payment::Payment;
use crate::state::AppState;

/// Fetch an active loan the caller owns, in gate order
async fn owned_loan(state: &AppState, id: Uuid, user: &OptionalUser) -> ApiResult<Loan> {
    let loan = state.loan_service.find_loan(id).await?;
    authorize("Loan", user.user_id(), loan.as_ref().map(|l| l.owner_id))?;
    loan.ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))
}

/// POST /api/loans
pub async fn create_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ClientIp(source_ip): ClientIp,
    WithRejection(Json(req), _): WithRejection<Json<CreateLoanRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<LoanResponse>)> {
    req.validate()?;

    let today = Utc::now().date_naive();
    let (loan, position) = state
        .loan_service
        .create_loan(user.user_id, &source_ip, req, today)
        .await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::new(loan, position))))
}

/// GET /api/loans
pub async fn list_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, ApiError>,
) -> ApiResult<Json<Page<LoanResponse>>> {
    let page = PageRequest::resolve(&params, &state.pagination);
    let (loans, count) = state.loan_service.list_loans(user.user_id, page).await?;

    let results = loans
        .into_iter()
        .map(|(loan, position)| LoanResponse::new(loan, position))
        .collect();

    Ok(Json(Page::new(results, count, page, "/api/loans")))
}

/// GET /api/loans/:id
pub async fn get_loan(
    State(state): State<AppState>,
    user: OptionalUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<Json<LoanResponse>> {
    let loan = owned_loan(&state, id, &user).await?;
    let position = state.loan_service.position(&loan).await?;

    Ok(Json(LoanResponse::new(loan, position)))
}

/// PATCH /api/loans/:id
pub async fn update_loan(
    State(state): State<AppState>,
    user: OptionalUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    body: Result<Json<UpdateLoanRequest>, JsonRejection>,
) -> ApiResult<Json<LoanResponse>> {
    let loan = owned_loan(&state, id, &user).await?;
    let Json(req) = body?;
    req.validate()?;

    if req.is_empty() {
        let position = state.loan_service.position(&loan).await?;
        return Ok(Json(LoanResponse::new(loan, position)));
    }

    let (loan, position) = state.loan_service.update_loan(id, req).await?;

    Ok(Json(LoanResponse::new(loan, position)))
}

/// DELETE /api/loans/:id
pub async fn delete_loan(
    State(state): State<AppState>,
    user: OptionalUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<StatusCode> {
    owned_loan(&state, id, &user).await?;
    state.loan_service.deactivate_loan(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/loans/:id/balance
pub async fn get_loan_balance(
    State(state): State<AppState>,
    user: OptionalUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<Json<OutstandingBalanceResponse>> {
    let loan = owned_loan(&state, id, &user).await?;
    let position = state.loan_service.position(&loan).await?;

    Ok(Json(OutstandingBalanceResponse {
        id: loan.id,
        owner_id: loan.owner_id,
        outstanding_balance: position.outstanding_balance,
    }))
}

/// GET /api/loans/:id/payments
pub async fn list_loan_payments(
    State(state): State<AppState>,
    user: OptionalUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, ApiError>,
) -> ApiResult<Json<Page<Payment>>> {
    let loan = owned_loan(&state, id, &user).await?;

    let page = PageRequest::resolve(&params, &state.pagination);
    let (payments, count) = state.payment_service.list_for_loan(loan.id, page).await?;

    let path = format!("/api/loans/{}/payments", loan.id);
    Ok(Json(Page::new(payments, count, page, &path)))
}
