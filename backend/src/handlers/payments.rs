//! Payment HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use crate::access::authorize;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthenticatedUser, OptionalUser};
use crate::models::{Page, PageRequest, PaginationParams};
use crate::payment::{CreatePaymentRequest, Payment, UpdatePaymentRequest};
use crate::state::AppState;

/// Fetch an active payment whose loan the caller owns, in gate order
async fn owned_payment(state: &AppState, id: Uuid, user: &OptionalUser) -> ApiResult<Payment> {
    let found = state.payment_service.find_payment(id).await?;
    authorize("Payment", user.user_id(), found.as_ref().map(|p| p.owner_id))?;
    found
        .map(|owned| owned.payment)
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))
}

/// POST /api/payments
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): WithRejection<Json<CreatePaymentRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    req.validate()?;

    let loan = state.loan_service.find_loan(req.loan_id).await?;
    authorize("Loan", Some(user.user_id), loan.map(|l| l.owner_id))?;

    let payment = state.payment_service.record_payment(req).await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/payments
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, ApiError>,
) -> ApiResult<Json<Page<Payment>>> {
    let page = PageRequest::resolve(&params, &state.pagination);
    let (payments, count) = state
        .payment_service
        .list_for_owner(user.user_id, page)
        .await?;

    Ok(Json(Page::new(payments, count, page, "/api/payments")))
}

/// GET /api/payments/:id
pub async fn get_payment(
    State(state): State<AppState>,
    user: OptionalUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<Json<Payment>> {
    let payment = owned_payment(&state, id, &user).await?;

    Ok(Json(payment))
}

/// PATCH /api/payments/:id
pub async fn update_payment(
    State(state): State<AppState>,
    user: OptionalUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    body: Result<Json<UpdatePaymentRequest>, JsonRejection>,
) -> ApiResult<Json<Payment>> {
    owned_payment(&state, id, &user).await?;
    let Json(req) = body?;
    req.validate()?;

    let payment = state.payment_service.update_payment(id, req).await?;

    Ok(Json(payment))
}

/// DELETE /api/payments/:id
pub async fn delete_payment(
    State(state): State<AppState>,
    user: OptionalUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<StatusCode> {
    owned_payment(&state, id, &user).await?;
    state.payment_service.deactivate_payment(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
