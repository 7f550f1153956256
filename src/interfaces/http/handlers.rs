use crate::application::auth::Caller;
use crate::application::engine::LedgerEngine;
use crate::application::reporting::PageRequest;
use crate::domain::payment_account::DestinationInput;
use crate::domain::payout::{PayoutId, PayoutStatus};
use crate::domain::revenue::Order;
use crate::error::{LedgerError, Result};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub type AppState = Arc<LedgerEngine>;

const ALREADY_PROCESSED: &str = "already processed";

fn payload<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| LedgerError::validation(rejection.body_text()))
}

fn path<T>(segment: std::result::Result<Path<T>, PathRejection>) -> Result<T> {
    segment
        .map(|Path(value)| value)
        .map_err(|rejection| LedgerError::validation(rejection.body_text()))
}

fn query<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| LedgerError::validation(rejection.body_text()))
}

#[derive(Debug, Deserialize)]
pub struct PayoutRequestBody {
    pub amount: Decimal,
    #[serde(flatten)]
    pub destination: DestinationInput,
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

pub async fn wallet(State(engine): State<AppState>, caller: Caller) -> Result<Response> {
    let summary = engine.wallet_summary(&caller).await?;
    Ok(Json(summary).into_response())
}

pub async fn wallet_transactions(
    State(engine): State<AppState>,
    caller: Caller,
    params: std::result::Result<Query<PageRequest>, QueryRejection>,
) -> Result<Response> {
    let page = engine.wallet_transactions(&caller, query(params)?).await?;
    Ok(Json(page).into_response())
}

pub async fn payouts(State(engine): State<AppState>, caller: Caller) -> Result<Response> {
    let payouts = engine.payout_history(&caller).await?;
    Ok(Json(payouts).into_response())
}

pub async fn payment_account(State(engine): State<AppState>, caller: Caller) -> Result<Response> {
    let account = engine.payment_account(&caller).await?;
    Ok(Json(account).into_response())
}

pub async fn update_payment_account(
    State(engine): State<AppState>,
    caller: Caller,
    body: std::result::Result<Json<DestinationInput>, JsonRejection>,
) -> Result<Response> {
    let account = engine
        .update_payment_account(&caller, payload(body)?)
        .await?;
    Ok(Json(account).into_response())
}

pub async fn request_payout(
    State(engine): State<AppState>,
    caller: Caller,
    body: std::result::Result<Json<PayoutRequestBody>, JsonRejection>,
) -> Result<Response> {
    let PayoutRequestBody {
        amount,
        destination,
    } = payload(body)?;
    let receipt = engine.request_payout(&caller, amount, destination).await?;
    let body = json!({
        "message": "payout requested",
        "payout_id": receipt.payout.id,
        "status": receipt.payout.status,
        "amount_blocked": receipt.amount_blocked,
        "new_withdrawable_balance": receipt.new_withdrawable_balance,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn approve_payout(
    State(engine): State<AppState>,
    caller: Caller,
    id: std::result::Result<Path<PayoutId>, PathRejection>,
) -> Result<Response> {
    let payout = engine.approve(&caller, path(id)?).await?;
    Ok(Json(payout).into_response())
}

pub async fn mark_paid(
    State(engine): State<AppState>,
    caller: Caller,
    id: std::result::Result<Path<PayoutId>, PathRejection>,
) -> Result<Response> {
    let outcome = engine.mark_paid(&caller, path(id)?).await?;
    let message = if outcome.is_already_processed() {
        ALREADY_PROCESSED
    } else {
        "payout marked paid"
    };
    let body = json!({ "message": message, "payout": outcome.into_inner() });
    Ok(Json(body).into_response())
}

pub async fn reject_payout(
    State(engine): State<AppState>,
    caller: Caller,
    id: std::result::Result<Path<PayoutId>, PathRejection>,
) -> Result<Response> {
    let payout = engine.reject(&caller, path(id)?).await?;
    Ok(Json(payout).into_response())
}

pub async fn admin_payouts(
    State(engine): State<AppState>,
    caller: Caller,
    params: std::result::Result<Query<StatusFilter>, QueryRejection>,
) -> Result<Response> {
    let status = query(params)?
        .status
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<PayoutStatus>())
        .transpose()?;
    let payouts = engine.admin_payouts(&caller, status).await?;
    Ok(Json(payouts).into_response())
}

pub async fn pending_payouts(State(engine): State<AppState>, caller: Caller) -> Result<Response> {
    let payouts = engine.pending_payouts(&caller).await?;
    Ok(Json(payouts).into_response())
}

pub async fn settled_payouts(State(engine): State<AppState>, caller: Caller) -> Result<Response> {
    let payouts = engine.settled_payouts(&caller).await?;
    Ok(Json(payouts).into_response())
}

pub async fn revenue_total(State(engine): State<AppState>, caller: Caller) -> Result<Response> {
    let totals = engine.revenue_totals(&caller).await?;
    Ok(Json(totals).into_response())
}

pub async fn revenue_by_course(State(engine): State<AppState>, caller: Caller) -> Result<Response> {
    let rows = engine.revenue_by_course(&caller).await?;
    Ok(Json(rows).into_response())
}

pub async fn revenue_by_instructor(
    State(engine): State<AppState>,
    caller: Caller,
) -> Result<Response> {
    let rows = engine.revenue_by_instructor(&caller).await?;
    Ok(Json(rows).into_response())
}

pub async fn revenue_transactions(
    State(engine): State<AppState>,
    caller: Caller,
) -> Result<Response> {
    let rows = engine.revenue_transactions(&caller).await?;
    Ok(Json(rows).into_response())
}

/// Called by the payment collaborator once an order is confirmed paid.
pub async fn order_completed(
    State(engine): State<AppState>,
    caller: Caller,
    body: std::result::Result<Json<Order>, JsonRejection>,
) -> Result<Response> {
    let order = payload(body)?;
    let outcome = engine.recognize_revenue(&caller, &order).await?;
    if outcome.is_already_processed() {
        let body = json!({ "message": ALREADY_PROCESSED, "revenue": outcome.into_inner() });
        return Ok(Json(body).into_response());
    }
    Ok((StatusCode::CREATED, Json(outcome.into_inner())).into_response())
}
