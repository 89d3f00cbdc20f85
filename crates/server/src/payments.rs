//! Payment endpoints: create, edit, delete (to archive) and history.

use api_types::payment::{
    AllocationView, DirectiveView, PaymentList, PaymentMode as PaymentModeView, PaymentNew,
    PaymentUpdate, PaymentView,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    Allocation, CreatePaymentCmd, Directive, Payment, PaymentListFilter, PaymentMode,
    UpdatePaymentCmd,
};
use uuid::Uuid;

use crate::{ServerError, archive::archived_view, server::ServerState};

pub(crate) fn mode_from_view(mode: PaymentModeView) -> PaymentMode {
    match mode {
        PaymentModeView::Cash => PaymentMode::Cash,
        PaymentModeView::Upi => PaymentMode::Upi,
        PaymentModeView::BankTransfer => PaymentMode::BankTransfer,
        PaymentModeView::Cheque => PaymentMode::Cheque,
        PaymentModeView::Other => PaymentMode::Other,
    }
}

pub(crate) fn mode_view(mode: PaymentMode) -> PaymentModeView {
    match mode {
        PaymentMode::Cash => PaymentModeView::Cash,
        PaymentMode::Upi => PaymentModeView::Upi,
        PaymentMode::BankTransfer => PaymentModeView::BankTransfer,
        PaymentMode::Cheque => PaymentModeView::Cheque,
        PaymentMode::Other => PaymentModeView::Other,
    }
}

pub(crate) fn allocation_views(allocations: &[Allocation]) -> Vec<AllocationView> {
    allocations
        .iter()
        .map(|a| AllocationView {
            bill_id: a.bill_id,
            amount_minor: a.amount_minor,
        })
        .collect()
}

fn directives(views: Vec<DirectiveView>) -> Vec<Directive> {
    views
        .into_iter()
        .map(|d| Directive {
            bill_id: d.bill_id,
            manual_amount_minor: d.manual_amount_minor,
        })
        .collect()
}

fn payment_view(payment: &Payment) -> PaymentView {
    PaymentView {
        id: payment.id,
        supplier_id: payment.supplier_id,
        amount_minor: payment.amount_minor,
        date: payment.date.fixed_offset(),
        mode: mode_view(payment.mode),
        bills_allocated: allocation_views(payment.bills_allocated()),
        unallocated_minor: payment.unallocated_minor(),
    }
}

pub(crate) fn payment_response(payment: &Payment) -> Json<PaymentView> {
    Json(payment_view(payment))
}

pub async fn payment_new(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentNew>,
) -> Result<(StatusCode, Json<PaymentView>), ServerError> {
    let cmd = CreatePaymentCmd {
        supplier_id: payload.supplier_id,
        amount_minor: payload.amount_minor,
        date: payload.date.map(|d| d.with_timezone(&Utc)),
        mode: payload.mode.map(mode_from_view),
        directives: directives(payload.directives),
    };
    let payment = state.engine.create_payment(cmd).await?;

    Ok((StatusCode::CREATED, payment_response(&payment)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<PaymentUpdate>,
) -> Result<Json<PaymentView>, ServerError> {
    let cmd = UpdatePaymentCmd {
        payment_id,
        amount_minor: payload.amount_minor,
        date: payload.date.map(|d| d.with_timezone(&Utc)),
        mode: payload.mode.map(mode_from_view),
        directives: directives(payload.directives),
    };
    let payment = state.engine.update_payment(cmd).await?;

    Ok(payment_response(&payment))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<api_types::archive::ArchivedPaymentView>, ServerError> {
    let archived = state.engine.delete_payment(payment_id).await?;
    Ok(Json(archived_view(&archived)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentView>, ServerError> {
    let payment = state.engine.payment(payment_id).await?;
    Ok(payment_response(&payment))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<PaymentList>, QueryRejection>,
) -> Result<Json<Vec<PaymentView>>, ServerError> {
    let Query(query) = query?;
    let filter = PaymentListFilter {
        supplier_id: query.supplier_id,
        mode: query.mode.map(mode_from_view),
        day: query.day,
    };
    let payments = state.engine.list_payments(&filter).await?;

    Ok(Json(payments.iter().map(payment_view).collect()))
}
