use api_types::{archive::ArchivedPaymentView, payment::PaymentView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::ArchivedPayment;
use uuid::Uuid;

use crate::{
    ServerError,
    payments::{allocation_views, mode_view, payment_response},
    server::ServerState,
};

pub(crate) fn archived_view(archived: &ArchivedPayment) -> ArchivedPaymentView {
    ArchivedPaymentView {
        id: archived.id,
        original_payment_id: archived.original_payment_id,
        supplier_id: archived.supplier_id,
        amount_minor: archived.amount_minor,
        date: archived.date.fixed_offset(),
        mode: mode_view(archived.mode),
        bills_allocated: allocation_views(archived.bills_allocated()),
        deleted_at: archived.deleted_at.fixed_offset(),
    }
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<ArchivedPaymentView>>, ServerError> {
    let archived = state.engine.list_archived_payments().await?;
    Ok(Json(archived.iter().map(archived_view).collect()))
}

pub async fn restore(
    State(state): State<ServerState>,
    Path(archive_id): Path<Uuid>,
) -> Result<(StatusCode, Json<PaymentView>), ServerError> {
    let payment = state.engine.restore_payment(archive_id).await?;
    Ok((StatusCode::CREATED, payment_response(&payment)))
}
