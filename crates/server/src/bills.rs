use api_types::bill::{BillNew, BillView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Bill, NewBillCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, suppliers::status_view};

pub(crate) fn bill_view(bill: Bill) -> BillView {
    BillView {
        id: bill.id,
        supplier_id: bill.supplier_id,
        paid_minor: bill.paid_minor(),
        due_minor: bill.due_minor(),
        status: status_view(bill.status()),
        date: bill.date.fixed_offset(),
        amount_minor: bill.amount_minor,
        bill_number: bill.bill_number,
    }
}

pub async fn bill_new(
    State(state): State<ServerState>,
    Json(payload): Json<BillNew>,
) -> Result<(StatusCode, Json<BillView>), ServerError> {
    let mut cmd = NewBillCmd::new(
        payload.supplier_id,
        payload.bill_number,
        payload.amount_minor,
    );
    if let Some(date) = payload.date {
        cmd = cmd.date(date.with_timezone(&Utc));
    }
    let bill = state.engine.new_bill(cmd).await?;

    Ok((StatusCode::CREATED, Json(bill_view(bill))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(bill_id): Path<Uuid>,
) -> Result<Json<BillView>, ServerError> {
    let bill = state.engine.bill(bill_id).await?;
    Ok(Json(bill_view(bill)))
}
