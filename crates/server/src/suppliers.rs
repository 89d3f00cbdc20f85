//! Supplier endpoints: registry, overview and statement.

use api_types::{
    bill::BillStatus as BillStatusView,
    supplier::{
        StatementLine, StatementLineKind, StatementResponse, SupplierNew, SupplierOverview,
        SupplierView,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{BillStatus, NewSupplierCmd, Supplier};
use uuid::Uuid;

use crate::{ServerError, bills::bill_view, server::ServerState};

pub(crate) fn supplier_view(supplier: Supplier) -> SupplierView {
    SupplierView {
        id: supplier.id,
        name: supplier.name,
        email: supplier.email,
        phone: supplier.phone,
    }
}

pub(crate) fn status_view(status: BillStatus) -> BillStatusView {
    match status {
        BillStatus::Credit => BillStatusView::Credit,
        BillStatus::PartiallyPaid => BillStatusView::PartiallyPaid,
        BillStatus::Paid => BillStatusView::Paid,
    }
}

pub async fn supplier_new(
    State(state): State<ServerState>,
    Json(payload): Json<SupplierNew>,
) -> Result<(StatusCode, Json<SupplierView>), ServerError> {
    let mut cmd = NewSupplierCmd::new(payload.name);
    cmd.email = payload.email;
    cmd.phone = payload.phone;
    let supplier = state.engine.new_supplier(cmd).await?;

    Ok((StatusCode::CREATED, Json(supplier_view(supplier))))
}

pub async fn overview(
    State(state): State<ServerState>,
) -> Result<Json<Vec<SupplierOverview>>, ServerError> {
    let overview = state
        .engine
        .suppliers_overview()
        .await?
        .into_iter()
        .map(|entry| SupplierOverview {
            supplier: supplier_view(entry.supplier),
            bills: entry.bills.into_iter().map(bill_view).collect(),
            total_credit_minor: entry.total_credit_minor,
        })
        .collect();

    Ok(Json(overview))
}

pub async fn statement(
    State(state): State<ServerState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<StatementResponse>, ServerError> {
    let statement = state.engine.supplier_statement(supplier_id).await?;
    let closing_balance_minor = statement.closing_balance_minor();

    let lines = statement
        .lines
        .into_iter()
        .map(|line| StatementLine {
            kind: match line.kind {
                engine::StatementLineKind::Bill => StatementLineKind::Bill,
                engine::StatementLineKind::Payment => StatementLineKind::Payment,
            },
            id: line.id,
            date: line.date.fixed_offset(),
            amount_minor: line.amount_minor,
            reference: line.reference,
            status: line.status.map(status_view),
            balance_minor: line.balance_minor,
        })
        .collect();

    Ok(Json(StatementResponse {
        supplier: supplier_view(statement.supplier),
        lines,
        closing_balance_minor,
    }))
}
