//! Row level access to the ledger tables.
//!
//! Every helper takes any [`ConnectionTrait`], so the same code runs against
//! the plain connection (reads) and inside a write transaction.

use std::collections::HashMap;

use chrono::TimeDelta;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Allocation, ArchivedPayment, Bill, BillBook, EngineError, Payment, PaymentListFilter,
    ResultEngine, Supplier, archived_allocations, archived_payments, bills, payment_allocations,
    payments, suppliers,
};

pub(super) async fn supplier_by_id<C: ConnectionTrait>(
    db: &C,
    supplier_id: Uuid,
) -> ResultEngine<Option<Supplier>> {
    suppliers::Entity::find_by_id(supplier_id.to_string())
        .one(db)
        .await?
        .map(Supplier::try_from)
        .transpose()
}

pub(super) async fn require_supplier<C: ConnectionTrait>(
    db: &C,
    supplier_id: Uuid,
) -> ResultEngine<Supplier> {
    supplier_by_id(db, supplier_id)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("supplier not exists".to_string()))
}

pub(super) async fn all_suppliers<C: ConnectionTrait>(db: &C) -> ResultEngine<Vec<Supplier>> {
    suppliers::Entity::find()
        .order_by_asc(suppliers::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(Supplier::try_from)
        .collect()
}

pub(super) async fn insert_supplier<C: ConnectionTrait>(
    db: &C,
    supplier: &Supplier,
) -> ResultEngine<()> {
    suppliers::ActiveModel::from(supplier).insert(db).await?;
    Ok(())
}

pub(super) async fn bill_by_id<C: ConnectionTrait>(
    db: &C,
    bill_id: Uuid,
) -> ResultEngine<Option<Bill>> {
    bills::Entity::find_by_id(bill_id.to_string())
        .one(db)
        .await?
        .map(Bill::try_from)
        .transpose()
}

/// Bills ordered by date (oldest first), optionally for one supplier.
pub(super) async fn bills_by_date<C: ConnectionTrait>(
    db: &C,
    supplier_id: Option<Uuid>,
) -> ResultEngine<Vec<Bill>> {
    let mut query = bills::Entity::find();
    if let Some(supplier_id) = supplier_id {
        query = query.filter(bills::Column::SupplierId.eq(supplier_id.to_string()));
    }
    query
        .order_by_asc(bills::Column::Date)
        .order_by_asc(bills::Column::BillNumber)
        .all(db)
        .await?
        .into_iter()
        .map(Bill::try_from)
        .collect()
}

pub(super) async fn insert_bill<C: ConnectionTrait>(db: &C, bill: &Bill) -> ResultEngine<()> {
    bills::ActiveModel::from(bill).insert(db).await?;
    Ok(())
}

/// Writes back paid amount and (derived) status.
pub(super) async fn save_bill<C: ConnectionTrait>(db: &C, bill: &Bill) -> ResultEngine<()> {
    let model = bills::ActiveModel {
        id: ActiveValue::Set(bill.id.to_string()),
        paid_minor: ActiveValue::Set(bill.paid_minor()),
        status: ActiveValue::Set(bill.status().as_str().to_string()),
        ..Default::default()
    };
    model.update(db).await?;
    Ok(())
}

/// Loads the bills an operation may touch: every bill of `supplier_id` (when
/// given) plus every bill referenced by `allocations` that still exists.
pub(super) async fn load_book<C: ConnectionTrait>(
    db: &C,
    supplier_id: Option<Uuid>,
    allocations: &[Allocation],
) -> ResultEngine<BillBook> {
    let mut book = match supplier_id {
        Some(supplier_id) => BillBook::new(bills_by_date(db, Some(supplier_id)).await?),
        None => BillBook::default(),
    };
    for allocation in allocations {
        if book.contains(&allocation.bill_id) {
            continue;
        }
        match bill_by_id(db, allocation.bill_id).await? {
            Some(bill) => book.insert(bill),
            None => tracing::debug!(bill_id = %allocation.bill_id, "allocated bill no longer exists"),
        }
    }
    Ok(book)
}

/// Persists every bill the book changed.
pub(super) async fn persist_book<C: ConnectionTrait>(db: &C, book: &BillBook) -> ResultEngine<()> {
    for bill in book.changed() {
        tracing::debug!(
            bill_id = %bill.id,
            paid_minor = bill.paid_minor(),
            status = bill.status().as_str(),
            "bill updated"
        );
        save_bill(db, bill).await?;
    }
    Ok(())
}

pub(super) async fn payment_by_id<C: ConnectionTrait>(
    db: &C,
    payment_id: Uuid,
) -> ResultEngine<Option<Payment>> {
    let Some(model) = payments::Entity::find_by_id(payment_id.to_string())
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    let allocations = payment_allocations::Entity::find()
        .filter(payment_allocations::Column::PaymentId.eq(model.id.clone()))
        .order_by_asc(payment_allocations::Column::Position)
        .all(db)
        .await?;
    Payment::from_models(model, allocations).map(Some)
}

pub(super) async fn require_payment<C: ConnectionTrait>(
    db: &C,
    payment_id: Uuid,
) -> ResultEngine<Payment> {
    payment_by_id(db, payment_id)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("payment not exists".to_string()))
}

/// Payments matching `filter`, newest first.
pub(super) async fn payments_matching<C: ConnectionTrait>(
    db: &C,
    filter: &PaymentListFilter,
) -> ResultEngine<Vec<Payment>> {
    let mut query = payments::Entity::find();
    if let Some(supplier_id) = filter.supplier_id {
        query = query.filter(payments::Column::SupplierId.eq(supplier_id.to_string()));
    }
    if let Some(mode) = filter.mode {
        query = query.filter(payments::Column::Mode.eq(mode.as_str()));
    }
    if let Some(day) = filter.day {
        let start = day
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| EngineError::InvalidInput(format!("invalid day: {day}")))?
            .and_utc();
        let end = start + TimeDelta::days(1);
        query = query
            .filter(payments::Column::Date.gte(start))
            .filter(payments::Column::Date.lt(end));
    }
    let models = query
        .order_by_desc(payments::Column::Date)
        .all(db)
        .await?;

    let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
    let mut by_payment: HashMap<String, Vec<payment_allocations::Model>> = HashMap::new();
    if !ids.is_empty() {
        let rows = payment_allocations::Entity::find()
            .filter(payment_allocations::Column::PaymentId.is_in(ids))
            .order_by_asc(payment_allocations::Column::Position)
            .all(db)
            .await?;
        for row in rows {
            by_payment.entry(row.payment_id.clone()).or_default().push(row);
        }
    }

    models
        .into_iter()
        .map(|model| {
            let allocations = by_payment.remove(&model.id).unwrap_or_default();
            Payment::from_models(model, allocations)
        })
        .collect()
}

pub(super) async fn insert_payment<C: ConnectionTrait>(
    db: &C,
    payment: &Payment,
) -> ResultEngine<()> {
    payments::ActiveModel::from(payment).insert(db).await?;
    for row in payment_allocations::active_models(payment.id, payment.bills_allocated()) {
        row.insert(db).await?;
    }
    Ok(())
}

/// Overwrites a payment row and its allocation rows.
pub(super) async fn replace_payment<C: ConnectionTrait>(
    db: &C,
    payment: &Payment,
) -> ResultEngine<()> {
    payments::ActiveModel::from(payment).update(db).await?;
    delete_payment_allocations(db, payment.id).await?;
    for row in payment_allocations::active_models(payment.id, payment.bills_allocated()) {
        row.insert(db).await?;
    }
    Ok(())
}

async fn delete_payment_allocations<C: ConnectionTrait>(
    db: &C,
    payment_id: Uuid,
) -> ResultEngine<()> {
    payment_allocations::Entity::delete_many()
        .filter(payment_allocations::Column::PaymentId.eq(payment_id.to_string()))
        .exec(db)
        .await?;
    Ok(())
}

pub(super) async fn delete_payment_row<C: ConnectionTrait>(
    db: &C,
    payment_id: Uuid,
) -> ResultEngine<()> {
    delete_payment_allocations(db, payment_id).await?;
    payments::Entity::delete_by_id(payment_id.to_string())
        .exec(db)
        .await?;
    Ok(())
}

pub(super) async fn insert_archived_payment<C: ConnectionTrait>(
    db: &C,
    archived: &ArchivedPayment,
) -> ResultEngine<()> {
    archived_payments::ActiveModel::from(archived)
        .insert(db)
        .await?;
    for row in archived_allocations::active_models(archived.id, archived.bills_allocated()) {
        row.insert(db).await?;
    }
    Ok(())
}

pub(super) async fn archived_payment_by_id<C: ConnectionTrait>(
    db: &C,
    archive_id: Uuid,
) -> ResultEngine<Option<ArchivedPayment>> {
    let Some(model) = archived_payments::Entity::find_by_id(archive_id.to_string())
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    let allocations = archived_allocations::Entity::find()
        .filter(archived_allocations::Column::ArchivedPaymentId.eq(model.id.clone()))
        .order_by_asc(archived_allocations::Column::Position)
        .all(db)
        .await?;
    ArchivedPayment::from_models(model, allocations).map(Some)
}

pub(super) async fn require_archived_payment<C: ConnectionTrait>(
    db: &C,
    archive_id: Uuid,
) -> ResultEngine<ArchivedPayment> {
    archived_payment_by_id(db, archive_id)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("archived payment not exists".to_string()))
}

/// Every archived payment, most recently deleted first.
pub(super) async fn archived_payments_by_deletion<C: ConnectionTrait>(
    db: &C,
) -> ResultEngine<Vec<ArchivedPayment>> {
    let models = archived_payments::Entity::find()
        .order_by_desc(archived_payments::Column::DeletedAt)
        .all(db)
        .await?;

    let mut by_archive: HashMap<String, Vec<archived_allocations::Model>> = HashMap::new();
    for row in archived_allocations::Entity::find()
        .order_by_asc(archived_allocations::Column::Position)
        .all(db)
        .await?
    {
        by_archive
            .entry(row.archived_payment_id.clone())
            .or_default()
            .push(row);
    }

    models
        .into_iter()
        .map(|model| {
            let allocations = by_archive.remove(&model.id).unwrap_or_default();
            ArchivedPayment::from_models(model, allocations)
        })
        .collect()
}

pub(super) async fn delete_archived_payment_row<C: ConnectionTrait>(
    db: &C,
    archive_id: Uuid,
) -> ResultEngine<()> {
    archived_allocations::Entity::delete_many()
        .filter(archived_allocations::Column::ArchivedPaymentId.eq(archive_id.to_string()))
        .exec(db)
        .await?;
    archived_payments::Entity::delete_by_id(archive_id.to_string())
        .exec(db)
        .await?;
    Ok(())
}
