//! Archive of deleted payments.
//!
//! Deleting a payment reverts its effect on bills and keeps a frozen copy of
//! it here, so it can be restored later as a brand new payment.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Allocation, Payment, PaymentMode, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchivedPayment {
    pub id: Uuid,
    pub original_payment_id: Uuid,
    pub supplier_id: Uuid,
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub mode: PaymentMode,
    pub deleted_at: DateTime<Utc>,
    bills_allocated: Vec<Allocation>,
}

impl ArchivedPayment {
    /// Snapshot of `payment`, deleted at `deleted_at`.
    pub fn from_payment(payment: &Payment, deleted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_payment_id: payment.id,
            supplier_id: payment.supplier_id,
            amount_minor: payment.amount_minor,
            date: payment.date,
            mode: payment.mode,
            deleted_at,
            bills_allocated: payment.bills_allocated().to_vec(),
        }
    }

    pub fn bills_allocated(&self) -> &[Allocation] {
        &self.bills_allocated
    }

    /// A new payment (new identity) carrying the archived data.
    pub(crate) fn to_restored_payment(&self) -> ResultEngine<Payment> {
        Payment::new(
            self.supplier_id,
            self.amount_minor,
            self.date,
            self.mode,
            self.bills_allocated.clone(),
        )
    }

    pub(crate) fn from_models(
        model: Model,
        allocations: Vec<super::archived_allocations::Model>,
    ) -> ResultEngine<Self> {
        let bills_allocated = allocations
            .into_iter()
            .map(|row| Ok(Allocation::new(parse_uuid(&row.bill_id, "bill")?, row.amount_minor)))
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(Self {
            id: parse_uuid(&model.id, "archived payment")?,
            original_payment_id: parse_uuid(&model.original_payment_id, "payment")?,
            supplier_id: parse_uuid(&model.supplier_id, "supplier")?,
            amount_minor: model.amount_minor,
            date: model.date,
            mode: PaymentMode::try_from(model.mode.as_str())?,
            deleted_at: model.deleted_at,
            bills_allocated,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "archived_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub original_payment_id: String,
    pub supplier_id: String,
    pub amount_minor: i64,
    pub date: DateTimeUtc,
    pub mode: String,
    pub deleted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::archived_allocations::Entity")]
    Allocations,
}

impl Related<super::archived_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ArchivedPayment> for ActiveModel {
    fn from(archived: &ArchivedPayment) -> Self {
        Self {
            id: ActiveValue::Set(archived.id.to_string()),
            original_payment_id: ActiveValue::Set(archived.original_payment_id.to_string()),
            supplier_id: ActiveValue::Set(archived.supplier_id.to_string()),
            amount_minor: ActiveValue::Set(archived.amount_minor),
            date: ActiveValue::Set(archived.date),
            mode: ActiveValue::Set(archived.mode.as_str().to_string()),
            deleted_at: ActiveValue::Set(archived.deleted_at),
        }
    }
}
