//! Allocation rows of a live payment, one per bill touched.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::Allocation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub payment_id: String,
    /// Index of the allocation inside the payment.
    pub position: i32,
    pub bill_id: String,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payments::Entity",
        from = "Column::PaymentId",
        to = "super::payments::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Payments,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_models(payment_id: Uuid, allocations: &[Allocation]) -> Vec<ActiveModel> {
    allocations
        .iter()
        .zip(0..)
        .map(|(allocation, position)| ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            payment_id: ActiveValue::Set(payment_id.to_string()),
            position: ActiveValue::Set(position),
            bill_id: ActiveValue::Set(allocation.bill_id.to_string()),
            amount_minor: ActiveValue::Set(allocation.amount_minor),
        })
        .collect()
}
