//! Allocation rows frozen with an archived payment.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::Allocation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "archived_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub archived_payment_id: String,
    pub position: i32,
    pub bill_id: String,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::archived_payments::Entity",
        from = "Column::ArchivedPaymentId",
        to = "super::archived_payments::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ArchivedPayments,
}

impl Related<super::archived_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArchivedPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_models(
    archived_payment_id: Uuid,
    allocations: &[Allocation],
) -> Vec<ActiveModel> {
    allocations
        .iter()
        .zip(0..)
        .map(|(allocation, position)| ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            archived_payment_id: ActiveValue::Set(archived_payment_id.to_string()),
            position: ActiveValue::Set(position),
            bill_id: ActiveValue::Set(allocation.bill_id.to_string()),
            amount_minor: ActiveValue::Set(allocation.amount_minor),
        })
        .collect()
}
