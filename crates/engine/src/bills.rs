//! Bills owed to a supplier.
//!
//! A [`Bill`] tracks the original liability (`amount_minor`, fixed at
//! creation) and how much of it payments have covered so far (`paid_minor`).
//! The [`BillStatus`] is never stored independently: it is always derived from
//! `(paid_minor, amount_minor)` with [`BillStatus::derive`], and the only way
//! to change `paid_minor` is through [`Bill::apply`] and [`Bill::revert`].

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, PAID_TOLERANCE_MINOR, ResultEngine,
    util::{parse_uuid, require_amount},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Nothing (or at most the tolerance) has been paid.
    Credit,
    PartiallyPaid,
    /// Paid up to the tolerance.
    Paid,
}

impl BillStatus {
    /// Status of a bill with `amount_minor` owed and `paid_minor` covered.
    #[must_use]
    pub fn derive(paid_minor: i64, amount_minor: i64) -> Self {
        if paid_minor >= amount_minor - PAID_TOLERANCE_MINOR {
            Self::Paid
        } else if paid_minor <= PAID_TOLERANCE_MINOR {
            Self::Credit
        } else {
            Self::PartiallyPaid
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
        }
    }
}

impl TryFrom<&str> for BillStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::InvalidInput(format!(
                "invalid bill status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bill {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub bill_number: String,
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    paid_minor: i64,
}

impl Bill {
    pub fn new(
        supplier_id: Uuid,
        bill_number: String,
        amount_minor: i64,
        date: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        require_amount(amount_minor, "bill")?;
        Ok(Self {
            id: Uuid::new_v4(),
            supplier_id,
            bill_number,
            amount_minor,
            date,
            paid_minor: 0,
        })
    }

    pub fn paid_minor(&self) -> i64 {
        self.paid_minor
    }

    /// Outstanding balance (`amount − paid`).
    pub fn due_minor(&self) -> i64 {
        self.amount_minor - self.paid_minor
    }

    pub fn status(&self) -> BillStatus {
        BillStatus::derive(self.paid_minor, self.amount_minor)
    }

    /// Covers `amount_minor` more of the bill.
    pub(crate) fn apply(&mut self, amount_minor: i64) {
        self.paid_minor += amount_minor;
    }

    /// Takes back `amount_minor`, never going below zero paid.
    pub(crate) fn revert(&mut self, amount_minor: i64) {
        self.paid_minor = (self.paid_minor - amount_minor).max(0);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub supplier_id: String,
    pub bill_number: String,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub status: String,
    pub date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Suppliers,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Bill> for ActiveModel {
    fn from(bill: &Bill) -> Self {
        Self {
            id: ActiveValue::Set(bill.id.to_string()),
            supplier_id: ActiveValue::Set(bill.supplier_id.to_string()),
            bill_number: ActiveValue::Set(bill.bill_number.clone()),
            amount_minor: ActiveValue::Set(bill.amount_minor),
            paid_minor: ActiveValue::Set(bill.paid_minor),
            status: ActiveValue::Set(bill.status().as_str().to_string()),
            date: ActiveValue::Set(bill.date),
        }
    }
}

impl TryFrom<Model> for Bill {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "bill")?,
            supplier_id: parse_uuid(&model.supplier_id, "supplier")?,
            bill_number: model.bill_number,
            amount_minor: model.amount_minor,
            date: model.date,
            paid_minor: model.paid_minor,
        })
    }
}
