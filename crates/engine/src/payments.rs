//! Payments made to a supplier.
//!
//! A [`Payment`] records the amount paid and *exactly* how it was split across
//! bills (`bills_allocated`). That split is the only input used to undo the
//! payment later: it is written once when the payment is created (or edited)
//! and never recomputed from bill state.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_uuid, require_amount},
};

/// Channel a payment went through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Upi,
    BankTransfer,
    Cheque,
    #[default]
    Other,
}

impl PaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Upi => "upi",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::Other => "other",
        }
    }

    /// Human readable label, used as reference on statements.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Upi => "UPI",
            Self::BankTransfer => "Bank Transfer",
            Self::Cheque => "Cheque",
            Self::Other => "Other",
        }
    }
}

impl TryFrom<&str> for PaymentMode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "upi" => Ok(Self::Upi),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cheque" => Ok(Self::Cheque),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidInput(format!(
                "invalid payment mode: {other}"
            ))),
        }
    }
}

/// The part of a payment applied to one bill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub bill_id: Uuid,
    pub amount_minor: i64,
}

impl Allocation {
    pub fn new(bill_id: Uuid, amount_minor: i64) -> Self {
        Self {
            bill_id,
            amount_minor,
        }
    }
}

pub(crate) fn allocated_total(allocations: &[Allocation]) -> i64 {
    allocations.iter().map(|a| a.amount_minor).sum()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub mode: PaymentMode,
    bills_allocated: Vec<Allocation>,
}

impl Payment {
    pub fn new(
        supplier_id: Uuid,
        amount_minor: i64,
        date: DateTime<Utc>,
        mode: PaymentMode,
        bills_allocated: Vec<Allocation>,
    ) -> ResultEngine<Self> {
        Self::with_id(
            Uuid::new_v4(),
            supplier_id,
            amount_minor,
            date,
            mode,
            bills_allocated,
        )
    }

    pub(crate) fn with_id(
        id: Uuid,
        supplier_id: Uuid,
        amount_minor: i64,
        date: DateTime<Utc>,
        mode: PaymentMode,
        bills_allocated: Vec<Allocation>,
    ) -> ResultEngine<Self> {
        require_amount(amount_minor, "payment")?;
        if allocated_total(&bills_allocated) > amount_minor {
            return Err(EngineError::InvalidInput(format!(
                "allocations exceed payment amount of {amount_minor}"
            )));
        }
        Ok(Self {
            id,
            supplier_id,
            amount_minor,
            date,
            mode,
            bills_allocated,
        })
    }

    /// How this payment was split across bills, in allocation order.
    pub fn bills_allocated(&self) -> &[Allocation] {
        &self.bills_allocated
    }

    pub fn allocated_minor(&self) -> i64 {
        allocated_total(&self.bills_allocated)
    }

    /// Part of the amount that no bill absorbed.
    pub fn unallocated_minor(&self) -> i64 {
        self.amount_minor - self.allocated_minor()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub supplier_id: String,
    pub amount_minor: i64,
    pub date: DateTimeUtc,
    pub mode: String,
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
    #[sea_orm(has_many = "super::payment_allocations::Entity")]
    Allocations,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl Related<super::payment_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    fn from(payment: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            supplier_id: ActiveValue::Set(payment.supplier_id.to_string()),
            amount_minor: ActiveValue::Set(payment.amount_minor),
            date: ActiveValue::Set(payment.date),
            mode: ActiveValue::Set(payment.mode.as_str().to_string()),
        }
    }
}

impl Payment {
    /// Rebuilds a payment from its row and its allocation rows (already in
    /// `position` order).
    pub(crate) fn from_models(
        model: Model,
        allocations: Vec<super::payment_allocations::Model>,
    ) -> ResultEngine<Self> {
        let bills_allocated = allocations
            .into_iter()
            .map(|row| Ok(Allocation::new(parse_uuid(&row.bill_id, "bill")?, row.amount_minor)))
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(Self {
            id: parse_uuid(&model.id, "payment")?,
            supplier_id: parse_uuid(&model.supplier_id, "supplier")?,
            amount_minor: model.amount_minor,
            date: model.date,
            mode: PaymentMode::try_from(model.mode.as_str())?,
            bills_allocated,
        })
    }
}
