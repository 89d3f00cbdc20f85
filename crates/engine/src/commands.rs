//! Command structs for engine operations.
//!
//! These types group parameters for write operations (suppliers, bills and
//! payments), keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Directive, PaymentMode};

/// Register a supplier.
#[derive(Clone, Debug)]
pub struct NewSupplierCmd {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewSupplierCmd {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Record a bill owed to a supplier.
#[derive(Clone, Debug)]
pub struct NewBillCmd {
    pub supplier_id: Uuid,
    pub bill_number: String,
    pub amount_minor: i64,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
}

impl NewBillCmd {
    #[must_use]
    pub fn new(supplier_id: Uuid, bill_number: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            supplier_id,
            bill_number: bill_number.into(),
            amount_minor,
            date: None,
        }
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// Pay a supplier, optionally steering the amount to specific bills.
#[derive(Clone, Debug)]
pub struct CreatePaymentCmd {
    pub supplier_id: Uuid,
    pub amount_minor: i64,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
    /// Defaults to [`PaymentMode::Other`].
    pub mode: Option<PaymentMode>,
    pub directives: Vec<Directive>,
}

impl CreatePaymentCmd {
    #[must_use]
    pub fn new(supplier_id: Uuid, amount_minor: i64) -> Self {
        Self {
            supplier_id,
            amount_minor,
            date: None,
            mode: None,
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: PaymentMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }
}

/// Re-split an existing payment with new details.
///
/// `date` and `mode` keep their stored value when `None`.
#[derive(Clone, Debug)]
pub struct UpdatePaymentCmd {
    pub payment_id: Uuid,
    pub amount_minor: i64,
    pub date: Option<DateTime<Utc>>,
    pub mode: Option<PaymentMode>,
    pub directives: Vec<Directive>,
}

impl UpdatePaymentCmd {
    #[must_use]
    pub fn new(payment_id: Uuid, amount_minor: i64) -> Self {
        Self {
            payment_id,
            amount_minor,
            date: None,
            mode: None,
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: PaymentMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }
}

/// Filters for the payment history.
#[derive(Clone, Debug, Default)]
pub struct PaymentListFilter {
    pub supplier_id: Option<Uuid>,
    pub mode: Option<PaymentMode>,
    /// Matches payments dated on this calendar day (UTC).
    pub day: Option<NaiveDate>,
}
