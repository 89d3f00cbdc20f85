use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod supplier {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SupplierNew {
        pub name: String,
        pub email: Option<String>,
        pub phone: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SupplierView {
        pub id: Uuid,
        pub name: String,
        pub email: Option<String>,
        pub phone: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SupplierOverview {
        pub supplier: SupplierView,
        pub bills: Vec<super::bill::BillView>,
        /// Sum of what is still due on every bill.
        pub total_credit_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum StatementLineKind {
        Bill,
        Payment,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatementLine {
        pub kind: StatementLineKind,
        pub id: Uuid,
        pub date: DateTime<FixedOffset>,
        pub amount_minor: i64,
        /// Bill number for bills, payment mode label for payments.
        pub reference: String,
        pub status: Option<super::bill::BillStatus>,
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatementResponse {
        pub supplier: SupplierView,
        pub lines: Vec<StatementLine>,
        pub closing_balance_minor: i64,
    }
}

pub mod bill {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BillStatus {
        Credit,
        PartiallyPaid,
        Paid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillNew {
        pub supplier_id: Uuid,
        pub bill_number: String,
        /// Must be > 0.
        pub amount_minor: i64,
        /// RFC3339 timestamp. Defaults to now.
        pub date: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillView {
        pub id: Uuid,
        pub supplier_id: Uuid,
        pub bill_number: String,
        pub amount_minor: i64,
        pub paid_minor: i64,
        pub due_minor: i64,
        pub status: BillStatus,
        pub date: DateTime<FixedOffset>,
    }
}

pub mod payment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMode {
        Cash,
        Upi,
        BankTransfer,
        Cheque,
        Other,
    }

    /// Request to pay a specific bill. Without `manual_amount_minor` the bill
    /// is paid as much as the payment allows.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DirectiveView {
        pub bill_id: Uuid,
        pub manual_amount_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AllocationView {
        pub bill_id: Uuid,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub supplier_id: Uuid,
        /// Must be > 0.
        pub amount_minor: i64,
        /// RFC3339 timestamp. Defaults to now.
        pub date: Option<DateTime<FixedOffset>>,
        /// Defaults to `other`.
        pub mode: Option<PaymentMode>,
        #[serde(default)]
        pub directives: Vec<DirectiveView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentUpdate {
        pub amount_minor: i64,
        /// Keeps the stored date when absent.
        pub date: Option<DateTime<FixedOffset>>,
        /// Keeps the stored mode when absent.
        pub mode: Option<PaymentMode>,
        #[serde(default)]
        pub directives: Vec<DirectiveView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentList {
        pub supplier_id: Option<Uuid>,
        pub mode: Option<PaymentMode>,
        /// Calendar day (UTC), `YYYY-MM-DD`.
        pub day: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: Uuid,
        pub supplier_id: Uuid,
        pub amount_minor: i64,
        pub date: DateTime<FixedOffset>,
        pub mode: PaymentMode,
        pub bills_allocated: Vec<AllocationView>,
        /// Part of the amount no bill could absorb.
        pub unallocated_minor: i64,
    }
}

pub mod archive {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ArchivedPaymentView {
        pub id: Uuid,
        pub original_payment_id: Uuid,
        pub supplier_id: Uuid,
        pub amount_minor: i64,
        pub date: DateTime<FixedOffset>,
        pub mode: super::payment::PaymentMode,
        pub bills_allocated: Vec<super::payment::AllocationView>,
        pub deleted_at: DateTime<FixedOffset>,
    }
}
