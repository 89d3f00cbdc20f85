//! Supplier ledger engine.
//!
//! Tracks what is owed to suppliers ([`Bill`]s) and how [`Payment`]s are split
//! across those bills. Paying, editing, deleting and restoring a payment all
//! go through [`Engine`], which keeps every bill's paid amount and status
//! consistent with the recorded allocations.

pub use allocation::{AllocationPlan, BillBook, Directive, allocate, restore, reverse};
pub use archived_payments::ArchivedPayment;
pub use bills::{Bill, BillStatus};
pub use commands::{
    CreatePaymentCmd, NewBillCmd, NewSupplierCmd, PaymentListFilter, UpdatePaymentCmd,
};
pub use error::{ConflictDetail, EngineError};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder};
pub use payments::{Allocation, Payment, PaymentMode};
pub use statement::{Statement, StatementLine, StatementLineKind, SupplierOverview};
pub use suppliers::Supplier;

mod allocation;
mod archived_allocations;
mod archived_payments;
mod bills;
mod commands;
mod error;
mod locks;
mod money;
mod ops;
mod payment_allocations;
mod payments;
mod statement;
mod suppliers;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

/// Largest bill or payment amount accepted, in minor units.
///
/// Sums over a supplier's bills are still checked, so a supplier with enough
/// capped bills is reported as `InvalidInput` rather than wrapping.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000;

/// Tolerance, in minor units, for every paid-vs-due comparison.
///
/// A bill whose outstanding balance is within this amount counts as paid, and
/// automatic allocation stops once no more than this amount is left.
pub const PAID_TOLERANCE_MINOR: i64 = 1;
