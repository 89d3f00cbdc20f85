//! Payment allocation.
//!
//! Everything here works on an in-memory [`BillBook`], a working copy of the
//! bills an operation may touch. The engine loads the book, lets these
//! functions mutate it, and then persists [`BillBook::changed`] in the same
//! database transaction as the payment itself, so either every bill mutation
//! of an operation lands or none does.
//!
//! Allocation runs in two steps against a single `remaining` counter:
//!
//! 1. **directed**: each [`Directive`] in caller order gets
//!    `min(manual_amount, remaining, due)` (or `min(due, remaining)` when no
//!    manual amount is given);
//! 2. **automatic**: whatever is left goes to the supplier's unpaid bills,
//!    oldest first.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Allocation, Bill, BillStatus, ConflictDetail, PAID_TOLERANCE_MINOR};

/// Caller request to put (part of) a payment on a specific bill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub bill_id: Uuid,
    /// Upper bound for this bill; `None` pays as much of the bill as possible.
    pub manual_amount_minor: Option<i64>,
}

impl Directive {
    pub fn full(bill_id: Uuid) -> Self {
        Self {
            bill_id,
            manual_amount_minor: None,
        }
    }

    pub fn manual(bill_id: Uuid, amount_minor: i64) -> Self {
        Self {
            bill_id,
            manual_amount_minor: Some(amount_minor),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    pub allocations: Vec<Allocation>,
    /// Amount no bill could absorb.
    pub unallocated_minor: i64,
}

/// Working copy of bills, remembering what they looked like when loaded.
#[derive(Clone, Debug, Default)]
pub struct BillBook {
    bills: HashMap<Uuid, Bill>,
    loaded_paid: HashMap<Uuid, i64>,
}

impl BillBook {
    pub fn new(bills: impl IntoIterator<Item = Bill>) -> Self {
        let mut book = Self::default();
        for bill in bills {
            book.insert(bill);
        }
        book
    }

    /// Adds a bill unless it is already tracked.
    pub fn insert(&mut self, bill: Bill) {
        if self.bills.contains_key(&bill.id) {
            return;
        }
        self.loaded_paid.insert(bill.id, bill.paid_minor());
        self.bills.insert(bill.id, bill);
    }

    pub fn contains(&self, bill_id: &Uuid) -> bool {
        self.bills.contains_key(bill_id)
    }

    pub fn get(&self, bill_id: &Uuid) -> Option<&Bill> {
        self.bills.get(bill_id)
    }

    /// Bills whose paid amount differs from when they were loaded.
    pub fn changed(&self) -> impl Iterator<Item = &Bill> {
        self.bills
            .values()
            .filter(|bill| self.loaded_paid.get(&bill.id) != Some(&bill.paid_minor()))
    }
}

/// Splits `total_minor` across `supplier_id`'s bills and applies the split to
/// `book`.
///
/// Directives pointing at bills that are not in the book (or that belong to
/// another supplier) are skipped.
pub fn allocate(
    book: &mut BillBook,
    supplier_id: Uuid,
    total_minor: i64,
    directives: &[Directive],
) -> AllocationPlan {
    let mut remaining = total_minor;
    let mut allocations: Vec<Allocation> = Vec::new();

    for directive in directives {
        if remaining <= 0 {
            break;
        }
        let Some(bill) = book
            .bills
            .get_mut(&directive.bill_id)
            .filter(|bill| bill.supplier_id == supplier_id)
        else {
            continue;
        };

        let due = bill.due_minor();
        let candidate = directive
            .manual_amount_minor
            .unwrap_or(due)
            .min(remaining)
            .min(due);
        if candidate <= 0 {
            continue;
        }

        bill.apply(candidate);
        remaining -= candidate;
        allocations.push(Allocation::new(bill.id, candidate));
    }

    if remaining > PAID_TOLERANCE_MINOR {
        let already: HashSet<Uuid> = allocations.iter().map(|a| a.bill_id).collect();
        let mut candidates: Vec<&mut Bill> = book
            .bills
            .values_mut()
            .filter(|bill| {
                bill.supplier_id == supplier_id
                    && bill.status() != BillStatus::Paid
                    && !already.contains(&bill.id)
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.bill_number.cmp(&b.bill_number))
                .then_with(|| a.id.cmp(&b.id))
        });

        for bill in candidates {
            if remaining <= PAID_TOLERANCE_MINOR {
                break;
            }
            let amount = bill.due_minor().min(remaining);
            if amount <= 0 {
                continue;
            }
            bill.apply(amount);
            remaining -= amount;
            allocations.push(Allocation::new(bill.id, amount));
        }
    }

    AllocationPlan {
        allocations,
        unallocated_minor: remaining,
    }
}

/// Undoes `allocations` entry by entry. Bills missing from the book are
/// skipped.
pub fn reverse(book: &mut BillBook, allocations: &[Allocation]) {
    for allocation in allocations {
        if let Some(bill) = book.bills.get_mut(&allocation.bill_id) {
            bill.revert(allocation.amount_minor);
        }
    }
}

/// Re-applies archived `allocations`.
///
/// Every entry is validated before any bill is touched: if one of them needs
/// more than its bill still has due (plus tolerance), or its bill is gone,
/// the book is left untouched.
pub fn restore(book: &mut BillBook, allocations: &[Allocation]) -> Result<(), ConflictDetail> {
    let mut pending: HashMap<Uuid, i64> = HashMap::new();
    for allocation in allocations {
        let Some(bill) = book.bills.get(&allocation.bill_id) else {
            return Err(ConflictDetail::missing_bill(
                allocation.bill_id,
                allocation.amount_minor,
            ));
        };
        let already = pending.entry(bill.id).or_insert(0);
        let available = bill.due_minor() - *already;
        if allocation.amount_minor > available + PAID_TOLERANCE_MINOR {
            return Err(ConflictDetail {
                bill_id: bill.id,
                bill_number: Some(bill.bill_number.clone()),
                required_minor: allocation.amount_minor,
                available_minor: Some(available),
            });
        }
        *already += allocation.amount_minor;
    }

    for allocation in allocations {
        if let Some(bill) = book.bills.get_mut(&allocation.bill_id) {
            bill.apply(allocation.amount_minor);
        }
    }
    Ok(())
}
