//! Read models for suppliers: overview with outstanding credit and the merged
//! bill/payment ledger printed as a statement.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Bill, BillStatus, EngineError, Payment, ResultEngine, Supplier};

/// A supplier with its bills (oldest first) and what is still owed.
#[derive(Clone, Debug)]
pub struct SupplierOverview {
    pub supplier: Supplier,
    pub bills: Vec<Bill>,
    pub total_credit_minor: i64,
}

impl SupplierOverview {
    pub fn new(supplier: Supplier, bills: Vec<Bill>) -> ResultEngine<Self> {
        let total_credit_minor = bills
            .iter()
            .try_fold(0i64, |total, bill| total.checked_add(bill.due_minor()))
            .ok_or_else(|| too_large(&supplier))?;
        Ok(Self {
            supplier,
            bills,
            total_credit_minor,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementLineKind {
    Bill,
    Payment,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementLine {
    pub kind: StatementLineKind,
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub amount_minor: i64,
    /// Bill number for bills, payment mode label for payments.
    pub reference: String,
    pub status: Option<BillStatus>,
    /// Amount owed after this line.
    pub balance_minor: i64,
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub supplier: Supplier,
    pub lines: Vec<StatementLine>,
}

impl Statement {
    /// Merges bills and payments by date. On equal dates bills come first.
    pub fn build(
        supplier: Supplier,
        bills: &[Bill],
        payments: &[Payment],
    ) -> ResultEngine<Self> {
        let mut lines: Vec<StatementLine> = bills
            .iter()
            .map(|bill| StatementLine {
                kind: StatementLineKind::Bill,
                id: bill.id,
                date: bill.date,
                amount_minor: bill.amount_minor,
                reference: bill.bill_number.clone(),
                status: Some(bill.status()),
                balance_minor: 0,
            })
            .chain(payments.iter().map(|payment| StatementLine {
                kind: StatementLineKind::Payment,
                id: payment.id,
                date: payment.date,
                amount_minor: payment.amount_minor,
                reference: payment.mode.label().to_string(),
                status: None,
                balance_minor: 0,
            }))
            .collect();
        lines.sort_by_key(|line| line.date);

        let mut balance: i64 = 0;
        for line in &mut lines {
            let next = match line.kind {
                StatementLineKind::Bill => balance.checked_add(line.amount_minor),
                StatementLineKind::Payment => balance.checked_sub(line.amount_minor),
            };
            balance = next.ok_or_else(|| too_large(&supplier))?;
            line.balance_minor = balance;
        }

        Ok(Self { supplier, lines })
    }

    /// Balance after the last line.
    pub fn closing_balance_minor(&self) -> i64 {
        self.lines.last().map_or(0, |line| line.balance_minor)
    }
}

fn too_large(supplier: &Supplier) -> EngineError {
    EngineError::InvalidInput(format!(
        "totals for supplier {} exceed the supported range",
        supplier.id
    ))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{MAX_AMOUNT_MINOR, PaymentMode};

    fn capped_bills(supplier: &Supplier, count: usize) -> Vec<Bill> {
        (0..count)
            .map(|n| {
                Bill::new(supplier.id, format!("B-{n}"), MAX_AMOUNT_MINOR, Utc::now()).unwrap()
            })
            .collect()
    }

    #[test]
    fn lines_are_merged_by_date_with_running_balance() {
        let supplier = Supplier::new("ACME".to_string(), None, None);
        let day = |d| Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap();
        let b1 = Bill::new(supplier.id, "B-1".to_string(), 10_000, day(1)).unwrap();
        let b2 = Bill::new(supplier.id, "B-2".to_string(), 5_000, day(3)).unwrap();
        let payment = Payment::new(supplier.id, 4_000, day(2), PaymentMode::Cash, vec![]).unwrap();

        let statement = Statement::build(supplier, &[b2, b1], &[payment]).unwrap();

        let summary: Vec<(StatementLineKind, &str, i64)> = statement
            .lines
            .iter()
            .map(|l| (l.kind, l.reference.as_str(), l.balance_minor))
            .collect();
        assert_eq!(
            summary,
            vec![
                (StatementLineKind::Bill, "B-1", 10_000),
                (StatementLineKind::Payment, "Cash", 6_000),
                (StatementLineKind::Bill, "B-2", 11_000),
            ]
        );
        assert_eq!(statement.closing_balance_minor(), 11_000);
    }

    #[test]
    fn overview_sums_outstanding_credit() {
        let supplier = Supplier::new("ACME".to_string(), None, None);
        let bills = vec![
            Bill::new(supplier.id, "B-1".to_string(), 10_000, Utc::now()).unwrap(),
            Bill::new(supplier.id, "B-2".to_string(), 2_500, Utc::now()).unwrap(),
        ];
        assert_eq!(
            SupplierOverview::new(supplier, bills)
                .unwrap()
                .total_credit_minor,
            12_500
        );
    }

    #[test]
    fn totals_past_i64_are_rejected() {
        let supplier = Supplier::new("ACME".to_string(), None, None);
        let bills = capped_bills(&supplier, 10_000);

        let err = SupplierOverview::new(supplier.clone(), bills.clone()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let err = Statement::build(supplier, &bills, &[]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn capped_amounts_within_range_are_summed() {
        let supplier = Supplier::new("ACME".to_string(), None, None);
        let bills = capped_bills(&supplier, 9);

        let overview = SupplierOverview::new(supplier.clone(), bills.clone()).unwrap();
        assert_eq!(overview.total_credit_minor, 9 * MAX_AMOUNT_MINOR);
        let statement = Statement::build(supplier, &bills, &[]).unwrap();
        assert_eq!(statement.closing_balance_minor(), 9 * MAX_AMOUNT_MINOR);
    }
}
