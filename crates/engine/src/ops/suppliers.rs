use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    Bill, NewSupplierCmd, PaymentListFilter, ResultEngine, Statement, Supplier,
    SupplierOverview,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, store};

impl Engine {
    pub async fn new_supplier(&self, cmd: NewSupplierCmd) -> ResultEngine<Supplier> {
        let supplier = Supplier::new(
            normalize_required_text(&cmd.name, "supplier name")?,
            normalize_optional_text(cmd.email.as_deref()),
            normalize_optional_text(cmd.phone.as_deref()),
        );
        store::insert_supplier(&self.database, &supplier).await?;
        tracing::info!(supplier_id = %supplier.id, name = %supplier.name, "supplier created");
        Ok(supplier)
    }

    pub async fn supplier(&self, supplier_id: Uuid) -> ResultEngine<Supplier> {
        store::require_supplier(&self.database, supplier_id).await
    }

    /// Every supplier, by name, with its bills and the credit still open.
    pub async fn suppliers_overview(&self) -> ResultEngine<Vec<SupplierOverview>> {
        let suppliers = store::all_suppliers(&self.database).await?;

        let mut by_supplier: HashMap<Uuid, Vec<Bill>> = HashMap::new();
        for bill in store::bills_by_date(&self.database, None).await? {
            by_supplier.entry(bill.supplier_id).or_default().push(bill);
        }

        suppliers
            .into_iter()
            .map(|supplier| {
                let bills = by_supplier.remove(&supplier.id).unwrap_or_default();
                SupplierOverview::new(supplier, bills)
            })
            .collect()
    }

    /// Bills and payments of a supplier as a dated ledger.
    pub async fn supplier_statement(&self, supplier_id: Uuid) -> ResultEngine<Statement> {
        let supplier = store::require_supplier(&self.database, supplier_id).await?;
        let bills = store::bills_by_date(&self.database, Some(supplier_id)).await?;
        let filter = PaymentListFilter {
            supplier_id: Some(supplier_id),
            ..Default::default()
        };
        let payments = store::payments_matching(&self.database, &filter).await?;
        Statement::build(supplier, &bills, &payments)
    }
}
