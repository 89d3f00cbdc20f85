use chrono::Utc;
use uuid::Uuid;

use crate::{
    Bill, EngineError, NewBillCmd, ResultEngine,
    util::{normalize_required_text, require_amount},
};

use super::{Engine, store};

impl Engine {
    /// Records a new, fully unpaid bill.
    pub async fn new_bill(&self, cmd: NewBillCmd) -> ResultEngine<Bill> {
        require_amount(cmd.amount_minor, "bill")?;
        let bill_number = normalize_required_text(&cmd.bill_number, "bill number")?;
        store::require_supplier(&self.database, cmd.supplier_id).await?;

        let bill = Bill::new(
            cmd.supplier_id,
            bill_number,
            cmd.amount_minor,
            cmd.date.unwrap_or_else(Utc::now),
        )?;
        store::insert_bill(&self.database, &bill).await?;
        tracing::info!(
            bill_id = %bill.id,
            supplier_id = %bill.supplier_id,
            amount_minor = bill.amount_minor,
            "bill created"
        );
        Ok(bill)
    }

    pub async fn bill(&self, bill_id: Uuid) -> ResultEngine<Bill> {
        store::bill_by_id(&self.database, bill_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("bill not exists".to_string()))
    }
}
