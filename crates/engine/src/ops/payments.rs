use chrono::Utc;
use sea_orm::{ConnectionTrait, TransactionTrait};
use uuid::Uuid;

use crate::{
    ArchivedPayment, BillBook, CreatePaymentCmd, Directive, EngineError, Payment,
    PaymentListFilter, ResultEngine, UpdatePaymentCmd, allocate, reverse,
    util::require_amount,
};

use super::{Engine, store, with_tx};

impl Engine {
    /// Pays a supplier.
    ///
    /// Directed bills are served first, in the given order; whatever is left
    /// goes to the supplier's unpaid bills, oldest first. An amount larger
    /// than everything the supplier is owed is kept on the payment but not
    /// allocated to any bill.
    pub async fn create_payment(&self, cmd: CreatePaymentCmd) -> ResultEngine<Payment> {
        require_amount(cmd.amount_minor, "payment")?;
        validate_directives(&cmd.directives)?;

        let _guard = self.locks.lock(cmd.supplier_id).await;
        let result: ResultEngine<Payment> = with_tx!(self, |db_tx| {
            store::require_supplier(&db_tx, cmd.supplier_id).await?;

            let mut book = store::load_book(&db_tx, Some(cmd.supplier_id), &[]).await?;
            ensure_directives_belong(&db_tx, &book, cmd.supplier_id, &cmd.directives).await?;

            let plan = allocate(&mut book, cmd.supplier_id, cmd.amount_minor, &cmd.directives);
            let payment = Payment::new(
                cmd.supplier_id,
                cmd.amount_minor,
                cmd.date.unwrap_or_else(Utc::now),
                cmd.mode.unwrap_or_default(),
                plan.allocations,
            )?;

            store::persist_book(&db_tx, &book).await?;
            store::insert_payment(&db_tx, &payment).await?;
            Ok(payment)
        });
        let payment = result?;

        log_unallocated(&payment);
        tracing::info!(
            payment_id = %payment.id,
            supplier_id = %payment.supplier_id,
            amount_minor = payment.amount_minor,
            bills = payment.bills_allocated().len(),
            "payment created"
        );
        Ok(payment)
    }

    /// Re-splits an existing payment.
    ///
    /// The previous split is reverted first, then the new amount is
    /// allocated as if the payment were new. The payment keeps its id.
    pub async fn update_payment(&self, cmd: UpdatePaymentCmd) -> ResultEngine<Payment> {
        require_amount(cmd.amount_minor, "payment")?;
        validate_directives(&cmd.directives)?;

        // Only learns which supplier to lock; the payment is re-read below.
        let supplier_id = self.payment(cmd.payment_id).await?.supplier_id;
        let _guard = self.locks.lock(supplier_id).await;
        let result: ResultEngine<Payment> = with_tx!(self, |db_tx| {
            let existing = store::require_payment(&db_tx, cmd.payment_id).await?;

            let mut book = store::load_book(
                &db_tx,
                Some(existing.supplier_id),
                existing.bills_allocated(),
            )
            .await?;
            ensure_directives_belong(&db_tx, &book, existing.supplier_id, &cmd.directives)
                .await?;

            reverse(&mut book, existing.bills_allocated());
            let plan = allocate(
                &mut book,
                existing.supplier_id,
                cmd.amount_minor,
                &cmd.directives,
            );
            let updated = Payment::with_id(
                existing.id,
                existing.supplier_id,
                cmd.amount_minor,
                cmd.date.unwrap_or(existing.date),
                cmd.mode.unwrap_or(existing.mode),
                plan.allocations,
            )?;

            store::persist_book(&db_tx, &book).await?;
            store::replace_payment(&db_tx, &updated).await?;
            Ok(updated)
        });
        let payment = result?;

        log_unallocated(&payment);
        tracing::info!(
            payment_id = %payment.id,
            amount_minor = payment.amount_minor,
            bills = payment.bills_allocated().len(),
            "payment updated"
        );
        Ok(payment)
    }

    /// Deletes a payment: its split is reverted on the bills and the payment
    /// moves to the archive, from where it can be restored.
    pub async fn delete_payment(&self, payment_id: Uuid) -> ResultEngine<ArchivedPayment> {
        // Only learns which supplier to lock; the payment is re-read below.
        let supplier_id = self.payment(payment_id).await?.supplier_id;
        let _guard = self.locks.lock(supplier_id).await;
        let result: ResultEngine<ArchivedPayment> = with_tx!(self, |db_tx| {
            let existing = store::require_payment(&db_tx, payment_id).await?;

            let mut book = store::load_book(&db_tx, None, existing.bills_allocated()).await?;
            reverse(&mut book, existing.bills_allocated());
            let archived = ArchivedPayment::from_payment(&existing, Utc::now());

            store::persist_book(&db_tx, &book).await?;
            store::insert_archived_payment(&db_tx, &archived).await?;
            store::delete_payment_row(&db_tx, existing.id).await?;
            Ok(archived)
        });
        let archived = result?;

        tracing::info!(
            payment_id = %archived.original_payment_id,
            archive_id = %archived.id,
            "payment deleted and archived"
        );
        Ok(archived)
    }

    /// Returns a payment with its split.
    pub async fn payment(&self, payment_id: Uuid) -> ResultEngine<Payment> {
        store::require_payment(&self.database, payment_id).await
    }

    /// Payment history, newest first.
    pub async fn list_payments(&self, filter: &PaymentListFilter) -> ResultEngine<Vec<Payment>> {
        store::payments_matching(&self.database, filter).await
    }
}

fn validate_directives(directives: &[Directive]) -> ResultEngine<()> {
    if let Some(directive) = directives
        .iter()
        .find(|d| d.manual_amount_minor.is_some_and(|amount| amount < 0))
    {
        return Err(EngineError::InvalidInput(format!(
            "manual amount for bill {} must be >= 0",
            directive.bill_id
        )));
    }
    Ok(())
}

/// Rejects directives pointing at another supplier's bill. Unknown bills are
/// left in place and skipped by the allocation.
async fn ensure_directives_belong<C: ConnectionTrait>(
    db: &C,
    book: &BillBook,
    supplier_id: Uuid,
    directives: &[Directive],
) -> ResultEngine<()> {
    for directive in directives {
        let owner = match book.get(&directive.bill_id) {
            Some(bill) => Some(bill.supplier_id),
            None => store::bill_by_id(db, directive.bill_id)
                .await?
                .map(|bill| bill.supplier_id),
        };
        match owner {
            Some(owner) if owner != supplier_id => {
                return Err(EngineError::InvalidInput(format!(
                    "bill {} does not belong to supplier {supplier_id}",
                    directive.bill_id
                )));
            }
            Some(_) => {}
            None => tracing::debug!(bill_id = %directive.bill_id, "directive for unknown bill skipped"),
        }
    }
    Ok(())
}

fn log_unallocated(payment: &Payment) {
    let unallocated = payment.unallocated_minor();
    if unallocated > 0 {
        tracing::warn!(
            payment_id = %payment.id,
            unallocated_minor = unallocated,
            "payment exceeds outstanding bills, remainder not allocated"
        );
    }
}
