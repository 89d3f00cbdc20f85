use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{ArchivedPayment, EngineError, Payment, ResultEngine, restore};

use super::{Engine, store, with_tx};

impl Engine {
    /// Brings an archived payment back as a new payment.
    ///
    /// Fails with [`EngineError::RestoreConflict`] without touching anything
    /// when one of the archived allocations no longer fits its bill (the
    /// bill is gone, or other payments consumed its balance meanwhile).
    pub async fn restore_payment(&self, archive_id: Uuid) -> ResultEngine<Payment> {
        // Only learns which supplier to lock; the archive entry is re-read below.
        let supplier_id = self.archived_payment(archive_id).await?.supplier_id;
        let _guard = self.locks.lock(supplier_id).await;
        let result: ResultEngine<Payment> = with_tx!(self, |db_tx| {
            let archived = store::require_archived_payment(&db_tx, archive_id).await?;

            let mut book = store::load_book(&db_tx, None, archived.bills_allocated()).await?;
            if let Err(detail) = restore(&mut book, archived.bills_allocated()) {
                tracing::warn!(archive_id = %archive_id, "restore rejected: {detail}");
                return Err(EngineError::RestoreConflict(detail));
            }
            let payment = archived.to_restored_payment()?;

            store::persist_book(&db_tx, &book).await?;
            store::insert_payment(&db_tx, &payment).await?;
            store::delete_archived_payment_row(&db_tx, archived.id).await?;
            Ok(payment)
        });
        let payment = result?;

        tracing::info!(
            archive_id = %archive_id,
            payment_id = %payment.id,
            "archived payment restored"
        );
        Ok(payment)
    }

    pub async fn archived_payment(&self, archive_id: Uuid) -> ResultEngine<ArchivedPayment> {
        store::require_archived_payment(&self.database, archive_id).await
    }

    /// Archived payments, most recently deleted first.
    pub async fn list_archived_payments(&self) -> ResultEngine<Vec<ArchivedPayment>> {
        store::archived_payments_by_deletion(&self.database).await
    }
}
