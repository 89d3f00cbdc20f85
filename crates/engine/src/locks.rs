//! Per-supplier write serialization.
//!
//! Every write that reads bill balances and then writes them back (allocate,
//! reverse, restore validation) holds the supplier's lock for the whole
//! operation, so two operations on the same supplier never interleave
//! between their read and their write.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Holds one mutex per supplier that was ever written to. Entries are never
/// removed, so the map grows with the number of suppliers and no further.
#[derive(Debug, Default)]
pub(crate) struct SupplierLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl SupplierLocks {
    fn mutex_for(&self, supplier_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(supplier_id).or_default())
    }

    /// Waits for exclusive access to `supplier_id`'s bills.
    pub(crate) async fn lock(&self, supplier_id: Uuid) -> OwnedMutexGuard<()> {
        self.mutex_for(supplier_id).lock_owned().await
    }
}
