use sea_orm::DatabaseConnection;

use crate::{ResultEngine, locks::SupplierLocks};

mod archive;
mod bills;
mod payments;
mod store;
mod suppliers;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of the ledger.
///
/// Writes that touch bill balances (create, update, delete and restore of a
/// payment) hold the supplier's lock and run in a single database
/// transaction.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    locks: SupplierLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            locks: SupplierLocks::default(),
        })
    }
}
