//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidInput`] thrown when a request is malformed (missing supplier,
//!   non positive amount, directive pointing at another supplier's bill).
//! - [`KeyNotFound`] thrown when a payment, bill, supplier or archive entry is
//!   not found.
//! - [`RestoreConflict`] thrown when an archived payment can't be re-applied
//!   because its bills changed in the meantime.
//!
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`RestoreConflict`]: EngineError::RestoreConflict
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::MoneyCents;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Cannot restore payment: {0}")]
    RestoreConflict(ConflictDetail),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::RestoreConflict(a), Self::RestoreConflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Which bill blocked a restore and by how much.
///
/// `available_minor` is `None` when the bill no longer exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictDetail {
    pub bill_id: Uuid,
    pub bill_number: Option<String>,
    pub required_minor: i64,
    pub available_minor: Option<i64>,
}

impl ConflictDetail {
    pub(crate) fn missing_bill(bill_id: Uuid, required_minor: i64) -> Self {
        Self {
            bill_id,
            bill_number: None,
            required_minor,
            available_minor: None,
        }
    }
}

impl fmt::Display for ConflictDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.available_minor, self.bill_number.as_deref()) {
            (None, _) => write!(f, "bill {} no longer exists", self.bill_id),
            (Some(available), number) => write!(
                f,
                "bill {} has insufficient balance. Required: {}, Available: {}",
                number.map_or_else(|| self.bill_id.to_string(), ToString::to_string),
                MoneyCents::new(self.required_minor),
                MoneyCents::new(available)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_bill_and_amounts() {
        let detail = ConflictDetail {
            bill_id: Uuid::nil(),
            bill_number: Some("BILL-1-1".to_string()),
            required_minor: 8_000,
            available_minor: Some(5_000),
        };
        assert_eq!(
            EngineError::RestoreConflict(detail).to_string(),
            "Cannot restore payment: bill BILL-1-1 has insufficient balance. Required: 80.00, Available: 50.00"
        );
    }

    #[test]
    fn conflict_message_for_missing_bill() {
        let detail = ConflictDetail::missing_bill(Uuid::nil(), 100);
        assert_eq!(
            detail.to_string(),
            format!("bill {} no longer exists", Uuid::nil())
        );
    }
}
