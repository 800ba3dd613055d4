//! Persistence of confirmed receipts.

mod sqlite;

pub use sqlite::SqliteReceiptStore;

use crate::error::StorageError;
use crate::models::receipt::{StoredReceipt, ValidatedReceipt};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Append-only receipt store.
pub trait ReceiptStore {
    /// Persist a receipt and return the stored row.
    fn insert(&self, receipt: &ValidatedReceipt) -> Result<StoredReceipt>;

    /// All receipts, most recently saved first.
    fn list_recent(&self) -> Result<Vec<StoredReceipt>>;
}
