//! SQLite receipt store.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{ReceiptStore, Result};
use crate::error::StorageError;
use crate::models::receipt::{StoredReceipt, ValidatedReceipt};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS receipts (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    vendor           TEXT NOT NULL,
    amount           TEXT NOT NULL,
    currency         TEXT NOT NULL,
    category         TEXT NOT NULL,
    transaction_date TEXT NOT NULL,
    language         TEXT,
    raw_text         TEXT NOT NULL,
    created_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_receipts_created ON receipts(created_at);
";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Receipt store backed by a single SQLite connection.
///
/// The connection closes when the store is dropped.
pub struct SqliteReceiptStore {
    conn: Connection,
}

impl SqliteReceiptStore {
    /// Open or create a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let store = Self::with_connection(conn)?;
        info!("Opened receipt store at {}", path.display());
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Persist a receipt with an explicit save time.
    pub fn insert_at(
        &self,
        receipt: &ValidatedReceipt,
        created_at: DateTime<Utc>,
    ) -> Result<StoredReceipt> {
        let mut amount = receipt.amount;
        amount.rescale(2);
        let created_at = created_at.trunc_subsecs(6);

        self.conn.execute(
            "INSERT INTO receipts
                 (vendor, amount, currency, category, transaction_date, language, raw_text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                receipt.vendor,
                amount.to_string(),
                receipt.currency,
                receipt.category,
                receipt.transaction_date.format(DATE_FORMAT).to_string(),
                receipt.language,
                receipt.raw_text,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted receipt {} for {}", id, receipt.vendor);

        Ok(StoredReceipt {
            id,
            vendor: receipt.vendor.clone(),
            amount,
            transaction_date: receipt.transaction_date,
            currency: receipt.currency.clone(),
            category: receipt.category.clone(),
            language: receipt.language.clone(),
            raw_text: receipt.raw_text.clone(),
            created_at,
        })
    }

    /// Number of stored receipts.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM receipts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl ReceiptStore for SqliteReceiptStore {
    fn insert(&self, receipt: &ValidatedReceipt) -> Result<StoredReceipt> {
        self.insert_at(receipt, Utc::now())
    }

    fn list_recent(&self) -> Result<Vec<StoredReceipt>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, vendor, amount, currency, category, transaction_date, language, raw_text, created_at
             FROM receipts
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map([], RawRow::from_row)?;

        let mut receipts = Vec::new();
        for row in rows {
            receipts.push(row?.decode()?);
        }
        debug!("Listed {} receipts", receipts.len());
        Ok(receipts)
    }
}

/// Columns as SQLite returns them, before text fields are parsed.
struct RawRow {
    id: i64,
    vendor: String,
    amount: String,
    currency: String,
    category: String,
    transaction_date: String,
    language: Option<String>,
    raw_text: String,
    created_at: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            vendor: row.get(1)?,
            amount: row.get(2)?,
            currency: row.get(3)?,
            category: row.get(4)?,
            transaction_date: row.get(5)?,
            language: row.get(6)?,
            raw_text: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn decode(self) -> Result<StoredReceipt> {
        let id = self.id;
        let corrupt = |reason: String| StorageError::CorruptRow { id, reason };

        let amount = Decimal::from_str(&self.amount)
            .map_err(|e| corrupt(format!("amount {:?}: {}", self.amount, e)))?;
        let transaction_date = NaiveDate::parse_from_str(&self.transaction_date, DATE_FORMAT)
            .map_err(|e| corrupt(format!("date {:?}: {}", self.transaction_date, e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(format!("created_at {:?}: {}", self.created_at, e)))?
            .with_timezone(&Utc);

        Ok(StoredReceipt {
            id,
            vendor: self.vendor,
            amount,
            transaction_date,
            currency: self.currency,
            category: self.category,
            language: self.language,
            raw_text: self.raw_text,
            created_at,
        })
    }
}
