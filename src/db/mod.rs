use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::Path;

use crate::models::{BillRecord, BillStatus, BillType};

/// Receipt bytes kept by the local store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAttachment {
    pub key: String,
    pub email: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
    pub file_hash: String,
    pub created_at: String,
}

pub struct Database {
    conn: Connection,
}

const BILL_COLUMNS: &str = "id, email, type, name, amount, date, vat, pct, commentary,
                            file_url, file_name, status, comment_admin";

impl Database {
    pub fn new(db_path: &Path) -> SqlResult<Self> {
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> SqlResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> SqlResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> SqlResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = [
            (
                "001_create_bills.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_bills.sql"
                )),
            ),
            (
                "002_create_attachments.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_attachments.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    /// Inserts the bill, or replaces the one with the same id.
    pub fn upsert_bill(&self, bill: &BillRecord, now: &str) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO bills (
                id, email, type, name, amount, date, vat, pct, commentary,
                file_url, file_name, status, comment_admin, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                type = excluded.type,
                name = excluded.name,
                amount = excluded.amount,
                date = excluded.date,
                vat = excluded.vat,
                pct = excluded.pct,
                commentary = excluded.commentary,
                file_url = excluded.file_url,
                file_name = excluded.file_name,
                status = excluded.status,
                comment_admin = excluded.comment_admin,
                updated_at = excluded.updated_at",
            params![
                bill.id,
                bill.email,
                bill.bill_type.label(),
                bill.name,
                bill.amount,
                bill.date,
                bill.vat,
                bill.pct,
                bill.commentary,
                bill.file_url,
                bill.file_name,
                bill.status.as_str(),
                bill.comment_admin,
                now
            ],
        )?;
        Ok(())
    }

    pub fn get_bill(&self, id: &str) -> SqlResult<Option<BillRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM bills WHERE id = ?1", BILL_COLUMNS))?;
        stmt.query_row(params![id], bill_from_row).optional()
    }

    /// All bills in insertion order.
    pub fn list_bills(&self) -> SqlResult<Vec<BillRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM bills ORDER BY rowid", BILL_COLUMNS))?;
        let rows = stmt.query_map([], bill_from_row)?;
        rows.collect()
    }

    pub fn insert_attachment(&self, attachment: &StoredAttachment) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO attachments (key, email, file_name, content_type, content, file_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                attachment.key,
                attachment.email,
                attachment.file_name,
                attachment.content_type,
                attachment.content,
                attachment.file_hash,
                attachment.created_at
            ],
        )?;
        Ok(())
    }

    pub fn get_attachment(&self, key: &str) -> SqlResult<Option<StoredAttachment>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, email, file_name, content_type, content, file_hash, created_at
             FROM attachments WHERE key = ?1",
        )?;

        stmt.query_row(params![key], |row| {
            Ok(StoredAttachment {
                key: row.get(0)?,
                email: row.get(1)?,
                file_name: row.get(2)?,
                content_type: row.get(3)?,
                content: row.get(4)?,
                file_hash: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()
    }
}

fn bill_from_row(row: &Row<'_>) -> SqlResult<BillRecord> {
    let bill_type: String = row.get(2)?;
    let status: String = row.get(11)?;
    Ok(BillRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        bill_type: parse_column::<BillType>(2, &bill_type)?,
        name: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        vat: row.get(6)?,
        pct: row.get(7)?,
        commentary: row.get(8)?,
        file_url: row.get(9)?,
        file_name: row.get(10)?,
        status: parse_column::<BillStatus>(11, &status)?,
        comment_admin: row.get(12)?,
    })
}

fn parse_column<T>(index: usize, value: &str) -> SqlResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, e.into())
    })
}
