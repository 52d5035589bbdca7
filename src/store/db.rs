//! libSQL data context, the single handle every access service borrows.
//!
//! One `DataContext` per unit of work. It owns one connection; services
//! hold `&DataContext` and never outlive it.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use libsql::params::Params;
use libsql::{Connection, Database as LibSqlDatabase, Value};
use tracing::{debug, info};

use crate::audit::WriteOutcome;
use crate::config::{StoreConfig, StoreLocation};
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::query::{ALL_TABLES, Key, Table, active};
use crate::store::row::{self, RowReader};

pub struct DataContext {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl DataContext {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let ctx = Self::connect(db)?;
        ctx.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(ctx)
    }

    /// Create an in-memory database. Nothing survives the context.
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let ctx = Self::connect(db)?;
        ctx.run_migrations().await?;
        Ok(ctx)
    }

    /// Open whichever store the configuration points at.
    pub async fn from_config(config: &StoreConfig) -> Result<Self, DatabaseError> {
        match &config.location {
            StoreLocation::File(path) => Self::new_local(path).await,
            StoreLocation::Memory => Self::new_memory().await,
        }
    }

    fn connect(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Run all pending schema migrations.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(&self.conn).await
    }

    /// Highest applied migration version.
    pub async fn schema_version(&self) -> Result<i64, DatabaseError> {
        migrations::get_current_version(&self.conn).await
    }

    /// Number of active rows per audited table.
    pub async fn active_counts(&self) -> Result<Vec<(&'static str, i64)>, DatabaseError> {
        let mut counts = Vec::with_capacity(ALL_TABLES.len());
        for table in ALL_TABLES {
            let sql = format!("SELECT COUNT(*) FROM {} t WHERE {}", table.name, active("t"));
            let count = self
                .query_one("active_counts", &sql, Vec::new(), |r| r.int())
                .await?
                .unwrap_or(0);
            counts.push((table.name, count));
        }
        Ok(counts)
    }

    // ── Query primitives used by the services ───────────────────────

    /// Run a query and read every row with `read`.
    pub(crate) async fn query_all<T>(
        &self,
        context: &str,
        sql: &str,
        params: Vec<Value>,
        read: impl Fn(&mut RowReader<'_>) -> Result<T, DatabaseError>,
    ) -> Result<Vec<T>, DatabaseError> {
        let mut rows = self
            .conn
            .query(sql, Params::Positional(params))
            .await
            .map_err(|e| DatabaseError::Query(format!("{context}: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("{context}: {e}")))?
        {
            out.push(read(&mut RowReader::new(&row))?);
        }
        Ok(out)
    }

    /// Run a query and read at most its first row.
    pub(crate) async fn query_one<T>(
        &self,
        context: &str,
        sql: &str,
        params: Vec<Value>,
        read: impl Fn(&mut RowReader<'_>) -> Result<T, DatabaseError>,
    ) -> Result<Option<T>, DatabaseError> {
        let mut rows = self
            .conn
            .query(sql, Params::Positional(params))
            .await
            .map_err(|e| DatabaseError::Query(format!("{context}: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(read(&mut RowReader::new(&row))?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("{context}: {e}"))),
        }
    }

    /// Execute a statement, returning the number of rows changed.
    pub(crate) async fn execute(
        &self,
        context: &str,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<u64, DatabaseError> {
        self.conn
            .execute(sql, Params::Positional(params))
            .await
            .map_err(|e| DatabaseError::from_statement(context, e))
    }

    /// Insert one row into `table` and return its rowid.
    ///
    /// For integer-keyed tables that is the assigned identity.
    pub(crate) async fn insert(
        &self,
        context: &str,
        table: &Table,
        params: Vec<Value>,
    ) -> Result<i64, DatabaseError> {
        self.execute(context, &table.insert(), params).await?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Flag an active row as deleted.
    ///
    /// Stamps `modified_at`, and `modified_by` when `deleted_by` is given.
    /// A missing or already-deleted row is left untouched.
    pub(crate) async fn soft_delete(
        &self,
        table: &Table,
        key: Key,
        deleted_by: Option<&str>,
    ) -> Result<WriteOutcome, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET is_deleted = 1, modified_at = ?1, modified_by = COALESCE(?2, modified_by) \
             WHERE id = ?3 AND is_deleted = 0",
            table.name
        );
        let changed = self
            .execute(
                "soft_delete",
                &sql,
                vec![row::timestamp(&Utc::now()), row::opt_text(deleted_by), key.into()],
            )
            .await?;

        let outcome = if changed > 0 {
            WriteOutcome::Applied
        } else {
            self.explain_skipped_write(table, key).await?
        };
        if outcome.is_applied() {
            debug!(table = table.name, id = %key, "Row soft-deleted");
        } else {
            debug!(table = table.name, id = %key, ?outcome, "Soft delete skipped");
        }
        Ok(outcome)
    }

    /// Why a conditional write on an active row touched nothing.
    pub(crate) async fn explain_skipped_write(
        &self,
        table: &Table,
        key: Key,
    ) -> Result<WriteOutcome, DatabaseError> {
        let sql = format!("SELECT is_deleted FROM {} WHERE id = ?1", table.name);
        let deleted = self
            .query_one("explain_skipped_write", &sql, vec![key.into()], |r| r.flag())
            .await?;
        Ok(match deleted {
            Some(true) => WriteOutcome::AlreadyDeleted,
            Some(false) | None => WriteOutcome::NotFound,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::store::query::CITATIONS;

    async fn insert_citation(ctx: &DataContext, url: &str) -> i64 {
        ctx.insert(
            "test",
            &CITATIONS,
            vec![
                row::rowid(0),
                row::text("00000000-0000-0000-0000-000000000001"),
                row::text(url),
                Value::Null,
                Value::Null,
                row::timestamp(&Utc::now()),
                Value::Null,
                Value::Null,
                row::flag(false),
            ],
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn open_in_memory_runs_migrations() {
        let ctx = DataContext::new_memory().await.unwrap();
        assert_eq!(ctx.schema_version().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn open_creates_directory_and_reopens() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("dir").join("audit.db");

        let id = {
            let ctx = DataContext::new_local(&db_path).await.unwrap();
            insert_citation(&ctx, "https://example.org/a").await
        };
        assert!(db_path.exists());

        let ctx = DataContext::new_local(&db_path).await.unwrap();
        let counts = ctx.active_counts().await.unwrap();
        assert!(counts.contains(&("citations", 1)));
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let ctx = DataContext::new_memory().await.unwrap();
        ctx.run_migrations().await.unwrap();
        assert_eq!(ctx.schema_version().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn soft_delete_reports_outcomes() {
        let ctx = DataContext::new_memory().await.unwrap();
        let id = insert_citation(&ctx, "https://example.org/a").await;

        let first = ctx.soft_delete(&CITATIONS, Key::Int(id), Some("auditor")).await.unwrap();
        let second = ctx.soft_delete(&CITATIONS, Key::Int(id), Some("auditor")).await.unwrap();
        let missing = ctx.soft_delete(&CITATIONS, Key::Int(999), None).await.unwrap();

        assert_eq!(first, WriteOutcome::Applied);
        assert_eq!(second, WriteOutcome::AlreadyDeleted);
        assert_eq!(missing, WriteOutcome::NotFound);
    }

    async fn stamps(ctx: &DataContext, id: i64) -> (Option<DateTime<Utc>>, Option<String>, bool) {
        ctx.query_one(
            "stamps",
            "SELECT modified_at, modified_by, is_deleted FROM citations WHERE id = ?1",
            vec![row::int(id)],
            |r| Ok((r.opt_timestamp()?, r.opt_text()?, r.flag()?)),
        )
        .await
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn soft_delete_stamps_time_and_deleter() {
        let ctx = DataContext::new_memory().await.unwrap();
        let id = insert_citation(&ctx, "https://example.org/a").await;

        let before = Utc::now();
        ctx.soft_delete(&CITATIONS, Key::Int(id), Some("auditor")).await.unwrap();

        let (modified_at, modified_by, is_deleted) = stamps(&ctx, id).await;
        assert!(modified_at.unwrap() >= before);
        assert_eq!(modified_by.as_deref(), Some("auditor"));
        assert!(is_deleted);
    }

    #[tokio::test]
    async fn anonymous_delete_keeps_previous_modifier() {
        let ctx = DataContext::new_memory().await.unwrap();
        let id = insert_citation(&ctx, "https://example.org/a").await;
        ctx.execute(
            "seed modifier",
            "UPDATE citations SET modified_by = 'editor' WHERE id = ?1",
            vec![row::int(id)],
        )
        .await
        .unwrap();

        let before = Utc::now();
        ctx.soft_delete(&CITATIONS, Key::Int(id), None).await.unwrap();

        let (modified_at, modified_by, is_deleted) = stamps(&ctx, id).await;
        assert!(modified_at.unwrap() >= before);
        assert_eq!(modified_by.as_deref(), Some("editor"));
        assert!(is_deleted);
    }

    #[tokio::test]
    async fn active_counts_skip_deleted_rows() {
        let ctx = DataContext::new_memory().await.unwrap();
        let keep = insert_citation(&ctx, "https://example.org/keep").await;
        let gone = insert_citation(&ctx, "https://example.org/gone").await;
        ctx.soft_delete(&CITATIONS, Key::Int(gone), None).await.unwrap();

        let counts = ctx.active_counts().await.unwrap();
        assert!(counts.contains(&("citations", 1)));
        assert!(counts.contains(&("messages", 0)));
        assert_ne!(keep, gone);
    }
}
