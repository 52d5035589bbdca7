//! Schema migrations for the audit store.
//!
//! Steps are numbered; the highest applied number is kept in `_migrations`.
//!
//! Foreign-key columns are indexed but carry no `REFERENCES` clause:
//! referential integrity is not enforced by this layer.

use libsql::{Connection, Value};
use tracing::{debug, info};

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS genai_models (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                provider TEXT,
                version TEXT,
                license TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_by TEXT,
                created_at TEXT NOT NULL,
                modified_by TEXT,
                modified_at TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS conversation_types (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                default_system_prompt TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 1,
                is_active INTEGER NOT NULL DEFAULT 1,
                risk_level TEXT,
                use_case_category TEXT,
                created_by TEXT,
                created_at TEXT NOT NULL,
                modified_by TEXT,
                modified_at TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                conversation_type_id INTEGER NOT NULL,
                started_at TEXT NOT NULL,
                created_by TEXT,
                created_at TEXT NOT NULL,
                modified_by TEXT,
                modified_at TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id);
            CREATE INDEX IF NOT EXISTS idx_conversations_type ON conversations(conversation_type_id);

            CREATE TABLE IF NOT EXISTS system_prompt_overrides (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                overridden_prompt TEXT NOT NULL,
                prompt_type TEXT,
                reason_for_override TEXT,
                version INTEGER NOT NULL DEFAULT 1,
                set_at TEXT NOT NULL,
                created_by TEXT,
                created_at TEXT NOT NULL,
                modified_by TEXT,
                modified_at TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_prompt_overrides_conversation
                ON system_prompt_overrides(conversation_id);

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                sender TEXT NOT NULL,
                message_sequence INTEGER NOT NULL,
                content TEXT NOT NULL,
                relevance_percentage TEXT,
                model_id INTEGER,
                was_decision_made INTEGER NOT NULL DEFAULT 0,
                requires_human_review INTEGER NOT NULL DEFAULT 0,
                is_final_output INTEGER NOT NULL DEFAULT 0,
                created_by TEXT,
                created_at TEXT NOT NULL,
                modified_by TEXT,
                modified_at TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages(conversation_id, message_sequence);
            CREATE INDEX IF NOT EXISTS idx_messages_model ON messages(model_id);

            CREATE TABLE IF NOT EXISTS citations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id TEXT NOT NULL,
                source_url TEXT NOT NULL,
                description TEXT,
                created_by TEXT,
                created_at TEXT NOT NULL,
                modified_by TEXT,
                modified_at TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_citations_message ON citations(message_id);

            CREATE TABLE IF NOT EXISTS user_feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id TEXT NOT NULL,
                rating INTEGER NOT NULL,
                feedback_type TEXT,
                comments TEXT,
                feedback_source TEXT,
                submitted_by TEXT,
                submitted_at TEXT NOT NULL,
                created_by TEXT,
                created_at TEXT NOT NULL,
                modified_by TEXT,
                modified_at TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_user_feedback_message ON user_feedback(message_id);
        "#,
    },
    Migration {
        version: 2,
        name: "active_row_indexes",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_conversations_user_active
                ON conversations(user_id, is_deleted);
            CREATE INDEX IF NOT EXISTS idx_messages_conversation_active
                ON messages(conversation_id, is_deleted);
        "#,
    },
];
/// Apply every migration newer than the recorded schema version.
///
/// Each step runs in its own transaction together with its `_migrations`
/// row, so a failed step leaves the previous version intact.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("_migrations table: {e}")))?;

    let applied = get_current_version(conn).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        debug!(version = applied, "Schema up to date");
        return Ok(());
    }

    for migration in pending {
        apply(conn, migration).await?;
    }
    info!(
        from = applied,
        to = get_current_version(conn).await?,
        "Schema migrated"
    );
    Ok(())
}

async fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let failed = |step: &str, e: libsql::Error| {
        DatabaseError::Migration(format!(
            "V{} {} ({step}): {e}",
            migration.version, migration.name
        ))
    };

    info!(version = migration.version, name = migration.name, "Applying migration");
    let tx = conn.transaction().await.map_err(|e| failed("begin", e))?;
    tx.execute_batch(migration.sql)
        .await
        .map_err(|e| failed("schema", e))?;
    tx.execute(
        "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![migration.version, migration.name],
    )
    .await
    .map_err(|e| failed("record", e))?;
    tx.commit().await.map_err(|e| failed("commit", e))
}

/// Highest recorded migration version; 0 on a fresh database.
pub(crate) async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("schema version: {e}")))?;
    match rows.next().await {
        Ok(Some(row)) => match row.get_value(0) {
            Ok(Value::Integer(version)) => Ok(version),
            Ok(other) => Err(DatabaseError::Migration(format!(
                "schema version: unexpected {other:?}"
            ))),
            Err(e) => Err(DatabaseError::Migration(format!("schema version: {e}"))),
        },
        Ok(None) => Ok(0),
        Err(e) => Err(DatabaseError::Migration(format!("schema version: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn migrated() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        let conn = db.connect().unwrap();
        run_migrations(&conn).await.unwrap();
        conn
    }

    async fn single_text(conn: &Connection, sql: &str) -> Vec<String> {
        let mut rows = conn.query(sql, ()).await.unwrap();
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            out.push(row.get::<String>(0).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn every_audited_table_exists() {
        let conn = migrated().await;
        let tables = single_text(
            &conn,
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .await;

        for expected in [
            "_migrations",
            "citations",
            "conversation_types",
            "conversations",
            "genai_models",
            "messages",
            "system_prompt_overrides",
            "user_feedback",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
    }

    #[tokio::test]
    async fn rerun_records_each_step_once() {
        let conn = migrated().await;
        run_migrations(&conn).await.unwrap();

        let names = single_text(&conn, "SELECT name FROM _migrations ORDER BY version").await;
        let declared: Vec<&str> = MIGRATIONS.iter().map(|m| m.name).collect();
        assert_eq!(names, declared);
        assert_eq!(
            get_current_version(&conn).await.unwrap(),
            MIGRATIONS.last().map_or(0, |m| m.version)
        );
    }

    #[tokio::test]
    async fn feedback_table_accepts_unknown_message_id() {
        let conn = migrated().await;

        // No REFERENCES clause, so an orphan row is accepted.
        conn.execute(
            "INSERT INTO user_feedback (message_id, rating, submitted_at, created_at)
             VALUES ('00000000-0000-0000-0000-000000000042', 5, '2024-05-01T00:00:00Z', '2024-05-01T00:00:00Z')",
            (),
        )
        .await
        .unwrap();
    }
}
