//! Database schema migrations for avolve.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: token ledger, balance cache and streak counters.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS token_transactions (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            token       TEXT NOT NULL,
            kind        TEXT NOT NULL,
            amount      INTEGER NOT NULL,
            reason      TEXT NOT NULL DEFAULT '',
            counterparty TEXT,
            streak      INTEGER,
            multiplier  REAL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS token_balances (
            user_id     TEXT NOT NULL,
            token       TEXT NOT NULL,
            balance     INTEGER NOT NULL DEFAULT 0,
            updated_at  TEXT NOT NULL,
            PRIMARY KEY (user_id, token)
        );

        CREATE TABLE IF NOT EXISTS streaks (
            user_id            TEXT PRIMARY KEY,
            current            INTEGER NOT NULL DEFAULT 0,
            best               INTEGER NOT NULL DEFAULT 0,
            last_completed_on  TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_token_tx_user_created ON token_transactions(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_token_tx_kind_counterparty ON token_transactions(kind, counterparty, created_at);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: onboarding checklist progress.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS onboarding_steps (
            user_id       TEXT NOT NULL,
            step          TEXT NOT NULL,
            completed_at  TEXT NOT NULL,
            PRIMARY KEY (user_id, step)
        );",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: invitation codes, stored by digest.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS invitations (
            digest      TEXT PRIMARY KEY,
            created_by  TEXT NOT NULL,
            max_uses    INTEGER NOT NULL,
            uses        INTEGER NOT NULL DEFAULT 0,
            expires_at  TEXT,
            created_at  TEXT NOT NULL
        );",
    )?;

    set_schema_version(&tx, 3)?;
    tx.commit()
}
