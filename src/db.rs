// ==========================================
// Loan Engine - SQLite connection and schema
// ==========================================
// Decimal columns are stored as TEXT to keep exact money values;
// enums are stored via their to_db_str forms.
// ==========================================

use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Busy timeout for concurrent readers while a run is persisting.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Open (or create) the engine database and apply pragmas.
pub fn open_sqlite_connection(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(conn)
}

/// Create tables and indexes if absent. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_run (
            run_id                TEXT PRIMARY KEY,
            status                TEXT NOT NULL,
            pdate                 TEXT NOT NULL,
            irr_target            TEXT NOT NULL,
            run_weekday           INTEGER NOT NULL,
            run_weekday_name      TEXT NOT NULL,
            total_loans           INTEGER NOT NULL DEFAULT 0,
            total_balance         TEXT NOT NULL DEFAULT '0',
            to_purchase_count     INTEGER NOT NULL DEFAULT 0,
            projected_count       INTEGER NOT NULL DEFAULT 0,
            rejected_count        INTEGER NOT NULL DEFAULT 0,
            exceptions_count      INTEGER NOT NULL DEFAULT 0,
            normalization_errors  TEXT NOT NULL DEFAULT '[]',
            eligibility_summary   TEXT,
            last_phase            TEXT,
            failure_reason        TEXT,
            started_at            TEXT,
            completed_at          TEXT,
            created_at            TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_pipeline_run_weekday
            ON pipeline_run (run_weekday, created_at);

        CREATE TABLE IF NOT EXISTS loan_fact (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id              TEXT NOT NULL REFERENCES pipeline_run (run_id),
            loan_id             TEXT NOT NULL,
            seller_loan_number  TEXT NOT NULL,
            platform            TEXT NOT NULL,
            loan_program        TEXT NOT NULL,
            application_type    TEXT,
            orig_balance        TEXT NOT NULL,
            purchase_price      TEXT NOT NULL,
            lender_price_pct    TEXT,
            fico                INTEGER,
            dti                 TEXT,
            pti                 TEXT,
            term_months         INTEGER,
            property_state      TEXT,
            disposition         TEXT NOT NULL,
            rejection_criteria  TEXT,
            created_at          TEXT NOT NULL,
            UNIQUE (run_id, loan_id)
        );

        CREATE INDEX IF NOT EXISTS idx_loan_fact_run
            ON loan_fact (run_id, disposition);

        CREATE TABLE IF NOT EXISTS loan_exception (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id              TEXT NOT NULL REFERENCES pipeline_run (run_id),
            loan_id             TEXT NOT NULL,
            seller_loan_number  TEXT NOT NULL,
            exception_type      TEXT NOT NULL,
            exception_category  TEXT NOT NULL,
            severity            TEXT NOT NULL,
            rejection_criteria  TEXT NOT NULL,
            message             TEXT NOT NULL,
            created_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_loan_exception_run
            ON loan_exception (run_id, exception_type);
        "#,
    )?;

    info!("database schema ready");
    Ok(())
}
