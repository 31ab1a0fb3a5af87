// ==========================================
// Loan Engine - loan exception repository
// ==========================================

use crate::domain::run::LoanException;
use crate::domain::types::ExceptionSeverity;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub struct LoanExceptionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LoanExceptionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))
    }

    /// Insert all exceptions for a run in one transaction.
    pub fn batch_insert(&self, exceptions: &[LoanException]) -> RepositoryResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO loan_exception (
                    run_id, loan_id, seller_loan_number, exception_type,
                    exception_category, severity, rejection_criteria, message, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for exc in exceptions {
                stmt.execute(params![
                    exc.run_id,
                    exc.loan_id,
                    exc.seller_loan_number,
                    exc.exception_type,
                    exc.exception_category,
                    exc.severity.to_db_str(),
                    exc.rejection_criteria,
                    exc.message,
                    exc.created_at,
                ])?;
            }
        }
        tx.commit()?;

        info!(exceptions = exceptions.len(), "loan exceptions persisted");
        Ok(exceptions.len())
    }

    pub fn list_by_run(&self, run_id: &str) -> RepositoryResult<Vec<LoanException>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT * FROM loan_exception WHERE run_id = ?1 ORDER BY loan_id, id")?;
        let rows = stmt.query_map(params![run_id], row_to_exception)?;
        let mut exceptions = Vec::new();
        for row in rows {
            exceptions.push(row?);
        }
        Ok(exceptions)
    }

    pub fn list_by_loan(&self, run_id: &str, loan_id: &str) -> RepositoryResult<Vec<LoanException>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM loan_exception WHERE run_id = ?1 AND loan_id = ?2 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![run_id, loan_id], row_to_exception)?;
        let mut exceptions = Vec::new();
        for row in rows {
            exceptions.push(row?);
        }
        Ok(exceptions)
    }

    /// Remove every exception for a run (failed-run cleanup).
    pub fn delete_by_run(&self, run_id: &str) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let deleted =
            conn.execute("DELETE FROM loan_exception WHERE run_id = ?1", params![run_id])?;
        Ok(deleted)
    }
}

fn row_to_exception(row: &Row<'_>) -> rusqlite::Result<LoanException> {
    let severity: String = row.get("severity")?;
    let created_at: DateTime<Utc> = row.get("created_at")?;

    Ok(LoanException {
        run_id: row.get("run_id")?,
        loan_id: row.get("loan_id")?,
        seller_loan_number: row.get("seller_loan_number")?,
        exception_type: row.get("exception_type")?,
        exception_category: row.get("exception_category")?,
        severity: ExceptionSeverity::from_str(&severity),
        rejection_criteria: row.get("rejection_criteria")?,
        message: row.get("message")?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::run::PipelineRun;
    use crate::repository::run_repo::RunRepository;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn repos() -> (RunRepository, LoanExceptionRepository) {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        (
            RunRepository::new(Arc::clone(&shared)),
            LoanExceptionRepository::new(shared),
        )
    }

    fn seed_run(runs: &RunRepository, run_id: &str) {
        let pdate = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
        runs.insert(&PipelineRun::new(run_id.to_string(), pdate, dec!(8.05)))
            .unwrap();
    }

    fn exception(run_id: &str, loan_id: &str, exc_type: &str) -> LoanException {
        LoanException {
            run_id: run_id.to_string(),
            loan_id: loan_id.to_string(),
            seller_loan_number: format!("SFC_{}", loan_id),
            exception_type: exc_type.to_string(),
            exception_category: "flagged".to_string(),
            severity: ExceptionSeverity::Error,
            rejection_criteria: format!("notebook.{}", exc_type),
            message: "check failed".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_batch_insert_and_list() {
        let (runs, exceptions) = repos();
        seed_run(&runs, "run_a");

        exceptions
            .batch_insert(&[
                exception("run_a", "1001", "underwriting_prime"),
                exception("run_a", "1001", "comap_prime"),
                exception("run_a", "1002", "underwriting_sfy"),
            ])
            .unwrap();

        let all = exceptions.list_by_run("run_a").unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].severity, ExceptionSeverity::Error);

        let by_loan = exceptions.list_by_loan("run_a", "1001").unwrap();
        assert_eq!(by_loan.len(), 2);
        assert_eq!(by_loan[0].exception_type, "underwriting_prime");
    }

    #[test]
    fn test_delete_by_run() {
        let (runs, exceptions) = repos();
        seed_run(&runs, "run_a");

        exceptions
            .batch_insert(&[exception("run_a", "1001", "comap_prime")])
            .unwrap();
        assert_eq!(exceptions.delete_by_run("run_a").unwrap(), 1);
        assert!(exceptions.list_by_run("run_a").unwrap().is_empty());
    }
}
