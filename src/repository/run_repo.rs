// ==========================================
// Loan Engine - pipeline run repository
// ==========================================
// One row per run. Status transitions are single-column updates;
// finalize writes the whole results summary in one statement so a
// completed run is never half-written.
// ==========================================

use crate::domain::run::{NormalizationError, PipelineRun};
use crate::domain::types::RunStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct RunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RunRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))
    }

    pub fn insert(&self, run: &PipelineRun) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO pipeline_run (
                run_id, status, pdate, irr_target, run_weekday, run_weekday_name,
                total_loans, total_balance, to_purchase_count, projected_count,
                rejected_count, exceptions_count, normalization_errors,
                eligibility_summary, last_phase, failure_reason,
                started_at, completed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            params![
                run.run_id,
                run.status.to_db_str(),
                run.pdate,
                run.irr_target.to_string(),
                run.run_weekday,
                run.run_weekday_name,
                run.total_loans,
                run.total_balance.to_string(),
                run.to_purchase_count,
                run.projected_count,
                run.rejected_count,
                run.exceptions_count,
                serde_json::to_string(&run.normalization_errors)?,
                run.eligibility_summary
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                run.last_phase,
                run.failure_reason,
                run.started_at,
                run.completed_at,
                run.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn mark_running(&self, run_id: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE pipeline_run SET status = ?1, started_at = ?2 WHERE run_id = ?3",
            params![RunStatus::Running.to_db_str(), Utc::now(), run_id],
        )?;
        Ok(())
    }

    pub fn set_phase(&self, run_id: &str, phase: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE pipeline_run SET last_phase = ?1 WHERE run_id = ?2",
            params![phase, run_id],
        )?;
        Ok(())
    }

    pub fn mark_failed(&self, run_id: &str, reason: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE pipeline_run SET status = ?1, failure_reason = ?2, completed_at = ?3
             WHERE run_id = ?4",
            params![RunStatus::Failed.to_db_str(), reason, Utc::now(), run_id],
        )?;
        Ok(())
    }

    /// Write the full results summary and flip to completed.
    pub fn finalize(&self, run: &PipelineRun) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE pipeline_run SET
                status = ?1, total_loans = ?2, total_balance = ?3,
                to_purchase_count = ?4, projected_count = ?5, rejected_count = ?6,
                exceptions_count = ?7, normalization_errors = ?8,
                eligibility_summary = ?9, last_phase = ?10, completed_at = ?11
             WHERE run_id = ?12",
            params![
                RunStatus::Completed.to_db_str(),
                run.total_loans,
                run.total_balance.to_string(),
                run.to_purchase_count,
                run.projected_count,
                run.rejected_count,
                run.exceptions_count,
                serde_json::to_string(&run.normalization_errors)?,
                run.eligibility_summary
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                run.last_phase,
                Utc::now(),
                run.run_id,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, run_id: &str) -> RepositoryResult<Option<PipelineRun>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT * FROM pipeline_run WHERE run_id = ?1")?;
        let mut rows = stmt.query_map(params![run_id], row_to_run)?;
        match rows.next() {
            Some(row) => Ok(Some(row??)),
            None => Ok(None),
        }
    }

    /// Runs in one weekday bucket, newest first.
    pub fn list_by_weekday(&self, weekday: u8) -> RepositoryResult<Vec<PipelineRun>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM pipeline_run WHERE run_weekday = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![weekday], row_to_run)?;
        let mut runs = Vec::new();
        for row in rows {
            runs.push(row??);
        }
        Ok(runs)
    }

    /// Latest completed run for a purchase date, if any.
    pub fn latest_completed_for_pdate(
        &self,
        pdate: NaiveDate,
    ) -> RepositoryResult<Option<PipelineRun>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM pipeline_run WHERE pdate = ?1 AND status = 'completed'
             ORDER BY completed_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![pdate], row_to_run)?;
        match rows.next() {
            Some(row) => Ok(Some(row??)),
            None => Ok(None),
        }
    }
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, RepositoryError> {
    value
        .parse::<Decimal>()
        .map_err(|_| RepositoryError::Corrupted(format!("{}: '{}'", column, value)))
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<PipelineRun>> {
    let irr_target: String = row.get("irr_target")?;
    let total_balance: String = row.get("total_balance")?;
    let status: String = row.get("status")?;
    let normalization_errors: String = row.get("normalization_errors")?;
    let eligibility_summary: Option<String> = row.get("eligibility_summary")?;
    let pdate: NaiveDate = row.get("pdate")?;
    let started_at: Option<DateTime<Utc>> = row.get("started_at")?;
    let completed_at: Option<DateTime<Utc>> = row.get("completed_at")?;
    let created_at: DateTime<Utc> = row.get("created_at")?;

    Ok((|| {
        Ok(PipelineRun {
            run_id: row.get("run_id")?,
            status: RunStatus::from_str(&status),
            pdate,
            irr_target: parse_decimal("irr_target", &irr_target)?,
            run_weekday: row.get("run_weekday")?,
            run_weekday_name: row.get("run_weekday_name")?,
            total_loans: row.get("total_loans")?,
            total_balance: parse_decimal("total_balance", &total_balance)?,
            to_purchase_count: row.get("to_purchase_count")?,
            projected_count: row.get("projected_count")?,
            rejected_count: row.get("rejected_count")?,
            exceptions_count: row.get("exceptions_count")?,
            normalization_errors: serde_json::from_str::<Vec<NormalizationError>>(
                &normalization_errors,
            )?,
            eligibility_summary: eligibility_summary
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            last_phase: row.get("last_phase")?,
            failure_reason: row.get("failure_reason")?,
            started_at,
            completed_at,
            created_at,
        })
    })())
}
