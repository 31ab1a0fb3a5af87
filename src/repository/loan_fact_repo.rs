// ==========================================
// Loan Engine - loan fact repository
// ==========================================
// Per-loan run results. Facts are written once per run inside a
// single transaction and only ever deleted as a whole run.
// ==========================================

use crate::domain::run::LoanFact;
use crate::domain::types::{Disposition, TapeType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub struct LoanFactRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LoanFactRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockPoisoned(e.to_string()))
    }

    /// Insert all facts for a run in one transaction.
    pub fn batch_insert(&self, facts: &[LoanFact]) -> RepositoryResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO loan_fact (
                    run_id, loan_id, seller_loan_number, platform, loan_program,
                    application_type, orig_balance, purchase_price, lender_price_pct,
                    fico, dti, pti, term_months, property_state,
                    disposition, rejection_criteria, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            for fact in facts {
                stmt.execute(params![
                    fact.run_id,
                    fact.loan_id,
                    fact.seller_loan_number,
                    fact.platform.to_db_str(),
                    fact.loan_program,
                    fact.application_type,
                    fact.orig_balance.to_string(),
                    fact.purchase_price.to_string(),
                    fact.lender_price_pct.map(|d| d.to_string()),
                    fact.fico,
                    fact.dti.map(|d| d.to_string()),
                    fact.pti.map(|d| d.to_string()),
                    fact.term_months,
                    fact.property_state,
                    fact.disposition.to_db_str(),
                    fact.rejection_criteria,
                    fact.created_at,
                ])?;
            }
        }
        tx.commit()?;

        info!(facts = facts.len(), "loan facts persisted");
        Ok(facts.len())
    }

    pub fn list_by_run(&self, run_id: &str) -> RepositoryResult<Vec<LoanFact>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT * FROM loan_fact WHERE run_id = ?1 ORDER BY loan_id")?;
        let rows = stmt.query_map(params![run_id], row_to_fact)?;
        collect(rows)
    }

    pub fn list_by_disposition(
        &self,
        run_id: &str,
        disposition: Disposition,
    ) -> RepositoryResult<Vec<LoanFact>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM loan_fact WHERE run_id = ?1 AND disposition = ?2 ORDER BY loan_id",
        )?;
        let rows = stmt.query_map(params![run_id, disposition.to_db_str()], row_to_fact)?;
        collect(rows)
    }

    /// Remove every fact for a run (failed-run cleanup).
    pub fn delete_by_run(&self, run_id: &str) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM loan_fact WHERE run_id = ?1", params![run_id])?;
        Ok(deleted)
    }
}

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<RepositoryResult<LoanFact>>>,
) -> RepositoryResult<Vec<LoanFact>> {
    let mut facts = Vec::new();
    for row in rows {
        facts.push(row??);
    }
    Ok(facts)
}

fn opt_decimal(column: &str, value: Option<String>) -> Result<Option<Decimal>, RepositoryError> {
    value
        .map(|v| {
            v.parse::<Decimal>()
                .map_err(|_| RepositoryError::Corrupted(format!("{}: '{}'", column, v)))
        })
        .transpose()
}

fn req_decimal(column: &str, value: String) -> Result<Decimal, RepositoryError> {
    value
        .parse::<Decimal>()
        .map_err(|_| RepositoryError::Corrupted(format!("{}: '{}'", column, value)))
}

fn row_to_fact(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<LoanFact>> {
    let platform: String = row.get("platform")?;
    let disposition: String = row.get("disposition")?;
    let orig_balance: String = row.get("orig_balance")?;
    let purchase_price: String = row.get("purchase_price")?;
    let lender_price_pct: Option<String> = row.get("lender_price_pct")?;
    let dti: Option<String> = row.get("dti")?;
    let pti: Option<String> = row.get("pti")?;
    let created_at: DateTime<Utc> = row.get("created_at")?;

    Ok((|| {
        Ok(LoanFact {
            run_id: row.get("run_id")?,
            loan_id: row.get("loan_id")?,
            seller_loan_number: row.get("seller_loan_number")?,
            platform: TapeType::from_str(&platform)
                .ok_or_else(|| RepositoryError::Corrupted(format!("platform: '{}'", platform)))?,
            loan_program: row.get("loan_program")?,
            application_type: row.get("application_type")?,
            orig_balance: req_decimal("orig_balance", orig_balance)?,
            purchase_price: req_decimal("purchase_price", purchase_price)?,
            lender_price_pct: opt_decimal("lender_price_pct", lender_price_pct)?,
            fico: row.get("fico")?,
            dti: opt_decimal("dti", dti)?,
            pti: opt_decimal("pti", pti)?,
            term_months: row.get("term_months")?,
            property_state: row.get("property_state")?,
            disposition: Disposition::from_str(&disposition).ok_or_else(|| {
                RepositoryError::Corrupted(format!("disposition: '{}'", disposition))
            })?,
            rejection_criteria: row.get("rejection_criteria")?,
            created_at,
        })
    })())
}
