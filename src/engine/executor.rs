// ==========================================
// Loan Engine - pipeline executor
// ==========================================
// Orchestrates one run: reference data -> tapes -> normalize ->
// enrich -> rules -> classify -> eligibility -> persist. Stages are
// strictly sequential; blocking file work runs off the async path.
// A failure at any stage marks the run failed and removes whatever
// was written for it, so readers only ever see whole runs.
// ==========================================

use crate::config::{PipelineConfigReader, RejectionCriteriaMap};
use crate::domain::loan::NormalizedLoan;
use crate::domain::run::{LoanFact, PipelineRun};
use crate::domain::types::{Disposition, RunStatus, TapeType};
use crate::engine::disposition::DispositionClassifier;
use crate::engine::eligibility::EligibilityAnalyzer;
use crate::engine::enricher::LoanEnricher;
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::exceptions::ExceptionCollector;
use crate::engine::normalizer::LoanNormalizer;
use crate::engine::rules::standard_rules;
use crate::engine::run_context::{next_tuesday, RunContext};
use crate::importer::{
    discover_input_files, discover_reference_files, ImportError, ReferenceData, RowMap,
    UniversalFileParser,
};
use chrono::{Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::repository::{LoanExceptionRepository, LoanFactRepository, RunRepository};

/// Banner rows above the header line in exhibit tapes.
pub const EXHIBIT_HEADER_OFFSET: usize = 4;

pub struct PipelineExecutor<C>
where
    C: PipelineConfigReader,
{
    config: Arc<C>,
    criteria: RejectionCriteriaMap,
    runs: RunRepository,
    facts: LoanFactRepository,
    exceptions: LoanExceptionRepository,
}

impl<C> PipelineExecutor<C>
where
    C: PipelineConfigReader,
{
    pub fn new(
        config: Arc<C>,
        criteria: RejectionCriteriaMap,
        runs: RunRepository,
        facts: LoanFactRepository,
        exceptions: LoanExceptionRepository,
    ) -> Self {
        Self {
            config,
            criteria,
            runs,
            facts,
            exceptions,
        }
    }

    /// Execute one run. `pdate` falls back to the configured default,
    /// then to the next Tuesday.
    pub async fn execute(&self, pdate: Option<NaiveDate>) -> PipelineResult<PipelineRun> {
        let pdate = match pdate {
            Some(date) => date,
            None => self
                .config
                .default_pdate()
                .await
                .map_err(config_err)?
                .unwrap_or_else(|| next_tuesday(Local::now().date_naive())),
        };
        let irr_target = self.config.irr_target().await.map_err(config_err)?;

        let ctx = RunContext::new(pdate, irr_target);
        let mut run = PipelineRun::new(ctx.run_id.clone(), pdate, ctx.irr_target);

        info!(
            run_id = %run.run_id,
            pdate = %pdate,
            weekday = run.run_weekday_name.as_str(),
            "pipeline run starting"
        );

        self.runs.insert(&run).map_err(PipelineError::from)?;
        self.runs
            .mark_running(&run.run_id)
            .map_err(PipelineError::from)?;
        run.status = RunStatus::Running;

        match self.run_pipeline(&ctx, &mut run).await {
            Ok(()) => {
                self.runs.finalize(&run).map_err(PipelineError::from)?;
                run.status = RunStatus::Completed;
                info!(
                    run_id = %run.run_id,
                    total = run.total_loans,
                    to_purchase = run.to_purchase_count,
                    rejected = run.rejected_count,
                    exceptions = run.exceptions_count,
                    "pipeline run completed"
                );
                Ok(run)
            }
            Err(err) => {
                error!(run_id = %run.run_id, error = %err, "pipeline run failed");
                // Remove partial output, then record the failure
                let _ = self.facts.delete_by_run(&run.run_id);
                let _ = self.exceptions.delete_by_run(&run.run_id);
                let _ = self.runs.mark_failed(&run.run_id, &err.to_string());
                Err(err)
            }
        }
    }

    fn phase(&self, run: &mut PipelineRun, phase: &str) -> PipelineResult<()> {
        info!(run_id = %run.run_id, phase, "pipeline phase");
        self.runs
            .set_phase(&run.run_id, phase)
            .map_err(PipelineError::from)?;
        run.last_phase = Some(phase.to_string());
        Ok(())
    }

    async fn run_pipeline(&self, ctx: &RunContext, run: &mut PipelineRun) -> PipelineResult<()> {
        self.phase(run, "load_reference_data")?;
        let input_dir = self.config.input_dir().await.map_err(config_err)?;
        let reference_dir = input_dir.clone();
        let reference = tokio::task::spawn_blocking(move || -> Result<ReferenceData, ImportError> {
            let files = discover_reference_files(&reference_dir)?;
            ReferenceData::load(&files)
        })
        .await
        .map_err(|e| PipelineError::Other(anyhow::anyhow!("reference load task failed: {}", e)))??;

        self.phase(run, "load_input_files")?;
        let pdate = ctx.pdate;
        let (servicing_rows, sfy_rows, prime_rows) = tokio::task::spawn_blocking(
            move || -> Result<(Vec<RowMap>, Vec<RowMap>, Vec<RowMap>), ImportError> {
                let files = discover_input_files(&input_dir, pdate)?;
                let servicing = UniversalFileParser::parse(&files.loans_tape)?;
                let sfy =
                    UniversalFileParser::parse_with_skip(&files.sfy_tape, EXHIBIT_HEADER_OFFSET)?;
                let prime =
                    UniversalFileParser::parse_with_skip(&files.prime_tape, EXHIBIT_HEADER_OFFSET)?;
                Ok((servicing, sfy, prime))
            },
        )
        .await
        .map_err(|e| PipelineError::Other(anyhow::anyhow!("tape parse task failed: {}", e)))??;

        self.phase(run, "normalize")?;
        let mut normalizer = LoanNormalizer::new(ctx.pdate);
        let (sfy_loans, sfy_errors) = normalizer.normalize_tape(&sfy_rows, TapeType::Sfy);
        let (prime_loans, prime_errors) = normalizer.normalize_tape(&prime_rows, TapeType::Prime);

        let mut loans: Vec<NormalizedLoan> = sfy_loans;
        loans.extend(prime_loans);
        run.normalization_errors = sfy_errors;
        run.normalization_errors.extend(prime_errors);

        if loans.is_empty() {
            return Err(PipelineError::MissingInput(
                "no loans survived normalization".to_string(),
            ));
        }

        apply_servicing_overlay(&mut loans, &servicing_rows);

        self.phase(run, "enrich")?;
        let enricher = LoanEnricher::new(&reference);
        let enriched = enricher.enrich_all(loans);

        self.phase(run, "rules")?;
        let price_tolerance = self.config.price_tolerance().await.map_err(config_err)?;
        let rules = standard_rules(price_tolerance);
        let classifier = DispositionClassifier::new(self.criteria.clone());
        let mut collector = ExceptionCollector::new(run.run_id.clone(), self.criteria.clone());

        self.phase(run, "classify")?;
        let mut facts: Vec<LoanFact> = Vec::with_capacity(enriched.len());
        let mut total_balance = Decimal::ZERO;

        for loan in &enriched {
            let outcomes: Vec<_> = rules.iter().map(|r| r.evaluate(loan, &reference)).collect();
            let classification = classifier.classify(&outcomes)?;
            collector.collect(loan, &classification.exceptions)?;

            total_balance += loan.loan.upb;
            match classification.disposition {
                Disposition::ToPurchase => run.to_purchase_count += 1,
                Disposition::Projected => run.projected_count += 1,
                Disposition::Rejected => run.rejected_count += 1,
            }

            facts.push(LoanFact {
                run_id: run.run_id.clone(),
                loan_id: loan.loan_id().to_string(),
                seller_loan_number: loan.seller_loan_number.clone(),
                platform: loan.platform,
                loan_program: loan.loan.loan_program.clone(),
                application_type: loan.loan.application_type.clone(),
                orig_balance: loan.loan.upb,
                purchase_price: loan.loan.purchase_price_quoted,
                lender_price_pct: loan.loan.lender_price_pct,
                fico: loan.loan.fico,
                dti: loan.loan.dti,
                pti: loan.loan.pti,
                term_months: loan.loan.term_months,
                property_state: loan.loan.property_state.clone(),
                disposition: classification.disposition,
                rejection_criteria: classification.rejection_criteria,
                created_at: Utc::now(),
            });
        }

        run.total_loans = facts.len() as i64;
        run.total_balance = total_balance;
        run.exceptions_count = collector.len() as i64;

        // Concentration shares are measured over every loan on the
        // tapes, not just the buy pool, so a rejection cannot shrink
        // a bucket's denominator.
        self.phase(run, "eligibility")?;
        let report = EligibilityAnalyzer::analyze(&enriched);
        run.eligibility_summary = Some(report.to_json());

        self.phase(run, "save_db")?;
        self.facts.batch_insert(&facts).map_err(PipelineError::from)?;
        self.exceptions
            .batch_insert(&collector.into_exceptions())
            .map_err(PipelineError::from)?;

        Ok(())
    }
}

fn config_err(err: Box<dyn std::error::Error>) -> PipelineError {
    PipelineError::Config(err.to_string())
}

/// Fill servicing fields missing from the exhibit tapes using the
/// servicing loans tape, joined by account number.
fn apply_servicing_overlay(loans: &mut [NormalizedLoan], servicing_rows: &[RowMap]) {
    let mut by_account: HashMap<&str, (&str, &str)> = HashMap::new();
    for row in servicing_rows {
        if let Some(account) = row.get("Account Number").map(|s| s.trim()) {
            if account.is_empty() {
                continue;
            }
            let status = row.get("Status Codes").map(|s| s.trim()).unwrap_or("");
            let state = row.get("Property State").map(|s| s.trim()).unwrap_or("");
            by_account.insert(account, (status, state));
        }
    }

    let mut overlaid = 0usize;
    for loan in loans.iter_mut() {
        if let Some((status, state)) = by_account.get(loan.loan_id.as_str()) {
            if loan.status_codes.is_none() && !status.is_empty() {
                loan.status_codes = Some((*status).to_string());
                overlaid += 1;
            }
            if loan.property_state.is_none() && !state.is_empty() {
                loan.property_state = Some((*state).to_string());
            }
        }
    }
    if overlaid > 0 {
        info!(loans = overlaid, "servicing overlay applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn normalized(loan_id: &str) -> NormalizedLoan {
        NormalizedLoan {
            loan_id: loan_id.to_string(),
            seller_loan_number: None,
            loan_group: None,
            loan_program: "home-12".to_string(),
            application_type: None,
            upb: dec!(25000),
            interest_rate: dec!(7.99),
            purchase_price_quoted: dec!(24500),
            lender_price_pct: None,
            fico: Some(720),
            annual_income: None,
            dti: None,
            pti: None,
            term_months: Some(144),
            origination_date: None,
            submit_date: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 6, 11).unwrap(),
            status_codes: None,
            property_state: None,
            tape: TapeType::Prime,
            row_number: 1,
        }
    }

    fn servicing_row(account: &str, status: &str, state: &str) -> RowMap {
        [
            ("Account Number", account),
            ("Status Codes", status),
            ("Property State", state),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_servicing_overlay_fills_missing_fields() {
        let mut loans = vec![normalized("1001"), normalized("1002")];
        let rows = vec![servicing_row("1001", "AB CD", "CA")];

        apply_servicing_overlay(&mut loans, &rows);

        assert_eq!(loans[0].status_codes, Some("AB CD".to_string()));
        assert_eq!(loans[0].property_state, Some("CA".to_string()));
        assert_eq!(loans[1].status_codes, None);
    }

    #[test]
    fn test_servicing_overlay_keeps_existing_values() {
        let mut loans = vec![normalized("1001")];
        loans[0].status_codes = Some("XY".to_string());
        let rows = vec![servicing_row("1001", "AB", "CA")];

        apply_servicing_overlay(&mut loans, &rows);

        assert_eq!(loans[0].status_codes, Some("XY".to_string()));
    }
}
