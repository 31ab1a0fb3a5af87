// ==========================================
// Loan Engine - batch entry point
// ==========================================
// Usage: loan-engine [PDATE]
//   PDATE  purchase date (YYYY-MM-DD); defaults to the configured
//          date, then to the next Tuesday
// ==========================================

use chrono::NaiveDate;
use loan_engine::config::{RejectionCriteriaMap, Settings};
use loan_engine::engine::PipelineExecutor;
use loan_engine::repository::{LoanExceptionRepository, LoanFactRepository, RunRepository};
use loan_engine::{db, logging};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", loan_engine::APP_NAME);
    tracing::info!("version: {}", loan_engine::VERSION);
    tracing::info!("==================================================");

    let settings = Settings::from_env();

    let pdate = match std::env::args().nth(1) {
        Some(arg) => match NaiveDate::parse_from_str(&arg, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                tracing::error!("invalid purchase date '{}', expected YYYY-MM-DD", arg);
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    tracing::info!("database: {}", settings.db_path.display());
    tracing::info!("input directory: {}", settings.input_dir.display());

    let conn = match db::open_sqlite_connection(&settings.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            tracing::error!("failed to open database: {}", err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = db::init_schema(&conn) {
        tracing::error!("failed to initialize schema: {}", err);
        return ExitCode::FAILURE;
    }

    let shared = Arc::new(Mutex::new(conn));
    let executor = PipelineExecutor::new(
        Arc::new(settings),
        RejectionCriteriaMap::standard(),
        RunRepository::new(Arc::clone(&shared)),
        LoanFactRepository::new(Arc::clone(&shared)),
        LoanExceptionRepository::new(shared),
    );

    match executor.execute(pdate).await {
        Ok(run) => {
            tracing::info!(
                "run {} completed: {} loans, {} to purchase, {} rejected, {} exceptions",
                run.run_id,
                run.total_loans,
                run.to_purchase_count,
                run.rejected_count,
                run.exceptions_count
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("pipeline run failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
