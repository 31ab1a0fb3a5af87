// ==========================================
// Pipeline end-to-end tests
// ==========================================
// Full executor runs against a temp input directory and a temp
// SQLite database: discovery -> parse -> normalize -> enrich ->
// rules -> disposition -> persistence.
// ==========================================

mod test_helpers;

use loan_engine::config::{RejectionCriteriaMap, Settings};
use loan_engine::domain::types::{Disposition, RunStatus};
use loan_engine::engine::PipelineExecutor;
use loan_engine::logging;
use loan_engine::repository::{LoanExceptionRepository, LoanFactRepository, RunRepository};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use test_helpers::*;

struct TestRig {
    executor: PipelineExecutor<Settings>,
    runs: RunRepository,
    facts: LoanFactRepository,
    exceptions: LoanExceptionRepository,
}

fn rig(root: &Path, conn: Arc<Mutex<Connection>>) -> TestRig {
    let settings = Settings {
        input_dir: root.to_path_buf(),
        db_path: root.join("test.db"),
        ..Settings::default()
    };
    let runs = RunRepository::new(Arc::clone(&conn));
    let facts = LoanFactRepository::new(Arc::clone(&conn));
    let exceptions = LoanExceptionRepository::new(Arc::clone(&conn));
    let executor = PipelineExecutor::new(
        Arc::new(settings),
        RejectionCriteriaMap::standard(),
        runs.clone(),
        facts.clone(),
        exceptions.clone(),
    );
    TestRig {
        executor,
        runs,
        facts,
        exceptions,
    }
}

#[tokio::test]
async fn test_price_mismatch_rejected_and_clean_loans_purchased() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let req = files_required_dir(dir.path());
    write_reference_fixtures(&req);
    write_servicing_tape(&req, &[]);

    // Reference price = 25000 * 0.98 = 24500; tolerance 100.
    // 1001 quotes 24500 (exact), 1002 quotes 25000 ($500 over).
    write_prime_tape(
        &req,
        &[
            prime_row("1001", "25000", "24500", "720"),
            prime_row("1002", "25000", "25000", "720"),
        ],
    );
    // SFY loan within tolerance, passes everything.
    write_sfy_tape(&req, &[sfy_row("2001", "18000", "17640", "710")]);

    let db = open_test_db(dir.path());
    let rig = rig(dir.path(), db);

    let run = rig.executor.execute(Some(fixture_pdate())).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.total_loans, 3);
    assert_eq!(run.to_purchase_count, 2);
    assert_eq!(run.rejected_count, 1);
    assert_eq!(run.exceptions_count, 1);
    // 2024-06-11 is a Tuesday, Monday = 0
    assert_eq!(run.run_weekday, 1);
    assert_eq!(run.run_weekday_name, "Tuesday");
    assert!(run.eligibility_summary.is_some());

    let rejected = rig
        .facts
        .list_by_disposition(&run.run_id, Disposition::Rejected)
        .unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].loan_id, "1002");
    assert_eq!(
        rejected[0].rejection_criteria,
        Some("notebook.purchase_price_mismatch".to_string())
    );

    let purchased = rig
        .facts
        .list_by_disposition(&run.run_id, Disposition::ToPurchase)
        .unwrap();
    assert_eq!(purchased.len(), 2);
    assert!(purchased.iter().all(|f| f.rejection_criteria.is_none()));

    // Computed seller number and SFY tagging on the solar loan
    let sfy_fact = purchased.iter().find(|f| f.loan_id == "2001").unwrap();
    assert_eq!(sfy_fact.seller_loan_number, "SFC_2001");
    assert_eq!(sfy_fact.platform.to_db_str(), "SFY");

    let exceptions = rig.exceptions.list_by_run(&run.run_id).unwrap();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].loan_id, "1002");
    assert_eq!(exceptions[0].exception_type, "purchase_price");
    assert_eq!(
        exceptions[0].rejection_criteria,
        "notebook.purchase_price_mismatch"
    );
}

#[tokio::test]
async fn test_one_bad_row_yields_n_loans_and_one_error() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let req = files_required_dir(dir.path());
    write_reference_fixtures(&req);
    write_servicing_tape(&req, &[]);

    write_prime_tape(
        &req,
        &[
            prime_row("1001", "25000", "24500", "720"),
            // Unparsable balance: recovered, not fatal
            prime_row("1002", "not-a-number", "24500", "720"),
            prime_row("1003", "25000", "24500", "720"),
        ],
    );
    write_sfy_tape(&req, &[]);

    let db = open_test_db(dir.path());
    let rig = rig(dir.path(), db);

    let run = rig.executor.execute(Some(fixture_pdate())).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.total_loans, 2);
    assert_eq!(run.normalization_errors.len(), 1);
    assert_eq!(run.normalization_errors[0].row_number, 2);

    // The persisted run carries the same errors
    let loaded = rig.runs.get(&run.run_id).unwrap().unwrap();
    assert_eq!(loaded.normalization_errors.len(), 1);
}

#[tokio::test]
async fn test_missing_reference_grid_fails_run_with_no_facts() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let req = files_required_dir(dir.path());
    write_reference_fixtures(&req);
    std::fs::remove_file(req.join("pricing_grid.csv")).unwrap();
    write_servicing_tape(&req, &[]);
    write_prime_tape(&req, &[prime_row("1001", "25000", "24500", "720")]);
    write_sfy_tape(&req, &[]);

    let db = open_test_db(dir.path());
    let rig = rig(dir.path(), db);

    let result = rig.executor.execute(Some(fixture_pdate())).await;
    assert!(result.is_err());

    // Exactly one run row, marked failed in the reference phase,
    // with no facts or exceptions committed
    let failed = rig.runs.list_by_weekday(1).unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].status, RunStatus::Failed);
    assert!(failed[0].failure_reason.is_some());
    assert_eq!(failed[0].last_phase, Some("load_reference_data".to_string()));
    assert!(rig.facts.list_by_run(&failed[0].run_id).unwrap().is_empty());
    assert!(rig
        .exceptions
        .list_by_run(&failed[0].run_id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_eligibility_shares_measured_over_all_tape_loans() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let req = files_required_dir(dir.path());
    write_reference_fixtures(&req);
    write_servicing_tape(&req, &[]);

    // 1001 (low FICO, 4% of prime balance) is purchased; 1002 is
    // rejected on price but still carries 96% of the balance. The
    // short/low-FICO share must be 4 of 100, not 4 of 4.
    write_prime_tape(
        &req,
        &[
            prime_row("1001", "4000", "3920", "650"),
            prime_row("1002", "96000", "96000", "720"),
        ],
    );
    write_sfy_tape(&req, &[]);

    let db = open_test_db(dir.path());
    let rig = rig(dir.path(), db);

    let run = rig.executor.execute(Some(fixture_pdate())).await.unwrap();
    assert_eq!(run.to_purchase_count, 1);
    assert_eq!(run.rejected_count, 1);

    let summary = run.eligibility_summary.unwrap();
    assert_eq!(summary["all_passed"], serde_json::json!(true));
    let check = summary["checks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["bucket"] == "standard_short_low_fico" && c["loan_count"] == 1)
        .unwrap();
    assert_eq!(check["passed"], serde_json::json!(true));
}

#[tokio::test]
async fn test_servicing_overlay_fills_property_state() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let req = files_required_dir(dir.path());
    write_reference_fixtures(&req);
    write_servicing_tape(&req, &["1001,AB CD,CA".to_string()]);
    write_prime_tape(&req, &[prime_row("1001", "25000", "24500", "720")]);
    write_sfy_tape(&req, &[]);

    let db = open_test_db(dir.path());
    let rig = rig(dir.path(), db);

    let run = rig.executor.execute(Some(fixture_pdate())).await.unwrap();
    let facts = rig.facts.list_by_run(&run.run_id).unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].property_state, Some("CA".to_string()));
}

#[tokio::test]
async fn test_rerun_same_inputs_same_dispositions() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let req = files_required_dir(dir.path());
    write_reference_fixtures(&req);
    write_servicing_tape(&req, &[]);
    write_prime_tape(
        &req,
        &[
            prime_row("1001", "25000", "24500", "720"),
            prime_row("1002", "25000", "25000", "720"),
        ],
    );
    write_sfy_tape(&req, &[]);

    let db = open_test_db(dir.path());
    let rig = rig(dir.path(), db);

    let first = rig.executor.execute(Some(fixture_pdate())).await.unwrap();
    let second = rig.executor.execute(Some(fixture_pdate())).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    for run in [&first, &second] {
        let rejected = rig
            .facts
            .list_by_disposition(&run.run_id, Disposition::Rejected)
            .unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].loan_id, "1002");
        assert_eq!(
            rejected[0].rejection_criteria,
            Some("notebook.purchase_price_mismatch".to_string())
        );
    }

    // Both runs land in the same weekday bucket, newest first
    let tuesday_runs = rig.runs.list_by_weekday(1).unwrap();
    assert_eq!(tuesday_runs.len(), 2);
}
