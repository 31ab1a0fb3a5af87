// ==========================================
// Test helpers - fixture files for pipeline tests
// ==========================================
// Builds a `files_required/` input directory with tapes and
// reference grids, and opens a schema-initialized temp database.

// Each test binary uses its own subset of these helpers
#![allow(dead_code)]

use chrono::NaiveDate;
use loan_engine::db;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Purchase date used across fixtures: Tuesday 2024-06-11.
pub fn fixture_pdate() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 11).unwrap()
}

pub fn write_csv(path: &Path, lines: &[&str]) {
    fs::write(path, lines.join("\n")).expect("write fixture file");
}

/// Create `<root>/files_required/` and return its path.
pub fn files_required_dir(root: &Path) -> PathBuf {
    let dir = root.join("files_required");
    fs::create_dir_all(&dir).expect("create files_required");
    dir
}

/// The four decorative rows exhibit tapes carry above the header.
pub const EXHIBIT_BANNER: [&str; 4] = [
    "Exhibit A to Form of Sale Notice,,",
    "Pre-Funding,,",
    ",,",
    ",,",
];

const PRIME_HEADER: &str = "Account Number,SELLER Loan #,Loan Group,Loan Program,Application Type,Orig. Balance,APR,Purchase Price,Lender Price(%),FICO Borrower,Income,DTI,PTI,Term,Property State";

const SFY_HEADER: &str = "Account #,SELLER Loan #,Loan Group,Loan Program,Application Type,Orig. Balance,Note Rate,Purchase Price,Lender Price(%),FICO,Annual Income,DTI,PTI,Term,Property State";

/// One Prime exhibit data row. Balance/price as plain decimals.
pub fn prime_row(account: &str, balance: &str, price: &str, fico: &str) -> String {
    format!(
        "{},,PR2,home-12,,{},7.99,{},98,{},60000,30,10,144,",
        account, balance, price, fico
    )
}

/// One SFY exhibit data row (FX1 loan group tags it SFY).
pub fn sfy_row(account: &str, balance: &str, price: &str, fico: &str) -> String {
    format!(
        "{},,FX1,solar-20,,{},7.99,{},98,{},60000,30,10,144,",
        account, balance, price, fico
    )
}

pub fn write_prime_tape(dir: &Path, rows: &[String]) {
    let mut lines: Vec<&str> = EXHIBIT_BANNER.to_vec();
    lines.push(PRIME_HEADER);
    let rows: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
    lines.extend(rows);
    write_csv(&dir.join("PRIME_06-11-2024_ExhibitA.csv"), &lines);
}

pub fn write_sfy_tape(dir: &Path, rows: &[String]) {
    let mut lines: Vec<&str> = EXHIBIT_BANNER.to_vec();
    lines.push(SFY_HEADER);
    let rows: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
    lines.extend(rows);
    write_csv(&dir.join("SFY_06-11-2024_ExhibitA.csv"), &lines);
}

/// Servicing loans tape, dated the day before the purchase date.
pub fn write_servicing_tape(dir: &Path, rows: &[String]) {
    let mut lines = vec!["Account Number,Status Codes,Property State"];
    let rows: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
    lines.extend(rows);
    write_csv(&dir.join("Tape20Loans_06-10-2024.csv"), &lines);
}

/// Standard reference grid set. Reference price for both programs is
/// UPB * 0.98 at any rate up to 12%.
pub fn write_reference_fixtures(dir: &Path) {
    write_csv(
        &dir.join("master_sheet.csv"),
        &[
            "loan program,platform,type",
            "home-12,PRIME,standard",
            "solar-20,SFY,standard",
        ],
    );
    write_csv(
        &dir.join("pricing_grid.csv"),
        &[
            "loan_program,min_rate,max_rate,price_pct",
            "home-12,0,12,0.98",
            "solar-20,0,12,0.98",
        ],
    );
    write_csv(
        &dir.join("underwriting_prime.csv"),
        &[
            "finance_type_name_nls,monthly_income_min,fico_min,approval_high,dti_max,pti_ratio",
            "home-12,0,640,100000,45,15",
        ],
    );
    write_csv(
        &dir.join("underwriting_sfy.csv"),
        &[
            "finance_type_name_nls,monthly_income_min,fico_min,approval_high,dti_max,pti_ratio",
            "solar-20,0,640,100000,45,15",
        ],
    );
    write_csv(
        &dir.join("underwriting_notes.csv"),
        &["finance_type_name_nls,monthly_income_min,fico_min,approval_high,dti_max,pti_ratio"],
    );
    write_csv(
        &dir.join("comap_prime.csv"),
        &["loan_program,min_fico", "home-12,600"],
    );
    write_csv(
        &dir.join("comap_sfy.csv"),
        &["loan_program,min_fico", "solar-20,600"],
    );
    write_csv(&dir.join("comap_notes.csv"), &["loan_program,min_fico"]);
    write_csv(
        &dir.join("current_assets.csv"),
        &["SELLER Loan #,Purchase_Date", "SFC_9001,2024-01-15"],
    );
}

/// Temp database with the schema applied, shared the way the
/// executor and repositories share it.
pub fn open_test_db(root: &Path) -> Arc<Mutex<Connection>> {
    let conn = db::open_sqlite_connection(&root.join("test.db")).expect("open db");
    db::init_schema(&conn).expect("init schema");
    Arc::new(Mutex::new(conn))
}
