// ==========================================
// Loan Engine - run context
// ==========================================
// Run identity and purchase-date arithmetic. Runs are segregated by
// weekday (Monday=0) so that the same pdate always lands in the same
// bucket and re-runs replace, never mix.
// ==========================================

use chrono::{Datelike, Local, NaiveDate, Weekday};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Weekday names indexed Monday=0 through Sunday=6.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Weekday index (Monday=0) and display name for a purchase date.
pub fn weekday_of(date: NaiveDate) -> (u8, &'static str) {
    let idx = date.weekday().num_days_from_monday() as u8;
    (idx, WEEKDAY_NAMES[idx as usize])
}

/// The next Tuesday strictly after `from`. Default pdate when none is
/// given on the command line.
pub fn next_tuesday(from: NaiveDate) -> NaiveDate {
    let mut date = from.succ_opt().unwrap_or(from);
    while date.weekday() != Weekday::Tue {
        date = match date.succ_opt() {
            Some(d) => d,
            None => return date,
        };
    }
    date
}

/// New run identifier: `run_{uuid12}_{yyyymmddHHMMSS}`.
pub fn new_run_id() -> String {
    let uuid12: String = Uuid::new_v4().simple().to_string().chars().take(12).collect();
    let stamp = Local::now().format("%Y%m%d%H%M%S");
    format!("run_{}_{}", uuid12, stamp)
}

// ==========================================
// RunContext - per-execution parameters
// ==========================================
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    /// Purchase date every loan in the run is stamped with.
    pub pdate: NaiveDate,
    pub irr_target: Decimal,
}

impl RunContext {
    pub fn new(pdate: NaiveDate, irr_target: Decimal) -> Self {
        Self {
            run_id: new_run_id(),
            pdate,
            irr_target,
        }
    }

    pub fn weekday(&self) -> u8 {
        weekday_of(self.pdate).0
    }

    pub fn weekday_name(&self) -> &'static str {
        weekday_of(self.pdate).1
    }
}
