// ==========================================
// Loan Engine - loan domain models
// ==========================================
// RawLoanRecord: as mapped from a source tape row, loosely typed
// NormalizedLoan: canonical schema shared by SFY and Prime
// EnrichedLoan: normalized + derived flags, owned by one run
// ==========================================

use crate::domain::types::TapeType;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// RawLoanRecord - one tape row after field mapping
// ==========================================
// Ephemeral: consumed by the normalizer, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLoanRecord {
    pub account_number: Option<String>,
    pub seller_loan_number: Option<String>,

    pub loan_group: Option<String>,
    pub loan_program: Option<String>,
    pub application_type: Option<String>,

    // Monetary / numeric fields stay decimal to avoid float drift
    pub orig_balance: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub lender_price_pct: Option<Decimal>,

    pub fico: Option<i32>,
    pub annual_income: Option<Decimal>,
    pub dti: Option<Decimal>,
    pub pti: Option<Decimal>,
    pub term_months: Option<i32>,

    pub open_date: Option<NaiveDate>,
    pub submit_date: Option<NaiveDate>,
    pub status_codes: Option<String>,
    pub property_state: Option<String>,

    pub tape: TapeType,
    pub row_number: usize,
}

// ==========================================
// NormalizedLoan - canonical loan schema
// ==========================================
// Invariant: loan_id is unique within a run after normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedLoan {
    pub loan_id: String,
    pub seller_loan_number: Option<String>,

    pub loan_group: Option<String>,
    pub loan_program: String,
    pub application_type: Option<String>,

    /// Unpaid principal balance.
    pub upb: Decimal,
    pub interest_rate: Decimal,
    pub purchase_price_quoted: Decimal,
    pub lender_price_pct: Option<Decimal>,

    pub fico: Option<i32>,
    pub annual_income: Option<Decimal>,
    pub dti: Option<Decimal>,
    pub pti: Option<Decimal>,
    pub term_months: Option<i32>,

    pub origination_date: Option<NaiveDate>,
    pub submit_date: Option<NaiveDate>,
    /// The run's purchase date, stamped at normalization.
    pub purchase_date: NaiveDate,

    pub status_codes: Option<String>,
    pub property_state: Option<String>,

    pub tape: TapeType,
    pub row_number: usize,
}

// ==========================================
// EnrichedLoan - normalized + derived fields
// ==========================================
// Owned exclusively by the pipeline for the duration of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedLoan {
    pub loan: NormalizedLoan,

    /// Always present after enrichment (computed `SFC_{account}` when absent).
    pub seller_loan_number: String,
    /// SFY / PRIME tag derived from the loan group.
    pub platform: TapeType,
    /// Loan type resolved from the loan-types master (standard, hybrid, ...).
    pub loan_type: Option<String>,
    /// Seller loan number already present in the existing-assets snapshot.
    pub is_repurchase: bool,
    /// Application type is HD NOTE; routes to the notes grids.
    pub is_note: bool,
    /// Program key used against the grids (`notes` suffix for note loans).
    pub grid_program: String,
}

impl EnrichedLoan {
    pub fn loan_id(&self) -> &str {
        &self.loan.loan_id
    }
}
