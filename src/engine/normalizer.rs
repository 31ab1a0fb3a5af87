// ==========================================
// Loan Engine - loan normalizer
// ==========================================
// Raw tape rows -> canonical NormalizedLoan records. Row-level
// failures are recovered into NormalizationError entries so one bad
// row never aborts a tape; structural failures (a tape that cannot
// be parsed at all) stay fatal upstream.
// ==========================================

use crate::domain::loan::{NormalizedLoan, RawLoanRecord};
use crate::domain::run::NormalizationError;
use crate::domain::types::TapeType;
use crate::importer::{FieldMapper, ImportError, RowMap};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

pub struct LoanNormalizer {
    /// Purchase date stamped onto every normalized loan.
    purchase_date: NaiveDate,
    seen_loan_ids: HashSet<String>,
}

impl LoanNormalizer {
    pub fn new(purchase_date: NaiveDate) -> Self {
        Self {
            purchase_date,
            seen_loan_ids: HashSet::new(),
        }
    }

    /// Normalize one tape's rows. Loan-id uniqueness is enforced
    /// across all tapes fed through the same normalizer.
    pub fn normalize_tape(
        &mut self,
        rows: &[RowMap],
        tape: TapeType,
    ) -> (Vec<NormalizedLoan>, Vec<NormalizationError>) {
        let mut loans = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            // Row numbers are 1-based and refer to data rows after the header
            let row_number = idx + 1;

            let raw = match FieldMapper::map_row(row, tape, row_number) {
                Ok(raw) => raw,
                Err(err) => {
                    errors.push(Self::mapping_error(tape, row_number, err));
                    continue;
                }
            };

            match self.normalize_record(raw) {
                Ok(loan) => loans.push(loan),
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            info!(tape = %tape, loans = loans.len(), "tape normalized");
        } else {
            warn!(
                tape = %tape,
                loans = loans.len(),
                errors = errors.len(),
                "tape normalized with row errors"
            );
        }
        (loans, errors)
    }

    fn normalize_record(&mut self, raw: RawLoanRecord) -> Result<NormalizedLoan, NormalizationError> {
        let loan_id = raw
            .account_number
            .clone()
            .ok_or_else(|| Self::field_error(&raw, "Account Number", "missing loan identifier"))?;

        if !self.seen_loan_ids.insert(loan_id.clone()) {
            return Err(Self::field_error(
                &raw,
                "Account Number",
                &format!("duplicate loan identifier '{}'", loan_id),
            ));
        }

        let loan_program = raw
            .loan_program
            .clone()
            .ok_or_else(|| Self::field_error(&raw, "Loan Program", "missing loan program"))?;

        let upb = raw
            .orig_balance
            .ok_or_else(|| Self::field_error(&raw, "Orig. Balance", "missing balance"))?;
        let interest_rate = raw
            .interest_rate
            .ok_or_else(|| Self::field_error(&raw, "APR", "missing interest rate"))?;
        let purchase_price_quoted = raw
            .purchase_price
            .ok_or_else(|| Self::field_error(&raw, "Purchase Price", "missing purchase price"))?;

        Ok(NormalizedLoan {
            loan_id,
            seller_loan_number: raw.seller_loan_number,
            loan_group: raw.loan_group,
            loan_program,
            application_type: raw.application_type,
            upb,
            interest_rate,
            purchase_price_quoted,
            lender_price_pct: raw.lender_price_pct,
            fico: raw.fico,
            annual_income: raw.annual_income,
            dti: raw.dti,
            pti: raw.pti,
            term_months: raw.term_months,
            origination_date: raw.open_date,
            submit_date: raw.submit_date,
            purchase_date: self.purchase_date,
            status_codes: raw.status_codes,
            property_state: raw.property_state,
            tape: raw.tape,
            row_number: raw.row_number,
        })
    }

    fn field_error(raw: &RawLoanRecord, field: &str, message: &str) -> NormalizationError {
        NormalizationError {
            tape: raw.tape,
            row_number: raw.row_number,
            field: Some(field.to_string()),
            message: message.to_string(),
        }
    }

    fn mapping_error(tape: TapeType, row_number: usize, err: ImportError) -> NormalizationError {
        let field = match &err {
            ImportError::TypeConversionError { field, .. } => Some(field.clone()),
            ImportError::DateFormatError { field, .. } => Some(field.clone()),
            _ => None,
        };
        NormalizationError {
            tape,
            row_number,
            field,
            message: err.to_string(),
        }
    }
}
