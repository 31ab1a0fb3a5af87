// ==========================================
// Loan Engine - loan enricher
// ==========================================
// NormalizedLoan -> EnrichedLoan. Pure derivation against the
// run-scoped reference snapshot; no loan is dropped here, missing
// reference joins surface later as rule failures.
// ==========================================

use crate::domain::loan::{EnrichedLoan, NormalizedLoan};
use crate::domain::types::TapeType;
use crate::importer::ReferenceData;
use tracing::info;

/// Loan groups that tag a loan to the SFY platform.
const SFY_LOAN_GROUPS: [&str; 2] = ["FX1", "FX3"];

/// Application type that routes a loan to the notes grids.
const NOTE_APPLICATION_TYPE: &str = "HD NOTE";

/// Grid-program suffix for note loans.
const NOTES_SUFFIX: &str = "_notes";

pub struct LoanEnricher<'a> {
    reference: &'a ReferenceData,
}

impl<'a> LoanEnricher<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    pub fn enrich_all(&self, loans: Vec<NormalizedLoan>) -> Vec<EnrichedLoan> {
        let enriched: Vec<EnrichedLoan> = loans.into_iter().map(|l| self.enrich(l)).collect();
        let repurchases = enriched.iter().filter(|l| l.is_repurchase).count();
        info!(
            loans = enriched.len(),
            repurchases, "loans enriched"
        );
        enriched
    }

    pub fn enrich(&self, loan: NormalizedLoan) -> EnrichedLoan {
        let platform = Self::platform_of(&loan);
        let seller_loan_number = loan
            .seller_loan_number
            .clone()
            .unwrap_or_else(|| format!("SFC_{}", loan.loan_id));

        let is_repurchase = self
            .reference
            .existing_assets
            .contains_as_of(&seller_loan_number, loan.purchase_date);

        let loan_type = self
            .reference
            .loan_types
            .get(&(loan.loan_program.clone(), platform))
            .cloned();

        let is_note = loan
            .application_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case(NOTE_APPLICATION_TYPE))
            .unwrap_or(false);

        let grid_program = if is_note {
            format!("{}{}", loan.loan_program, NOTES_SUFFIX)
        } else {
            loan.loan_program.clone()
        };

        EnrichedLoan {
            loan,
            seller_loan_number,
            platform,
            loan_type,
            is_repurchase,
            is_note,
            grid_program,
        }
    }

    /// SFY when the loan group carries an FX1/FX3 marker, otherwise
    /// the tape of origin decides.
    fn platform_of(loan: &NormalizedLoan) -> TapeType {
        match &loan.loan_group {
            Some(group) if SFY_LOAN_GROUPS.iter().any(|g| group.contains(g)) => TapeType::Sfy,
            Some(_) => TapeType::Prime,
            None => loan.tape,
        }
    }
}
