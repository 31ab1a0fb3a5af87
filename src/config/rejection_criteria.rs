// ==========================================
// Loan Engine - canonical rejection criteria mapping
// ==========================================
// Maps (exception_type, exception_category) to the canonical
// notebook.* key used by reporting and disposition.
// Loaded once at process start and passed explicitly; a rule
// failure with no mapping entry is a configuration error, not a
// per-loan error.
// ==========================================

use std::collections::HashMap;

// Purchase price (lender quote vs grid-modeled price)
pub const REJECTION_PURCHASE_PRICE_MISMATCH: &str = "notebook.purchase_price_mismatch";

// Underwriting grid checks
pub const REJECTION_UNDERWRITING_SFY: &str = "notebook.underwriting_sfy";
pub const REJECTION_UNDERWRITING_PRIME: &str = "notebook.underwriting_prime";
pub const REJECTION_UNDERWRITING_NOTES: &str = "notebook.underwriting_notes";

// CoMAP grid / FICO band checks
pub const REJECTION_COMAP_SFY: &str = "notebook.comap_sfy";
pub const REJECTION_COMAP_PRIME: &str = "notebook.comap_prime";
pub const REJECTION_COMAP_NOTES: &str = "notebook.comap_notes";

// Portfolio eligibility (loan-level only when flagged)
pub const REJECTION_ELIGIBILITY_SFY: &str = "notebook.eligibility_sfy";
pub const REJECTION_ELIGIBILITY_PRIME: &str = "notebook.eligibility_prime";

// ==========================================
// RejectionCriteriaMap
// ==========================================
/// Immutable lookup from (exception_type, exception_category) to the
/// canonical rejection key. Read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct RejectionCriteriaMap {
    entries: HashMap<(String, String), &'static str>,
}

impl RejectionCriteriaMap {
    /// The standard mapping shipped with the engine.
    pub fn standard() -> Self {
        let mut entries = HashMap::new();
        let mut add = |t: &str, c: &str, key: &'static str| {
            entries.insert((t.to_string(), c.to_string()), key);
        };

        add("purchase_price", "mismatch", REJECTION_PURCHASE_PRICE_MISMATCH);

        add("underwriting", "flagged", REJECTION_UNDERWRITING_PRIME);
        add("underwriting_sfy", "flagged", REJECTION_UNDERWRITING_SFY);
        add("underwriting_prime", "flagged", REJECTION_UNDERWRITING_PRIME);
        add("underwriting_notes", "flagged", REJECTION_UNDERWRITING_NOTES);

        add("comap", "not_in_comap", REJECTION_COMAP_PRIME);
        add("comap_sfy", "not_in_comap", REJECTION_COMAP_SFY);
        add("comap_prime", "not_in_comap", REJECTION_COMAP_PRIME);
        add("comap_notes", "not_in_comap", REJECTION_COMAP_NOTES);

        add("eligibility", "failed", REJECTION_ELIGIBILITY_PRIME);
        add("eligibility_sfy", "failed", REJECTION_ELIGIBILITY_SFY);
        add("eligibility_prime", "failed", REJECTION_ELIGIBILITY_PRIME);

        Self { entries }
    }

    /// Empty mapping, for tests exercising the unmapped-pair path.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Resolve the canonical key; falls back to an empty-category entry
    /// when the exact pair is absent.
    pub fn resolve(&self, exception_type: &str, exception_category: &str) -> Option<&'static str> {
        self.entries
            .get(&(exception_type.to_string(), exception_category.to_string()))
            .or_else(|| {
                self.entries
                    .get(&(exception_type.to_string(), String::new()))
            })
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
