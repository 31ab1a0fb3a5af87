// ==========================================
// Loan Engine - portfolio eligibility analyzer
// ==========================================
// Concentration checks over the full enriched population, per
// platform, by balance share. Every loan on the tapes counts toward
// its platform's denominator regardless of disposition. Report-only:
// a breached bucket fails its check in the run's eligibility report
// but no disposition changes. The eligibility rejection keys stay
// mapped for loan-level flagging by future tooling.
// ==========================================

use crate::domain::loan::EnrichedLoan;
use crate::domain::types::TapeType;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{info, warn};

/// Term boundary (months) between short and long buckets.
const LONG_TERM_MONTHS: i32 = 144;

/// FICO boundary between low and high buckets.
const HIGH_FICO: i32 = 700;

// ==========================================
// Concentration buckets
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    StandardShortLowFico,
    StandardLongLowFico,
    StandardLongHighFico,
    Hybrid,
}

impl Bucket {
    const ALL: [Bucket; 4] = [
        Bucket::StandardShortLowFico,
        Bucket::StandardLongLowFico,
        Bucket::StandardLongHighFico,
        Bucket::Hybrid,
    ];

    fn name(self) -> &'static str {
        match self {
            Bucket::StandardShortLowFico => "standard_short_low_fico",
            Bucket::StandardLongLowFico => "standard_long_low_fico",
            Bucket::StandardLongHighFico => "standard_long_high_fico",
            Bucket::Hybrid => "hybrid",
        }
    }

    /// A bucket must stay strictly below this share of its
    /// platform's balance.
    fn limit_pct(self) -> Decimal {
        match self {
            Bucket::StandardShortLowFico => dec!(5),
            Bucket::StandardLongLowFico => dec!(3),
            Bucket::StandardLongHighFico => dec!(35),
            Bucket::Hybrid => dec!(35),
        }
    }

    fn matches(self, loan: &EnrichedLoan) -> bool {
        let loan_type = loan.loan_type.as_deref().unwrap_or("");
        let term = loan.loan.term_months.unwrap_or(0);
        let fico = loan.loan.fico.unwrap_or(0);

        match self {
            Bucket::StandardShortLowFico => {
                loan_type == "standard" && term <= LONG_TERM_MONTHS && fico < HIGH_FICO
            }
            Bucket::StandardLongLowFico => {
                loan_type == "standard" && term > LONG_TERM_MONTHS && fico < HIGH_FICO
            }
            Bucket::StandardLongHighFico => {
                loan_type == "standard" && term > LONG_TERM_MONTHS && fico >= HIGH_FICO
            }
            Bucket::Hybrid => loan_type == "hybrid",
        }
    }
}

// ==========================================
// Report shapes
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct BucketCheck {
    pub platform: TapeType,
    pub bucket: &'static str,
    pub limit_pct: Decimal,
    pub share_pct: Decimal,
    pub balance: Decimal,
    pub loan_count: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub checks: Vec<BucketCheck>,
    pub all_passed: bool,
}

impl EligibilityReport {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// ==========================================
// Analyzer
// ==========================================

pub struct EligibilityAnalyzer;

impl EligibilityAnalyzer {
    /// Analyze the full enriched set per platform.
    pub fn analyze(loans: &[EnrichedLoan]) -> EligibilityReport {
        let mut checks = Vec::new();

        for platform in [TapeType::Sfy, TapeType::Prime] {
            let platform_loans: Vec<&EnrichedLoan> =
                loans.iter().filter(|l| l.platform == platform).collect();
            let platform_total: Decimal = platform_loans.iter().map(|l| l.loan.upb).sum();

            for bucket in Bucket::ALL {
                let members: Vec<&&EnrichedLoan> = platform_loans
                    .iter()
                    .filter(|l| bucket.matches(l))
                    .collect();

                let balance: Decimal = members.iter().map(|l| l.loan.upb).sum();
                let share_pct = if platform_total > Decimal::ZERO {
                    balance / platform_total * dec!(100)
                } else {
                    Decimal::ZERO
                };
                let passed = share_pct < bucket.limit_pct();

                if !passed {
                    warn!(
                        platform = %platform,
                        bucket = bucket.name(),
                        share = %share_pct,
                        limit = %bucket.limit_pct(),
                        "eligibility concentration breached"
                    );
                }

                checks.push(BucketCheck {
                    platform,
                    bucket: bucket.name(),
                    limit_pct: bucket.limit_pct(),
                    share_pct,
                    balance,
                    loan_count: members.len(),
                    passed,
                });
            }
        }

        let all_passed = checks.iter().all(|c| c.passed);
        info!(
            checks = checks.len(),
            all_passed, "eligibility analysis complete"
        );
        EligibilityReport { checks, all_passed }
    }
}
