// ==========================================
// Loan Engine - pipeline settings
// ==========================================
// Environment-driven configuration behind a read-only trait so the
// executor and rules can be tested with substitute values.
// ==========================================

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::error::Error;
use std::path::PathBuf;

/// Default tolerance (in dollars) between the quoted purchase price
/// and the grid-computed reference price.
pub const DEFAULT_PRICE_TOLERANCE: Decimal = dec!(100.00);

/// Default IRR support target stamped on each run.
pub const DEFAULT_IRR_TARGET: Decimal = dec!(8.05);

// ==========================================
// PipelineConfigReader trait
// ==========================================
// Read-only configuration interface consumed by the executor.
#[async_trait]
pub trait PipelineConfigReader: Send + Sync {
    /// Directory holding `files_required/` with tapes and grids.
    async fn input_dir(&self) -> Result<PathBuf, Box<dyn Error>>;

    /// Allowed distance between quoted and reference purchase price.
    async fn price_tolerance(&self) -> Result<Decimal, Box<dyn Error>>;

    /// IRR support target recorded on the run.
    async fn irr_target(&self) -> Result<Decimal, Box<dyn Error>>;

    /// Purchase date override; `None` means next Tuesday.
    async fn default_pdate(&self) -> Result<Option<NaiveDate>, Box<dyn Error>>;
}

// ==========================================
// Settings - environment-backed implementation
// ==========================================
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding `files_required/` with tapes and grids.
    pub input_dir: PathBuf,
    /// SQLite database path.
    pub db_path: PathBuf,
    pub price_tolerance: Decimal,
    pub irr_target: Decimal,
    pub default_pdate: Option<NaiveDate>,
}

impl Settings {
    /// Load from environment variables, with defaults matching the
    /// shipped deployment:
    /// - LOAN_ENGINE_INPUT_DIR  (default ./data/inputs)
    /// - LOAN_ENGINE_DB_PATH    (default ./loan_engine.db)
    /// - LOAN_ENGINE_PRICE_TOLERANCE
    /// - LOAN_ENGINE_IRR_TARGET
    /// - LOAN_ENGINE_PDATE      (YYYY-MM-DD)
    pub fn from_env() -> Self {
        let input_dir = std::env::var("LOAN_ENGINE_INPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/inputs"));
        let db_path = std::env::var("LOAN_ENGINE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./loan_engine.db"));

        let price_tolerance = std::env::var("LOAN_ENGINE_PRICE_TOLERANCE")
            .ok()
            .and_then(|v| v.parse::<Decimal>().ok())
            .unwrap_or(DEFAULT_PRICE_TOLERANCE);
        let irr_target = std::env::var("LOAN_ENGINE_IRR_TARGET")
            .ok()
            .and_then(|v| v.parse::<Decimal>().ok())
            .unwrap_or(DEFAULT_IRR_TARGET);
        let default_pdate = std::env::var("LOAN_ENGINE_PDATE")
            .ok()
            .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok());

        Self {
            input_dir,
            db_path,
            price_tolerance,
            irr_target,
            default_pdate,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./data/inputs"),
            db_path: PathBuf::from("./loan_engine.db"),
            price_tolerance: DEFAULT_PRICE_TOLERANCE,
            irr_target: DEFAULT_IRR_TARGET,
            default_pdate: None,
        }
    }
}

#[async_trait]
impl PipelineConfigReader for Settings {
    async fn input_dir(&self) -> Result<PathBuf, Box<dyn Error>> {
        Ok(self.input_dir.clone())
    }

    async fn price_tolerance(&self) -> Result<Decimal, Box<dyn Error>> {
        Ok(self.price_tolerance)
    }

    async fn irr_target(&self) -> Result<Decimal, Box<dyn Error>> {
        Ok(self.irr_target)
    }

    async fn default_pdate(&self) -> Result<Option<NaiveDate>, Box<dyn Error>> {
        Ok(self.default_pdate)
    }
}
