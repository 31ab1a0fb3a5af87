// ==========================================
// Loan Engine - reference data loading
// ==========================================
// Loan-types master, pricing grid, underwriting grids, CoMAP grids
// and the existing-assets snapshot. Loaded once per run and shared
// read-only across all rule evaluations. A missing or malformed
// reference file fails the run before any loan is classified.
// ==========================================

use crate::domain::types::TapeType;
use crate::importer::discovery::ReferenceFiles;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RowMap, UniversalFileParser};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

// ==========================================
// Pricing grid
// ==========================================
// Reference purchase price = UPB * price_pct for the row matching
// the loan's program and rate band.
#[derive(Debug, Clone)]
pub struct PricingRow {
    pub loan_program: String,
    pub min_rate: Decimal,
    pub max_rate: Decimal,
    /// Fraction of UPB (e.g. 0.98).
    pub price_pct: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct PricingGrid {
    rows: Vec<PricingRow>,
}

impl PricingGrid {
    pub fn new(rows: Vec<PricingRow>) -> Self {
        Self { rows }
    }

    /// Price percentage for a program at a rate; `None` when no band
    /// covers the loan.
    pub fn price_pct_for(&self, loan_program: &str, rate: Decimal) -> Option<Decimal> {
        self.rows
            .iter()
            .find(|r| r.loan_program == loan_program && r.min_rate <= rate && rate <= r.max_rate)
            .map(|r| r.price_pct)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// Underwriting grid
// ==========================================
// Column names follow the source workbook (finance_type_name_nls,
// approval_high, dti_max, pti_ratio).
#[derive(Debug, Clone)]
pub struct UnderwritingRow {
    pub loan_program: String,
    pub monthly_income_min: Decimal,
    pub fico_min: i32,
    pub approval_high: Decimal,
    pub dti_max: Decimal,
    pub pti_max: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct UnderwritingGrid {
    rows: Vec<UnderwritingRow>,
}

impl UnderwritingGrid {
    pub fn new(rows: Vec<UnderwritingRow>) -> Self {
        Self { rows }
    }

    /// Rows for a program, ordered by approval ceiling ascending.
    pub fn rows_for(&self, loan_program: &str) -> Vec<&UnderwritingRow> {
        let mut rows: Vec<&UnderwritingRow> = self
            .rows
            .iter()
            .filter(|r| r.loan_program == loan_program)
            .collect();
        rows.sort_by(|a, b| a.approval_high.cmp(&b.approval_high));
        rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// CoMAP grid
// ==========================================
// One row per (program, FICO band floor); a loan is admitted when its
// program appears in some band whose floor its FICO meets.
#[derive(Debug, Clone)]
pub struct ComapBand {
    pub loan_program: String,
    pub min_fico: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ComapGrid {
    rows: Vec<ComapBand>,
}

impl ComapGrid {
    pub fn new(rows: Vec<ComapBand>) -> Self {
        Self { rows }
    }

    pub fn contains_program(&self, loan_program: &str) -> bool {
        self.rows.iter().any(|r| r.loan_program == loan_program)
    }

    pub fn admits(&self, loan_program: &str, fico: i32) -> bool {
        self.rows
            .iter()
            .any(|r| r.loan_program == loan_program && fico >= r.min_fico)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// Existing assets snapshot
// ==========================================
// Read-only repurchase lookup: seller loan number -> purchase date.
#[derive(Debug, Clone, Default)]
pub struct ExistingAssets {
    assets: HashMap<String, NaiveDate>,
}

impl ExistingAssets {
    pub fn new(assets: HashMap<String, NaiveDate>) -> Self {
        Self { assets }
    }

    /// Monotonic, idempotent lookup: present with a purchase date on
    /// or before `as_of`.
    pub fn contains_as_of(&self, seller_loan_number: &str, as_of: NaiveDate) -> bool {
        self.assets
            .get(seller_loan_number)
            .map(|purchased| *purchased <= as_of)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

// ==========================================
// ReferenceData - run-scoped immutable snapshot
// ==========================================
#[derive(Debug, Clone)]
pub struct ReferenceData {
    /// (loan program, platform) -> loan type (standard, hybrid, ...).
    pub loan_types: HashMap<(String, TapeType), String>,
    pub pricing: PricingGrid,
    pub underwriting_sfy: UnderwritingGrid,
    pub underwriting_prime: UnderwritingGrid,
    pub underwriting_notes: UnderwritingGrid,
    pub comap_sfy: ComapGrid,
    pub comap_prime: ComapGrid,
    pub comap_notes: ComapGrid,
    pub existing_assets: ExistingAssets,
}

impl ReferenceData {
    pub fn load(files: &ReferenceFiles) -> ImportResult<Self> {
        let data = Self {
            loan_types: load_loan_types(&files.loan_types_master)?,
            pricing: load_pricing_grid(&files.pricing_grid)?,
            underwriting_sfy: load_underwriting_grid(&files.underwriting_sfy)?,
            underwriting_prime: load_underwriting_grid(&files.underwriting_prime)?,
            underwriting_notes: load_underwriting_grid(&files.underwriting_notes)?,
            comap_sfy: load_comap_grid(&files.comap_sfy)?,
            comap_prime: load_comap_grid(&files.comap_prime)?,
            comap_notes: load_comap_grid(&files.comap_notes)?,
            existing_assets: load_existing_assets(&files.existing_assets)?,
        };

        info!(
            loan_types = data.loan_types.len(),
            pricing_rows = data.pricing.len(),
            existing_assets = data.existing_assets.len(),
            "reference data loaded"
        );
        Ok(data)
    }

    pub fn underwriting_for(&self, platform: TapeType, is_note: bool) -> &UnderwritingGrid {
        if is_note {
            &self.underwriting_notes
        } else {
            match platform {
                TapeType::Sfy => &self.underwriting_sfy,
                TapeType::Prime => &self.underwriting_prime,
            }
        }
    }

    pub fn comap_for(&self, platform: TapeType, is_note: bool) -> &ComapGrid {
        if is_note {
            &self.comap_notes
        } else {
            match platform {
                TapeType::Sfy => &self.comap_sfy,
                TapeType::Prime => &self.comap_prime,
            }
        }
    }
}

// ==========================================
// File loaders
// ==========================================

fn cell<'a>(row: &'a RowMap, file: &Path, column: &str) -> ImportResult<&'a str> {
    match row.get(column) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(reference_error(
            file,
            format!("missing value for column '{}'", column),
        )),
    }
}

fn cell_decimal(row: &RowMap, file: &Path, column: &str) -> ImportResult<Decimal> {
    let raw = cell(row, file, column)?;
    raw.parse::<Decimal>()
        .map_err(|_| reference_error(file, format!("column '{}': bad decimal '{}'", column, raw)))
}

fn cell_i32(row: &RowMap, file: &Path, column: &str) -> ImportResult<i32> {
    let raw = cell(row, file, column)?;
    raw.trim_end_matches(".0")
        .parse::<i32>()
        .map_err(|_| reference_error(file, format!("column '{}': bad integer '{}'", column, raw)))
}

fn reference_error(file: &Path, message: String) -> ImportError {
    ImportError::ReferenceDataError {
        file: file.display().to_string(),
        message,
    }
}

fn load_loan_types(path: &Path) -> ImportResult<HashMap<(String, TapeType), String>> {
    let rows = UniversalFileParser::parse(path)?;
    let mut map = HashMap::new();

    for row in &rows {
        let program = cell(row, path, "loan program")?.to_string();
        let platform_raw = cell(row, path, "platform")?;
        let platform = TapeType::from_str(platform_raw).ok_or_else(|| {
            reference_error(path, format!("unknown platform '{}'", platform_raw))
        })?;
        let loan_type = cell(row, path, "type")?.to_string();
        map.insert((program, platform), loan_type);
    }

    if map.is_empty() {
        return Err(reference_error(path, "loan-types master is empty".to_string()));
    }
    Ok(map)
}

fn load_pricing_grid(path: &Path) -> ImportResult<PricingGrid> {
    let rows = UniversalFileParser::parse(path)?;
    let mut grid_rows = Vec::with_capacity(rows.len());

    for row in &rows {
        grid_rows.push(PricingRow {
            loan_program: cell(row, path, "loan_program")?.to_string(),
            min_rate: cell_decimal(row, path, "min_rate")?,
            max_rate: cell_decimal(row, path, "max_rate")?,
            price_pct: cell_decimal(row, path, "price_pct")?,
        });
    }

    if grid_rows.is_empty() {
        return Err(reference_error(path, "pricing grid is empty".to_string()));
    }
    Ok(PricingGrid::new(grid_rows))
}

fn load_underwriting_grid(path: &Path) -> ImportResult<UnderwritingGrid> {
    let rows = UniversalFileParser::parse(path)?;
    let mut grid_rows = Vec::with_capacity(rows.len());

    for row in &rows {
        grid_rows.push(UnderwritingRow {
            loan_program: cell(row, path, "finance_type_name_nls")?.to_string(),
            monthly_income_min: cell_decimal(row, path, "monthly_income_min")?,
            fico_min: cell_i32(row, path, "fico_min")?,
            approval_high: cell_decimal(row, path, "approval_high")?,
            dti_max: cell_decimal(row, path, "dti_max")?,
            // pti_ratio is absent from older grids; treat as unbounded
            pti_max: row
                .get("pti_ratio")
                .filter(|v| !v.trim().is_empty())
                .map(|v| {
                    v.trim().parse::<Decimal>().map_err(|_| {
                        reference_error(path, format!("column 'pti_ratio': bad decimal '{}'", v))
                    })
                })
                .transpose()?
                .unwrap_or(Decimal::MAX),
        });
    }

    Ok(UnderwritingGrid::new(grid_rows))
}

fn load_comap_grid(path: &Path) -> ImportResult<ComapGrid> {
    let rows = UniversalFileParser::parse(path)?;
    let mut grid_rows = Vec::with_capacity(rows.len());

    for row in &rows {
        grid_rows.push(ComapBand {
            loan_program: cell(row, path, "loan_program")?.to_string(),
            min_fico: cell_i32(row, path, "min_fico")?,
        });
    }

    Ok(ComapGrid::new(grid_rows))
}

fn load_existing_assets(path: &Path) -> ImportResult<ExistingAssets> {
    let rows = UniversalFileParser::parse(path)?;
    let mut assets = HashMap::new();

    for row in &rows {
        let seller = cell(row, path, "SELLER Loan #")?.to_string();
        let date_raw = cell(row, path, "Purchase_Date")?;
        let purchased = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(date_raw, "%m/%d/%Y"))
            .map_err(|_| {
                reference_error(path, format!("bad Purchase_Date '{}'", date_raw))
            })?;
        assets.insert(seller, purchased);
    }

    Ok(ExistingAssets::new(assets))
}
