// ==========================================
// Loan Engine - importer layer
// ==========================================
// File discovery, tape/grid parsing, field mapping and reference
// data loading. Everything above this layer works with typed domain
// records only.
// ==========================================

pub mod discovery;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod reference;

pub use discovery::{
    discover_input_files, discover_reference_files, find_file_by_pattern, InputFiles,
    ReferenceFiles, FILES_REQUIRED_DIR,
};
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, RowMap, UniversalFileParser};
pub use reference::{
    ComapBand, ComapGrid, ExistingAssets, PricingGrid, PricingRow, ReferenceData,
    UnderwritingGrid, UnderwritingRow,
};
