// ==========================================
// Loan Engine - tape/grid file parser
// ==========================================
// Supports Excel (.xlsx/.xls) and CSV (.csv). Exhibit tapes carry
// decorative banner rows above the header, so parsers accept a
// skip-rows offset before the header line.
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// One parsed data row, keyed by trimmed header name.
pub type RowMap = HashMap<String, String>;

// ==========================================
// CSV parser
// ==========================================
pub struct CsvParser {
    skip_rows: usize,
}

impl CsvParser {
    pub fn new() -> Self {
        Self { skip_rows: 0 }
    }

    /// Skip `n` banner rows before the header line.
    pub fn with_skip_rows(n: usize) -> Self {
        Self { skip_rows: n }
    }

    pub fn parse(&self, file_path: &Path) -> ImportResult<Vec<RowMap>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut rows = reader.records();
        for _ in 0..self.skip_rows {
            if rows.next().is_none() {
                return Ok(Vec::new());
            }
        }

        let header_record = match rows.next() {
            Some(r) => r?,
            None => return Ok(Vec::new()),
        };
        let headers: Vec<String> = header_record.iter().map(|h| h.trim().to_string()).collect();

        let mut records = Vec::new();
        for result in rows {
            let record = result?;
            let mut row_map = RowMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            // Skip fully blank rows
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// Excel parser (first worksheet)
// ==========================================
pub struct ExcelParser {
    skip_rows: usize,
}

impl ExcelParser {
    pub fn new() -> Self {
        Self { skip_rows: 0 }
    }

    pub fn with_skip_rows(n: usize) -> Self {
        Self { skip_rows: n }
    }

    pub fn parse(&self, file_path: &Path) -> ImportResult<Vec<RowMap>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let mut workbook: Xlsx<_> = open_workbook(file_path)
            .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError(
                "workbook has no worksheets".to_string(),
            ));
        }

        let sheet_name = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut rows = range.rows().skip(self.skip_rows);
        let header_row = match rows.next() {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut records = Vec::new();
        for data_row in rows {
            let mut row_map = RowMap::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), cell.to_string().trim().to_string());
                }
            }

            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

impl Default for ExcelParser {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// Universal parser (dispatch by extension)
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(file_path: P) -> ImportResult<Vec<RowMap>> {
        Self::parse_with_skip(file_path, 0)
    }

    pub fn parse_with_skip<P: AsRef<Path>>(file_path: P, skip_rows: usize) -> ImportResult<Vec<RowMap>> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser::with_skip_rows(skip_rows).parse(path),
            "xlsx" | "xls" => ExcelParser::with_skip_rows(skip_rows).parse(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_csv(lines: &[&str]) -> NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        f
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let f = temp_csv(&[
            "Account Number,Orig. Balance,Loan Program",
            "1001,25000.00,solar-20",
            "1002,31000.50,solar-25",
        ]);

        let records = CsvParser::new().parse(f.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Account Number"), Some(&"1001".to_string()));
        assert_eq!(
            records[0].get("Orig. Balance"),
            Some(&"25000.00".to_string())
        );
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser::new().parse(Path::new("no_such_tape.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let f = temp_csv(&[
            "Account Number,Orig. Balance",
            "1001,25000.00",
            ",",
            "1002,31000.50",
        ]);

        let records = CsvParser::new().parse(f.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_csv_parser_exhibit_header_offset() {
        // Exhibit tapes carry 4 banner rows before the real header.
        let f = temp_csv(&[
            "Exhibit A to Form of Sale Notice,,",
            "Pre-Funding,,",
            ",,",
            ",,",
            "Account Number,Orig. Balance,Loan Program",
            "2001,18000.00,home-12",
        ]);

        let records = CsvParser::with_skip_rows(4).parse(f.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Account Number"), Some(&"2001".to_string()));
    }

    #[test]
    fn test_universal_parser_unsupported_extension() {
        let result = UniversalFileParser::parse(Path::new("tape.parquet"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
