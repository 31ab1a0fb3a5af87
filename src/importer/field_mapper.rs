// ==========================================
// Loan Engine - tape field mapper
// ==========================================
// Source column -> canonical field mapping, with type coercion.
// SFY and Prime exhibits use different column headings for the same
// canonical field; coercion rules are fixed per tape type.
// ==========================================

use crate::domain::loan::RawLoanRecord;
use crate::domain::types::TapeType;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RowMap;
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub struct FieldMapper;

impl FieldMapper {
    /// Map one parsed tape row into a raw loan record.
    ///
    /// Coercion failures are row-level errors; the caller decides
    /// whether they abort the batch or are recovered per row.
    pub fn map_row(row: &RowMap, tape: TapeType, row_number: usize) -> ImportResult<RawLoanRecord> {
        Ok(RawLoanRecord {
            account_number: Self::get_string(row, tape, "Account Number"),
            seller_loan_number: Self::get_string(row, tape, "SELLER Loan #"),

            loan_group: Self::get_string(row, tape, "Loan Group"),
            loan_program: Self::get_string(row, tape, "Loan Program"),
            application_type: Self::get_string(row, tape, "Application Type"),

            orig_balance: Self::parse_decimal(row, tape, "Orig. Balance", row_number)?,
            interest_rate: Self::parse_decimal(row, tape, "APR", row_number)?,
            purchase_price: Self::parse_decimal(row, tape, "Purchase Price", row_number)?,
            lender_price_pct: Self::parse_decimal(row, tape, "Lender Price(%)", row_number)?,

            fico: Self::parse_i32(row, tape, "FICO Borrower", row_number)?,
            annual_income: Self::parse_decimal(row, tape, "Income", row_number)?,
            dti: Self::parse_decimal(row, tape, "DTI", row_number)?,
            pti: Self::parse_decimal(row, tape, "PTI", row_number)?,
            term_months: Self::parse_i32(row, tape, "Term", row_number)?,

            open_date: Self::parse_date(row, tape, "Open Date", row_number)?,
            submit_date: Self::parse_date(row, tape, "Submit Date", row_number)?,
            status_codes: Self::get_string(row, tape, "Status Codes"),
            property_state: Self::get_string(row, tape, "Property State"),

            tape,
            row_number,
        })
    }

    /// Column aliases per canonical field, ordered by priority for the
    /// given tape type.
    fn aliases(tape: TapeType, key: &str) -> Vec<&'static str> {
        match (tape, key) {
            // SFY exhibits heading variants
            (TapeType::Sfy, "Account Number") => vec!["Account #", "Account Number"],
            (TapeType::Sfy, "APR") => vec!["Note Rate", "APR", "Interest Rate"],
            (TapeType::Sfy, "Income") => vec!["Annual Income", "Income"],
            // Prime exhibits heading variants
            (TapeType::Prime, "Account Number") => vec!["Account Number", "Account #"],
            (TapeType::Prime, "APR") => vec!["APR", "Interest Rate"],
            (TapeType::Prime, "Income") => vec!["Income", "Annual Income"],
            // Shared variants
            (_, "SELLER Loan #") => vec!["SELLER Loan #", "Seller Loan Number"],
            (_, "Loan Program") => vec!["Loan Program", "loan program"],
            (_, "Orig. Balance") => vec!["Orig. Balance", "Original Balance", "UPB"],
            (_, "Purchase Price") => vec!["Purchase Price", "Purchase Price ($)"],
            (_, "Lender Price(%)") => vec!["Lender Price(%)", "Lender Price (%)"],
            (_, "FICO Borrower") => vec!["FICO Borrower", "FICO"],
            (_, "Property State") => vec!["Property State", "State"],
            (_, k) => vec![match k {
                "Account Number" => "Account Number",
                "Loan Group" => "Loan Group",
                "Application Type" => "Application Type",
                "DTI" => "DTI",
                "PTI" => "PTI",
                "Term" => "Term",
                "Open Date" => "Open Date",
                "Submit Date" => "Submit Date",
                "Status Codes" => "Status Codes",
                _ => "",
            }],
        }
    }

    fn get_string(row: &RowMap, tape: TapeType, key: &str) -> Option<String> {
        for alias in Self::aliases(tape, key) {
            if alias.is_empty() {
                continue;
            }
            if let Some(v) = row.get(alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    fn parse_decimal(
        row: &RowMap,
        tape: TapeType,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<Decimal>> {
        match Self::get_string(row, tape, key) {
            None => Ok(None),
            Some(value) => {
                // Tapes quote money as "$25,000.00" and rates as "7.99%"
                let cleaned: String = value
                    .chars()
                    .filter(|c| !matches!(c, '$' | ',' | '%' | ' '))
                    .collect();
                cleaned
                    .parse::<Decimal>()
                    .map(Some)
                    .map_err(|_| ImportError::TypeConversionError {
                        row: row_number,
                        field: key.to_string(),
                        message: format!("cannot parse as decimal: {}", value),
                    })
            }
        }
    }

    fn parse_i32(
        row: &RowMap,
        tape: TapeType,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<i32>> {
        match Self::get_string(row, tape, key) {
            None => Ok(None),
            Some(value) => {
                // Excel renders integers as "720.0"
                let cleaned = value.trim_end_matches(".0");
                cleaned
                    .parse::<i32>()
                    .map(Some)
                    .map_err(|_| ImportError::TypeConversionError {
                        row: row_number,
                        field: key.to_string(),
                        message: format!("cannot parse as integer: {}", value),
                    })
            }
        }
    }

    fn parse_date(
        row: &RowMap,
        tape: TapeType,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDate>> {
        match Self::get_string(row, tape, key) {
            None => Ok(None),
            Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(&value, "%m/%d/%Y"))
                .or_else(|_| NaiveDate::parse_from_str(&value, "%m-%d-%Y"))
                .map(Some)
                .map_err(|_| ImportError::DateFormatError {
                    row: row_number,
                    field: key.to_string(),
                    value,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(pairs: &[(&str, &str)]) -> RowMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_prime_row_basic() {
        let r = row(&[
            ("Account Number", "1001"),
            ("Loan Group", "PR2"),
            ("Loan Program", "home-12"),
            ("Orig. Balance", "$25,000.00"),
            ("APR", "7.99%"),
            ("Purchase Price", "24500.00"),
            ("FICO Borrower", "720"),
        ]);

        let rec = FieldMapper::map_row(&r, TapeType::Prime, 1).unwrap();
        assert_eq!(rec.account_number, Some("1001".to_string()));
        assert_eq!(rec.orig_balance, Some(dec!(25000.00)));
        assert_eq!(rec.interest_rate, Some(dec!(7.99)));
        assert_eq!(rec.fico, Some(720));
    }

    #[test]
    fn test_map_sfy_row_aliases() {
        // SFY exhibits write "Account #" and "Note Rate"
        let r = row(&[
            ("Account #", "2001"),
            ("Note Rate", "6.50"),
            ("Orig. Balance", "18000"),
            ("FICO", "695.0"),
        ]);

        let rec = FieldMapper::map_row(&r, TapeType::Sfy, 3).unwrap();
        assert_eq!(rec.account_number, Some("2001".to_string()));
        assert_eq!(rec.interest_rate, Some(dec!(6.50)));
        assert_eq!(rec.fico, Some(695));
    }

    #[test]
    fn test_map_row_empty_as_none() {
        let r = row(&[("Account Number", "1001"), ("Loan Group", "   ")]);
        let rec = FieldMapper::map_row(&r, TapeType::Prime, 1).unwrap();
        assert_eq!(rec.loan_group, None);
    }

    #[test]
    fn test_map_row_bad_decimal_is_error() {
        let r = row(&[("Account Number", "1001"), ("Orig. Balance", "abc")]);
        let result = FieldMapper::map_row(&r, TapeType::Prime, 7);
        assert!(matches!(
            result,
            Err(ImportError::TypeConversionError { row: 7, .. })
        ));
    }

    #[test]
    fn test_map_row_date_formats() {
        let r = row(&[
            ("Account Number", "1001"),
            ("Open Date", "2024-05-02"),
            ("Submit Date", "05/20/2024"),
        ]);
        let rec = FieldMapper::map_row(&r, TapeType::Prime, 1).unwrap();
        assert_eq!(
            rec.open_date,
            Some(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
        );
        assert_eq!(
            rec.submit_date,
            Some(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap())
        );
    }
}
