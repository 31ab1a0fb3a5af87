// ==========================================
// Loan Engine - input file discovery
// ==========================================
// Input tapes and reference files are dropped into
// `<input_dir>/files_required/` and resolved by filename pattern for
// each purchase date. Multiple matches prefer the most recent file.
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Subdirectory holding tapes and reference files for a run.
pub const FILES_REQUIRED_DIR: &str = "files_required";

// ==========================================
// Discovered file sets
// ==========================================

#[derive(Debug, Clone)]
pub struct InputFiles {
    /// Servicing loans tape (`Tape20Loans_MM-DD-YYYY.csv`).
    pub loans_tape: PathBuf,
    /// SFY exhibit tape.
    pub sfy_tape: PathBuf,
    /// Prime exhibit tape.
    pub prime_tape: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ReferenceFiles {
    pub loan_types_master: PathBuf,
    pub pricing_grid: PathBuf,
    pub underwriting_sfy: PathBuf,
    pub underwriting_prime: PathBuf,
    pub underwriting_notes: PathBuf,
    pub comap_sfy: PathBuf,
    pub comap_prime: PathBuf,
    pub comap_notes: PathBuf,
    pub existing_assets: PathBuf,
}

// ==========================================
// Pattern matching
// ==========================================

/// Find a file matching a glob-ish pattern (`*` wildcard) in the
/// given directory. Returns the most recently modified match.
pub fn find_file_by_pattern(
    directory: &Path,
    pattern: &str,
    required: bool,
) -> ImportResult<Option<PathBuf>> {
    if !directory.exists() {
        if required {
            return Err(ImportError::FileNotFound(directory.display().to_string()));
        }
        return Ok(None);
    }

    let regex_src = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    let re = Regex::new(&regex_src)
        .map_err(|e| ImportError::InternalError(format!("bad file pattern '{}': {}", pattern, e)))?;

    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if re.is_match(name) {
                matches.push(path);
            }
        }
    }

    if matches.is_empty() {
        if required {
            return Err(ImportError::NoMatchingFile {
                pattern: pattern.to_string(),
                directory: directory.display().to_string(),
            });
        }
        warn!(pattern = %pattern, directory = %directory.display(), "no file matched pattern");
        return Ok(None);
    }

    if matches.len() > 1 {
        matches.sort_by_key(|p| {
            std::fs::metadata(p)
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });
        matches.reverse();
        warn!(
            pattern = %pattern,
            chosen = %matches[0].display(),
            "multiple files matched pattern, using most recent"
        );
    }

    Ok(Some(matches.remove(0)))
}

fn require(directory: &Path, pattern: &str) -> ImportResult<PathBuf> {
    match find_file_by_pattern(directory, pattern, true)? {
        Some(path) => Ok(path),
        None => Err(ImportError::NoMatchingFile {
            pattern: pattern.to_string(),
            directory: directory.display().to_string(),
        }),
    }
}

// ==========================================
// Discovery entry points
// ==========================================

/// Discover the three input tapes for a purchase date. The loans tape
/// is dated the day before the purchase date (`MM-DD-YYYY`).
pub fn discover_input_files(input_dir: &Path, pdate: NaiveDate) -> ImportResult<InputFiles> {
    let dir = input_dir.join(FILES_REQUIRED_DIR);

    let loans_date = pdate
        .pred_opt()
        .ok_or_else(|| ImportError::InternalError(format!("no day before {}", pdate)))?;
    let loans_pattern = format!("Tape20Loans_{}.csv", loans_date.format("%m-%d-%Y"));

    let files = InputFiles {
        loans_tape: require(&dir, &loans_pattern)?,
        sfy_tape: require(&dir, "SFY_*Exhibit*")?,
        prime_tape: require(&dir, "PRIME_*Exhibit*")?,
    };

    info!(
        loans = %files.loans_tape.display(),
        sfy = %files.sfy_tape.display(),
        prime = %files.prime_tape.display(),
        "discovered input tapes"
    );
    Ok(files)
}

/// Discover the reference grid/master set. All files are required;
/// a missing grid fails the run before any loan is classified.
pub fn discover_reference_files(input_dir: &Path) -> ImportResult<ReferenceFiles> {
    let dir = input_dir.join(FILES_REQUIRED_DIR);

    Ok(ReferenceFiles {
        loan_types_master: require(&dir, "master_sheet.*")?,
        pricing_grid: require(&dir, "pricing_grid.*")?,
        underwriting_sfy: require(&dir, "underwriting_sfy.*")?,
        underwriting_prime: require(&dir, "underwriting_prime.*")?,
        underwriting_notes: require(&dir, "underwriting_notes.*")?,
        comap_sfy: require(&dir, "comap_sfy.*")?,
        comap_prime: require(&dir, "comap_prime.*")?,
        comap_notes: require(&dir, "comap_notes.*")?,
        existing_assets: require(&dir, "current_assets.csv")?,
    })
}
