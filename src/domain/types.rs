// ==========================================
// Loan Engine - domain type definitions
// ==========================================
// Serialization format: snake_case / SCREAMING_SNAKE_CASE
// matches the database columns
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Tape type (source batch category)
// ==========================================
// SFY and Prime tapes have different column layouts
// feeding the same canonical loan schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TapeType {
    Sfy,
    Prime,
}

impl fmt::Display for TapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapeType::Sfy => write!(f, "SFY"),
            TapeType::Prime => write!(f, "PRIME"),
        }
    }
}

impl TapeType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SFY" => Some(TapeType::Sfy),
            "PRIME" => Some(TapeType::Prime),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TapeType::Sfy => "SFY",
            TapeType::Prime => "PRIME",
        }
    }
}

// ==========================================
// Disposition (per-loan run outcome)
// ==========================================
// Projected currently has no producer; it stays a first-class
// variant so downstream queries never special-case its absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    ToPurchase,
    Projected,
    Rejected,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Disposition {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "to_purchase" => Some(Disposition::ToPurchase),
            "projected" => Some(Disposition::Projected),
            "rejected" => Some(Disposition::Rejected),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Disposition::ToPurchase => "to_purchase",
            Disposition::Projected => "projected",
            Disposition::Rejected => "rejected",
        }
    }
}

// ==========================================
// Run status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RunStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "running" => RunStatus::Running,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            _ => RunStatus::Pending,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states are never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

// ==========================================
// Exception severity
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionSeverity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ExceptionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ExceptionSeverity {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => ExceptionSeverity::Error,
            "info" => ExceptionSeverity::Info,
            _ => ExceptionSeverity::Warning,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ExceptionSeverity::Error => "error",
            ExceptionSeverity::Warning => "warning",
            ExceptionSeverity::Info => "info",
        }
    }
}
