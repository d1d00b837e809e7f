//! Domain records for the childcare receipt book.
//!
//! # Responsibility
//! - Define the five persisted record kinds and their insert inputs.
//! - Own field-level validation shared by repository write paths.
//!
//! # Invariants
//! - Every persisted record is identified by an auto-assigned `RecordId`.
//! - Insert inputs are normalized (trimmed text, canonical ISO dates) by
//!   `validated()` before they reach SQL.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attendance;
pub mod child;
pub mod parent;
pub mod payment;
pub mod rate;
pub mod snapshot;

/// SQLite rowid of any record table.
pub type RecordId = i64;

/// Canonical on-disk date format (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Field-level validation failure for insert inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is empty or blank.
    MissingField(&'static str),
    /// Date field is not a `YYYY-MM-DD` calendar date.
    InvalidDate { field: &'static str, value: String },
    /// Numeric field is NaN or infinite.
    InvalidAmount { field: &'static str, value: f64 },
    /// Month filter is not `YYYY-MM`.
    InvalidMonth(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "field `{field}` is required"),
            Self::InvalidDate { field, value } => {
                write!(f, "field `{field}` must be a YYYY-MM-DD date, got `{value}`")
            }
            Self::InvalidAmount { field, value } => {
                write!(f, "field `{field}` must be a finite number, got `{value}`")
            }
            Self::InvalidMonth(value) => write!(f, "month must be YYYY-MM, got `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub(crate) fn require_date(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .map_err(|_| ValidationError::InvalidDate {
            field,
            value: trimmed.to_string(),
        })
}

pub(crate) fn require_amount(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidAmount { field, value });
    }
    Ok(value)
}
