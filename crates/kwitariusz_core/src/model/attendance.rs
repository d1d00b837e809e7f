//! Daily attendance log.
//!
//! # Invariants
//! - At most one record exists per `(child_id, date)`; marking twice updates.
//! - Month filters are half-open date ranges `[first day, first day of next month)`.

use super::{require_date, RecordId, ValidationError, DATE_FORMAT};
use chrono::{Datelike, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Persisted attendance row. `present` is stored as INTEGER 0/1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub child_id: RecordId,
    pub date: String,
    #[serde(deserialize_with = "present_flag")]
    pub present: bool,
}

/// Upsert input for one attendance mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub child_id: RecordId,
    pub date: String,
    #[serde(deserialize_with = "present_flag")]
    pub present: bool,
}

impl AttendanceMark {
    pub fn new(child_id: RecordId, date: impl Into<String>, present: bool) -> Self {
        Self {
            child_id,
            date: date.into(),
            present,
        }
    }

    pub fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            child_id: self.child_id,
            date: require_date("date", &self.date)?,
            present: self.present,
        })
    }
}

impl AttendanceRecord {
    pub fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            id: self.id,
            child_id: self.child_id,
            date: require_date("date", &self.date)?,
            present: self.present,
        })
    }
}

/// Accepts `true`/`false` or the stored integers `0`/`1`.
fn present_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(D::Error::custom(format!(
            "invalid present value `{other}`; expected true, false, 0 or 1"
        ))),
    }
}

/// Calendar month used to filter attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceMonth {
    first_day: NaiveDate,
}

impl AttendanceMonth {
    /// Parses `YYYY-MM` (surrounding whitespace allowed).
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        let invalid = || ValidationError::InvalidMonth(trimmed.to_string());
        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self { first_day })
    }

    /// Inclusive lower bound as stored text.
    pub fn start(&self) -> String {
        self.first_day.format(DATE_FORMAT).to_string()
    }

    /// Exclusive upper bound as stored text.
    pub fn end(&self) -> String {
        let (year, month) = if self.first_day.month() == 12 {
            (self.first_day.year() + 1, 1)
        } else {
            (self.first_day.year(), self.first_day.month() + 1)
        };
        // Day 1 of a valid month always exists.
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|date| date.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| format!("{year:04}-{month:02}-01"))
    }
}
