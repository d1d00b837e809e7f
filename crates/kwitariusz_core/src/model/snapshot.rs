//! Full-store snapshot used by JSON backup and restore.

use super::attendance::AttendanceRecord;
use super::child::Child;
use super::parent::Parent;
use super::payment::Payment;
use super::rate::Rate;
use serde::{Deserialize, Serialize};

/// Snapshot layout version written into every backup file.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Every row of every record table.
///
/// Missing lists deserialize as empty so hand-trimmed backups still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// RFC 3339 export time; informational only.
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub parents: Vec<Parent>,
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub rates: Vec<Rate>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
}

fn default_format_version() -> u32 {
    SNAPSHOT_FORMAT_VERSION
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: None,
            parents: Vec::new(),
            children: Vec::new(),
            rates: Vec::new(),
            payments: Vec::new(),
            attendance: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Parses a snapshot from backup-file JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Total number of rows across all tables.
    pub fn record_count(&self) -> usize {
        self.parents.len()
            + self.children.len()
            + self.rates.len()
            + self.payments.len()
            + self.attendance.len()
    }

    /// Returns the snapshot with every table ordered by id.
    pub fn sorted_by_id(mut self) -> Self {
        self.parents.sort_by_key(|row| row.id);
        self.children.sort_by_key(|row| row.id);
        self.rates.sort_by_key(|row| row.id);
        self.payments.sort_by_key(|row| row.id);
        self.attendance.sort_by_key(|row| row.id);
        self
    }

    /// Compares table contents, ignoring row order and export metadata.
    pub fn same_rows(&self, other: &Self) -> bool {
        let left = self.clone().sorted_by_id();
        let right = other.clone().sorted_by_id();
        left.parents == right.parents
            && left.children == right.children
            && left.rates == right.rates
            && left.payments == right.payments
            && left.attendance == right.attendance
    }
}
