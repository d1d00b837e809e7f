//! Receipt-book database: the one SQLite file behind the record store.
//!
//! # Responsibility
//! - Open `kwitariusz.db` (or an in-memory copy) with the pragmas the
//!   parent/child/payment references rely on.
//! - Bring the five record tables up to the schema this build understands.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`; a file written by a
//!   newer build is refused rather than downgraded.
//! - No connection leaves this module without `foreign_keys=ON`, so
//!   `children.parentId`, `payments.*Id` and `attendance.childId` are enforced.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure. Surfaces to callers as "store unavailable".
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
