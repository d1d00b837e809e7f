//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per record family.
//! - Isolate SQL details from service orchestration.
//! - Translate storage failures into the record-store error taxonomy.
//!
//! # Invariants
//! - Write paths validate inputs before any SQL mutation.
//! - Foreign keys are checked in the access layer before the schema
//!   constraint fires, so errors name the missing entity.
//! - Each mutating call runs in exactly one transaction.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::{RecordId, ValidationError};
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attendance_repo;
pub mod billing_repo;
pub mod family_repo;
pub mod snapshot_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record kinds known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Parent,
    Child,
    Rate,
    Payment,
    Attendance,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Rate => "rate",
            Self::Payment => "payment",
            Self::Attendance => "attendance",
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Parent => "parents",
            Self::Child => "children",
            Self::Rate => "rates",
            Self::Payment => "payments",
            Self::Attendance => "attendance",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Foreign-key failure in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// A referenced row does not exist.
    Missing { entity: EntityKind, id: RecordId },
    /// A row cannot be deleted while other rows reference it.
    InUse {
        entity: EntityKind,
        id: RecordId,
        dependent: EntityKind,
        count: u64,
    },
}

impl Display for ReferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { entity, id } => {
                write!(f, "referenced {entity} does not exist: {id}")
            }
            Self::InUse {
                entity,
                id,
                dependent,
                count,
            } => write!(
                f,
                "{entity} {id} is still referenced by {count} {dependent} record(s)"
            ),
        }
    }
}

impl Error for ReferenceError {}

/// Record-store error taxonomy.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Referential(ReferenceError),
    NotFound {
        entity: EntityKind,
        id: RecordId,
    },
    /// Store unavailable: file, connection or SQL failure.
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl RepoError {
    /// Stable machine-readable category for boundary envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Referential(_) => "referential",
            Self::NotFound { .. } => "not_found",
            Self::InvalidData(_) => "invalid_data",
            Self::Db(_) | Self::UninitializedConnection { .. } | Self::MissingRequiredTable(_) => {
                "store_unavailable"
            }
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Referential(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Db(err) => write!(f, "store unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table is missing: {table}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Referential(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ReferenceError> for RepoError {
    fn from(value: ReferenceError) -> Self {
        Self::Referential(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects connections that were not opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [*table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }

    Ok(())
}

pub(crate) fn record_exists(
    conn: &Connection,
    entity: EntityKind,
    id: RecordId,
) -> RepoResult<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
        entity.table()
    );
    let exists: i64 = conn.query_row(&sql, [id], |row| row.get(0))?;
    Ok(exists == 1)
}

/// Fails with `ReferenceError::Missing` when `id` does not resolve.
pub(crate) fn ensure_referenced(
    conn: &Connection,
    entity: EntityKind,
    id: RecordId,
) -> RepoResult<()> {
    if record_exists(conn, entity, id)? {
        return Ok(());
    }
    Err(ReferenceError::Missing { entity, id }.into())
}

/// Fails with `ReferenceError::InUse` when `dependent.column = id` rows exist.
pub(crate) fn ensure_unreferenced(
    conn: &Connection,
    entity: EntityKind,
    id: RecordId,
    dependent: EntityKind,
    column: &'static str,
) -> RepoResult<()> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {column} = ?1;",
        dependent.table()
    );
    let count: i64 = conn.query_row(&sql, [id], |row| row.get(0))?;
    if count == 0 {
        return Ok(());
    }
    Err(ReferenceError::InUse {
        entity,
        id,
        dependent,
        count: count.unsigned_abs(),
    }
    .into())
}

/// Deletes one row by id, reporting `NotFound` when nothing changed.
pub(crate) fn delete_by_id(conn: &Connection, entity: EntityKind, id: RecordId) -> RepoResult<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?1;", entity.table());
    let changed = conn.execute(&sql, [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}

/// Maps SQLite constraint violations to `InvalidData`, keeping other failures as `Db`.
pub(crate) fn map_constraint(entity: EntityKind, err: rusqlite::Error) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            RepoError::InvalidData(format!("{entity} rows violate a constraint: {err}"))
        }
        _ => RepoError::from(err),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
