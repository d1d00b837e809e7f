//! Record store handle: the one object every boundary call goes through.
//!
//! # Responsibility
//! - Own the SQLite connection for its whole lifetime (open -> use -> close).
//! - Expose the boundary operations as plain method calls returning rows.
//! - Emit one metadata-only log event per operation.
//!
//! # Invariants
//! - A `RecordStore` is only constructed over a fully migrated connection.
//! - Every operation is independent; no state is kept between calls besides
//!   the connection.

use crate::db::{open_db, open_db_in_memory};
use crate::model::attendance::{AttendanceMark, AttendanceMonth, AttendanceRecord};
use crate::model::child::{Child, NewChild};
use crate::model::parent::{NewParent, Parent};
use crate::model::payment::{NewPayment, Payment};
use crate::model::rate::{NewRate, Rate};
use crate::model::snapshot::Snapshot;
use crate::model::RecordId;
use crate::repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
use crate::repo::billing_repo::{BillingRepository, SqliteBillingRepository};
use crate::repo::family_repo::{FamilyRepository, SqliteFamilyRepository};
use crate::repo::snapshot_repo::{read_snapshot, replace_with_snapshot};
use crate::repo::{RepoError, RepoResult};
use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Explicitly constructed store handle over one SQLite database.
pub struct RecordStore {
    conn: Connection,
    location: Option<PathBuf>,
}

impl RecordStore {
    /// Opens (creating if needed) the database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let conn = open_db(path)?;
        Ok(Self {
            conn,
            location: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
            location: None,
        })
    }

    /// Database file path, or `None` for in-memory stores.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> RepoResult<()> {
        self.conn.close().map_err(|(_, err)| RepoError::from(err))?;
        info!("event=store_close module=service status=ok");
        Ok(())
    }

    pub fn list_parents(&self) -> RepoResult<Vec<Parent>> {
        traced("get_parents", || self.family()?.list_parents())
    }

    pub fn add_parent(&self, parent: &NewParent) -> RepoResult<Parent> {
        traced("add_parent", || self.family()?.insert_parent(parent))
    }

    pub fn delete_parent(&self, id: RecordId) -> RepoResult<()> {
        traced("delete_parent", || self.family()?.delete_parent(id))
    }

    pub fn list_children(&self) -> RepoResult<Vec<Child>> {
        traced("get_children", || self.family()?.list_children())
    }

    pub fn add_child(&self, child: &NewChild) -> RepoResult<Child> {
        traced("add_child", || self.family()?.insert_child(child))
    }

    pub fn delete_child(&self, id: RecordId) -> RepoResult<()> {
        traced("delete_child", || self.family()?.delete_child(id))
    }

    pub fn list_rates(&self) -> RepoResult<Vec<Rate>> {
        traced("get_rates", || self.billing()?.list_rates())
    }

    pub fn add_rate(&self, rate: &NewRate) -> RepoResult<Rate> {
        traced("add_rate", || self.billing()?.insert_rate(rate))
    }

    pub fn delete_rate(&self, id: RecordId) -> RepoResult<()> {
        traced("delete_rate", || self.billing()?.delete_rate(id))
    }

    pub fn list_payments(&self) -> RepoResult<Vec<Payment>> {
        traced("get_payments", || self.billing()?.list_payments())
    }

    pub fn add_payment(&self, payment: &NewPayment) -> RepoResult<Payment> {
        traced("add_payment", || self.billing()?.insert_payment(payment))
    }

    pub fn delete_payment(&self, id: RecordId) -> RepoResult<()> {
        traced("delete_payment", || self.billing()?.delete_payment(id))
    }

    /// Attendance rows of one calendar month (`YYYY-MM`), ordered by date.
    pub fn get_attendance(&self, month: &str) -> RepoResult<Vec<AttendanceRecord>> {
        traced("get_attendance", || {
            let month = AttendanceMonth::parse(month)?;
            self.attendance()?.list_attendance_for_month(&month)
        })
    }

    /// Upserts the presence mark for one child on one day.
    pub fn set_attendance(
        &self,
        child_id: RecordId,
        date: &str,
        present: bool,
    ) -> RepoResult<AttendanceRecord> {
        traced("set_attendance", || {
            self.attendance()?
                .set_attendance(&AttendanceMark::new(child_id, date, present))
        })
    }

    /// Reads all tables into a snapshot stamped with the current UTC time.
    pub fn snapshot(&self) -> RepoResult<Snapshot> {
        traced("snapshot", || {
            let mut snapshot = read_snapshot(&self.conn)?;
            snapshot.exported_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
            Ok(snapshot)
        })
    }

    /// Replaces all table contents with `snapshot`; all-or-nothing.
    pub fn restore(&self, snapshot: &Snapshot) -> RepoResult<usize> {
        traced("restore", || replace_with_snapshot(&self.conn, snapshot))
    }

    fn family(&self) -> RepoResult<SqliteFamilyRepository<'_>> {
        SqliteFamilyRepository::try_new(&self.conn)
    }

    fn billing(&self) -> RepoResult<SqliteBillingRepository<'_>> {
        SqliteBillingRepository::try_new(&self.conn)
    }

    fn attendance(&self) -> RepoResult<SqliteAttendanceRepository<'_>> {
        SqliteAttendanceRepository::try_new(&self.conn)
    }
}

fn traced<T>(op: &'static str, f: impl FnOnce() -> RepoResult<T>) -> RepoResult<T> {
    let started_at = Instant::now();
    let result = f();
    match &result {
        Ok(_) => info!(
            "event=store_op module=service op={op} status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=store_op module=service op={op} status=error duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
    result
}
