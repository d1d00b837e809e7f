//! Attendance repository: per-day presence marks.
//!
//! # Invariants
//! - `(childId, date)` is unique; `set_attendance` upserts on that key.
//! - Stored `present` values are exactly 0 or 1; anything else is reported
//!   as invalid data instead of being coerced.

use super::{
    bool_to_int, ensure_connection_ready, ensure_referenced, EntityKind, RepoError, RepoResult,
};
use crate::model::attendance::{AttendanceMark, AttendanceMonth, AttendanceRecord};
use crate::model::RecordId;
use rusqlite::{params, Connection, Row};

const ATTENDANCE_SELECT_SQL: &str = "SELECT id, childId, date, present FROM attendance";

/// Repository interface for attendance marks.
pub trait AttendanceRepository {
    /// Inserts or updates the mark for `(child_id, date)` and returns the stored row.
    fn set_attendance(&self, mark: &AttendanceMark) -> RepoResult<AttendanceRecord>;
    fn get_attendance(&self, child_id: RecordId, date: &str)
        -> RepoResult<Option<AttendanceRecord>>;
    fn list_attendance(&self) -> RepoResult<Vec<AttendanceRecord>>;
    fn list_attendance_for_month(&self, month: &AttendanceMonth)
        -> RepoResult<Vec<AttendanceRecord>>;
}

/// SQLite-backed attendance repository.
pub struct SqliteAttendanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["attendance", "children"])?;
        Ok(Self { conn })
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn set_attendance(&self, mark: &AttendanceMark) -> RepoResult<AttendanceRecord> {
        let mark = mark.validated()?;

        let tx = self.conn.unchecked_transaction()?;
        ensure_referenced(&tx, EntityKind::Child, mark.child_id)?;
        tx.execute(
            "INSERT INTO attendance (childId, date, present) VALUES (?1, ?2, ?3)
             ON CONFLICT (childId, date) DO UPDATE SET present = excluded.present;",
            params![mark.child_id, mark.date.as_str(), bool_to_int(mark.present)],
        )?;
        let record = select_one(&tx, mark.child_id, &mark.date)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "attendance row for child {} on {} vanished after upsert",
                mark.child_id, mark.date
            ))
        })?;
        tx.commit()?;

        Ok(record)
    }

    fn get_attendance(
        &self,
        child_id: RecordId,
        date: &str,
    ) -> RepoResult<Option<AttendanceRecord>> {
        select_one(self.conn, child_id, date)
    }

    fn list_attendance(&self) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ATTENDANCE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }
        Ok(records)
    }

    fn list_attendance_for_month(
        &self,
        month: &AttendanceMonth,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             WHERE date >= ?1 AND date < ?2
             ORDER BY date ASC, childId ASC;"
        ))?;
        let mut rows = stmt.query(params![month.start(), month.end()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }
        Ok(records)
    }
}

fn select_one(
    conn: &Connection,
    child_id: RecordId,
    date: &str,
) -> RepoResult<Option<AttendanceRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{ATTENDANCE_SELECT_SQL} WHERE childId = ?1 AND date = ?2;"
    ))?;
    let mut rows = stmt.query(params![child_id, date])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_attendance_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn parse_attendance_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let present = match row.get::<_, i64>("present")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid present value `{other}` in attendance.present"
            )));
        }
    };

    Ok(AttendanceRecord {
        id: row.get("id")?,
        child_id: row.get("childId")?,
        date: row.get("date")?,
        present,
    })
}
