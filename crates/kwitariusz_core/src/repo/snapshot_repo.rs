//! Whole-store export and replacement for backup/restore.
//!
//! # Invariants
//! - `replace_with_snapshot` is all-or-nothing: any validation, referential or
//!   constraint failure rolls the store back to its previous contents.
//! - Restored rows keep their original ids.

use super::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
use super::billing_repo::{BillingRepository, SqliteBillingRepository};
use super::family_repo::{FamilyRepository, SqliteFamilyRepository};
use super::{
    bool_to_int, ensure_connection_ready, ensure_referenced, map_constraint, EntityKind,
    RepoResult,
};
use crate::db::migrations::RECORD_TABLES;
use crate::model::snapshot::{Snapshot, SNAPSHOT_FORMAT_VERSION};
use crate::model::RecordId;
use rusqlite::{params, Connection};

/// Reads every row of every table.
///
/// `exported_at` is left empty; callers stamp it.
pub fn read_snapshot(conn: &Connection) -> RepoResult<Snapshot> {
    let family = SqliteFamilyRepository::try_new(conn)?;
    let billing = SqliteBillingRepository::try_new(conn)?;
    let attendance = SqliteAttendanceRepository::try_new(conn)?;

    Ok(Snapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        exported_at: None,
        parents: family.list_parents()?,
        children: family.list_children()?,
        rates: billing.list_rates()?,
        payments: billing.list_payments()?,
        attendance: attendance.list_attendance()?,
    })
}

/// Replaces the contents of all record tables with `snapshot`.
///
/// Returns the number of restored rows.
pub fn replace_with_snapshot(conn: &Connection, snapshot: &Snapshot) -> RepoResult<usize> {
    ensure_connection_ready(conn, RECORD_TABLES)?;
    if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
        return Err(super::RepoError::InvalidData(format!(
            "snapshot format version {} is newer than supported {}",
            snapshot.format_version, SNAPSHOT_FORMAT_VERSION
        )));
    }

    let tx = conn.unchecked_transaction()?;
    // Dependents first so restrict constraints never fire.
    tx.execute_batch(
        "DELETE FROM attendance;
         DELETE FROM payments;
         DELETE FROM children;
         DELETE FROM parents;
         DELETE FROM rates;",
    )?;

    for parent in &snapshot.parents {
        let parent = parent.validated()?;
        ensure_positive_id(EntityKind::Parent, parent.id)?;
        tx.execute(
            "INSERT INTO parents (id, firstName, lastName, email, phone)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                parent.id,
                parent.first_name,
                parent.last_name,
                parent.email,
                parent.phone
            ],
        )
        .map_err(|err| map_constraint(EntityKind::Parent, err))?;
    }

    for child in &snapshot.children {
        let child = child.validated()?;
        ensure_positive_id(EntityKind::Child, child.id)?;
        ensure_referenced(&tx, EntityKind::Parent, child.parent_id)?;
        tx.execute(
            "INSERT INTO children (id, firstName, lastName, groupName, birthDate, parentId)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                child.id,
                child.first_name,
                child.last_name,
                child.group_name,
                child.birth_date,
                child.parent_id
            ],
        )
        .map_err(|err| map_constraint(EntityKind::Child, err))?;
    }

    for rate in &snapshot.rates {
        let rate = rate.validated()?;
        ensure_positive_id(EntityKind::Rate, rate.id)?;
        tx.execute(
            "INSERT INTO rates (id, type, amount, description, date)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![rate.id, rate.kind, rate.amount, rate.description, rate.date],
        )
        .map_err(|err| map_constraint(EntityKind::Rate, err))?;
    }

    for payment in &snapshot.payments {
        let payment = payment.validated()?;
        ensure_positive_id(EntityKind::Payment, payment.id)?;
        ensure_referenced(&tx, EntityKind::Child, payment.child_id)?;
        ensure_referenced(&tx, EntityKind::Parent, payment.parent_id)?;
        tx.execute(
            "INSERT INTO payments (id, childId, parentId, amount, date)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                payment.id,
                payment.child_id,
                payment.parent_id,
                payment.amount,
                payment.date
            ],
        )
        .map_err(|err| map_constraint(EntityKind::Payment, err))?;
    }

    for record in &snapshot.attendance {
        let record = record.validated()?;
        ensure_positive_id(EntityKind::Attendance, record.id)?;
        ensure_referenced(&tx, EntityKind::Child, record.child_id)?;
        tx.execute(
            "INSERT INTO attendance (id, childId, date, present) VALUES (?1, ?2, ?3, ?4);",
            params![
                record.id,
                record.child_id,
                record.date,
                bool_to_int(record.present)
            ],
        )
        .map_err(|err| map_constraint(EntityKind::Attendance, err))?;
    }

    tx.commit()?;
    Ok(snapshot.record_count())
}

fn ensure_positive_id(entity: EntityKind, id: RecordId) -> RepoResult<()> {
    if id > 0 {
        return Ok(());
    }
    Err(super::RepoError::InvalidData(format!(
        "{entity} id must be positive, got {id}"
    )))
}
