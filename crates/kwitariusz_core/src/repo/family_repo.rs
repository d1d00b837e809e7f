//! Parent/child repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - List, insert and delete parents and children.
//!
//! # Invariants
//! - A child insert requires an existing parent.
//! - Delete policy is restrict: a parent with children or payments, or a
//!   child with payments, cannot be deleted. Attendance cascades with its child.

use super::{
    delete_by_id, ensure_connection_ready, ensure_referenced, ensure_unreferenced, EntityKind,
    RepoError, RepoResult,
};
use crate::model::child::{Child, NewChild};
use crate::model::parent::{NewParent, Parent};
use crate::model::RecordId;
use rusqlite::{params, Connection, Row};

const PARENT_SELECT_SQL: &str = "SELECT id, firstName, lastName, email, phone FROM parents";
const CHILD_SELECT_SQL: &str =
    "SELECT id, firstName, lastName, groupName, birthDate, parentId FROM children";

/// Repository interface for parents and their children.
pub trait FamilyRepository {
    fn list_parents(&self) -> RepoResult<Vec<Parent>>;
    fn insert_parent(&self, parent: &NewParent) -> RepoResult<Parent>;
    fn delete_parent(&self, id: RecordId) -> RepoResult<()>;
    fn list_children(&self) -> RepoResult<Vec<Child>>;
    fn insert_child(&self, child: &NewChild) -> RepoResult<Child>;
    fn delete_child(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed parent/child repository.
pub struct SqliteFamilyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFamilyRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["parents", "children", "payments"])?;
        Ok(Self { conn })
    }
}

impl FamilyRepository for SqliteFamilyRepository<'_> {
    fn list_parents(&self) -> RepoResult<Vec<Parent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query_map([], parse_parent_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(RepoError::from)
    }

    fn insert_parent(&self, parent: &NewParent) -> RepoResult<Parent> {
        let parent = parent.validated()?;

        self.conn.execute(
            "INSERT INTO parents (firstName, lastName, email, phone) VALUES (?1, ?2, ?3, ?4);",
            params![
                parent.first_name.as_str(),
                parent.last_name.as_str(),
                parent.email.as_str(),
                parent.phone.as_str(),
            ],
        )?;

        Ok(parent.into_record(self.conn.last_insert_rowid()))
    }

    fn delete_parent(&self, id: RecordId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        if !super::record_exists(&tx, EntityKind::Parent, id)? {
            return Err(RepoError::NotFound {
                entity: EntityKind::Parent,
                id,
            });
        }
        ensure_unreferenced(&tx, EntityKind::Parent, id, EntityKind::Child, "parentId")?;
        ensure_unreferenced(&tx, EntityKind::Parent, id, EntityKind::Payment, "parentId")?;
        delete_by_id(&tx, EntityKind::Parent, id)?;
        tx.commit()?;
        Ok(())
    }

    fn list_children(&self) -> RepoResult<Vec<Child>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHILD_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query_map([], parse_child_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(RepoError::from)
    }

    fn insert_child(&self, child: &NewChild) -> RepoResult<Child> {
        let child = child.validated()?;

        let tx = self.conn.unchecked_transaction()?;
        ensure_referenced(&tx, EntityKind::Parent, child.parent_id)?;
        tx.execute(
            "INSERT INTO children (firstName, lastName, groupName, birthDate, parentId)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                child.first_name.as_str(),
                child.last_name.as_str(),
                child.group_name.as_str(),
                child.birth_date.as_str(),
                child.parent_id,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(child.into_record(id))
    }

    fn delete_child(&self, id: RecordId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        if !super::record_exists(&tx, EntityKind::Child, id)? {
            return Err(RepoError::NotFound {
                entity: EntityKind::Child,
                id,
            });
        }
        ensure_unreferenced(&tx, EntityKind::Child, id, EntityKind::Payment, "childId")?;
        delete_by_id(&tx, EntityKind::Child, id)?;
        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn parse_parent_row(row: &Row<'_>) -> rusqlite::Result<Parent> {
    Ok(Parent {
        id: row.get("id")?,
        first_name: row.get("firstName")?,
        last_name: row.get("lastName")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
    })
}

pub(crate) fn parse_child_row(row: &Row<'_>) -> rusqlite::Result<Child> {
    Ok(Child {
        id: row.get("id")?,
        first_name: row.get("firstName")?,
        last_name: row.get("lastName")?,
        group_name: row.get("groupName")?,
        birth_date: row.get("birthDate")?,
        parent_id: row.get("parentId")?,
    })
}
