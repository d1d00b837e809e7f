//! Rate/payment repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A payment insert requires both its child and its parent to exist.
//! - Nothing references rates or payments, so their deletes never restrict.

use super::{
    delete_by_id, ensure_connection_ready, ensure_referenced, EntityKind, RepoError, RepoResult,
};
use crate::model::payment::{NewPayment, Payment};
use crate::model::rate::{NewRate, Rate};
use crate::model::RecordId;
use rusqlite::{params, Connection, Row};

const RATE_SELECT_SQL: &str = "SELECT id, type, amount, description, date FROM rates";
const PAYMENT_SELECT_SQL: &str = "SELECT id, childId, parentId, amount, date FROM payments";

/// Repository interface for fee rates and received payments.
pub trait BillingRepository {
    fn list_rates(&self) -> RepoResult<Vec<Rate>>;
    fn insert_rate(&self, rate: &NewRate) -> RepoResult<Rate>;
    fn delete_rate(&self, id: RecordId) -> RepoResult<()>;
    fn list_payments(&self) -> RepoResult<Vec<Payment>>;
    fn insert_payment(&self, payment: &NewPayment) -> RepoResult<Payment>;
    fn delete_payment(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed billing repository.
pub struct SqliteBillingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBillingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["rates", "payments", "children", "parents"])?;
        Ok(Self { conn })
    }
}

impl BillingRepository for SqliteBillingRepository<'_> {
    fn list_rates(&self) -> RepoResult<Vec<Rate>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RATE_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query_map([], parse_rate_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(RepoError::from)
    }

    fn insert_rate(&self, rate: &NewRate) -> RepoResult<Rate> {
        let rate = rate.validated()?;

        self.conn.execute(
            "INSERT INTO rates (type, amount, description, date) VALUES (?1, ?2, ?3, ?4);",
            params![
                rate.kind.as_str(),
                rate.amount,
                rate.description.as_deref(),
                rate.date.as_str(),
            ],
        )?;

        Ok(rate.into_record(self.conn.last_insert_rowid()))
    }

    fn delete_rate(&self, id: RecordId) -> RepoResult<()> {
        delete_by_id(self.conn, EntityKind::Rate, id)
    }

    fn list_payments(&self) -> RepoResult<Vec<Payment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PAYMENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query_map([], parse_payment_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(RepoError::from)
    }

    fn insert_payment(&self, payment: &NewPayment) -> RepoResult<Payment> {
        let payment = payment.validated()?;

        let tx = self.conn.unchecked_transaction()?;
        ensure_referenced(&tx, EntityKind::Child, payment.child_id)?;
        ensure_referenced(&tx, EntityKind::Parent, payment.parent_id)?;
        tx.execute(
            "INSERT INTO payments (childId, parentId, amount, date) VALUES (?1, ?2, ?3, ?4);",
            params![
                payment.child_id,
                payment.parent_id,
                payment.amount,
                payment.date.as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(payment.into_record(id))
    }

    fn delete_payment(&self, id: RecordId) -> RepoResult<()> {
        delete_by_id(self.conn, EntityKind::Payment, id)
    }
}

pub(crate) fn parse_rate_row(row: &Row<'_>) -> rusqlite::Result<Rate> {
    Ok(Rate {
        id: row.get("id")?,
        kind: row.get("type")?,
        amount: row.get("amount")?,
        description: row.get("description")?,
        date: row.get("date")?,
    })
}

pub(crate) fn parse_payment_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get("id")?,
        child_id: row.get("childId")?,
        parent_id: row.get("parentId")?,
        amount: row.get("amount")?,
        date: row.get("date")?,
    })
}
