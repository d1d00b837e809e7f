//! Payment record: money received from a parent for a child.

use super::{require_amount, require_date, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted payment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: RecordId,
    pub child_id: RecordId,
    pub parent_id: RecordId,
    pub amount: f64,
    pub date: String,
}

/// Insert input for a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub child_id: RecordId,
    pub parent_id: RecordId,
    pub amount: f64,
    pub date: String,
}

impl NewPayment {
    pub fn new(
        child_id: RecordId,
        parent_id: RecordId,
        amount: f64,
        date: impl Into<String>,
    ) -> Self {
        Self {
            child_id,
            parent_id,
            amount,
            date: date.into(),
        }
    }

    pub fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            child_id: self.child_id,
            parent_id: self.parent_id,
            amount: require_amount("amount", self.amount)?,
            date: require_date("date", &self.date)?,
        })
    }

    pub fn into_record(self, id: RecordId) -> Payment {
        Payment {
            id,
            child_id: self.child_id,
            parent_id: self.parent_id,
            amount: self.amount,
            date: self.date,
        }
    }
}

impl Payment {
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let fields =
            NewPayment::new(self.child_id, self.parent_id, self.amount, self.date.as_str())
                .validated()?;
        Ok(fields.into_record(self.id))
    }
}
