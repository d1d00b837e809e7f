//! Child record. Every child belongs to exactly one parent.

use super::{require_date, require_text, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted child row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub group_name: String,
    /// ISO `YYYY-MM-DD`.
    pub birth_date: String,
    pub parent_id: RecordId,
}

/// Insert input for a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChild {
    pub first_name: String,
    pub last_name: String,
    pub group_name: String,
    pub birth_date: String,
    pub parent_id: RecordId,
}

impl NewChild {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        group_name: impl Into<String>,
        birth_date: impl Into<String>,
        parent_id: RecordId,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            group_name: group_name.into(),
            birth_date: birth_date.into(),
            parent_id,
        }
    }

    /// Returns a trimmed copy with a canonical birth date.
    ///
    /// Does not check that `parent_id` resolves; that is a repository concern.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            first_name: require_text("firstName", &self.first_name)?,
            last_name: require_text("lastName", &self.last_name)?,
            group_name: require_text("groupName", &self.group_name)?,
            birth_date: require_date("birthDate", &self.birth_date)?,
            parent_id: self.parent_id,
        })
    }

    pub fn into_record(self, id: RecordId) -> Child {
        Child {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            group_name: self.group_name,
            birth_date: self.birth_date,
            parent_id: self.parent_id,
        }
    }
}

impl Child {
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let fields = NewChild::new(
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.group_name.as_str(),
            self.birth_date.as_str(),
            self.parent_id,
        )
        .validated()?;
        Ok(fields.into_record(self.id))
    }
}
