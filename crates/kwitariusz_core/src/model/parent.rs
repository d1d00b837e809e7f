//! Parent (guardian) record.

use super::{require_text, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted parent row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Insert input for a parent. All fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl NewParent {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Returns a trimmed copy, or the first missing field.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            first_name: require_text("firstName", &self.first_name)?,
            last_name: require_text("lastName", &self.last_name)?,
            email: require_text("email", &self.email)?,
            phone: require_text("phone", &self.phone)?,
        })
    }

    pub fn into_record(self, id: RecordId) -> Parent {
        Parent {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
        }
    }
}

impl Parent {
    /// Re-validates a row coming from outside the database (restore path).
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let fields = NewParent::new(
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
        )
        .validated()?;
        Ok(fields.into_record(self.id))
    }
}
