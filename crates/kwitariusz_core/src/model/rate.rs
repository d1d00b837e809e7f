//! Fee rate record (monthly fee, meal rate, one-off charges).

use super::{optional_text, require_amount, require_date, require_text, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted rate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub id: RecordId,
    /// Serialized as `type` to match the column name.
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub description: Option<String>,
    /// ISO `YYYY-MM-DD` from which the rate applies.
    pub date: String,
}

/// Insert input for a rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRate {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
}

impl NewRate {
    pub fn new(kind: impl Into<String>, amount: f64, date: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            amount,
            description: None,
            date: date.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns a normalized copy. Blank descriptions become `None`.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            kind: require_text("type", &self.kind)?,
            amount: require_amount("amount", self.amount)?,
            description: optional_text(self.description.as_deref()),
            date: require_date("date", &self.date)?,
        })
    }

    pub fn into_record(self, id: RecordId) -> Rate {
        Rate {
            id,
            kind: self.kind,
            amount: self.amount,
            description: self.description,
            date: self.date,
        }
    }
}

impl Rate {
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let fields = NewRate {
            kind: self.kind.clone(),
            amount: self.amount,
            description: self.description.clone(),
            date: self.date.clone(),
        }
        .validated()?;
        Ok(fields.into_record(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::NewRate;

    #[test]
    fn serializes_kind_as_type_and_missing_description_as_null() {
        let rate = NewRate::new("monthly", 350.0, "2024-09-01")
            .validated()
            .unwrap()
            .into_record(1);
        let json = serde_json::to_value(&rate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "type": "monthly",
                "amount": 350.0,
                "description": null,
                "date": "2024-09-01"
            })
        );
    }

    #[test]
    fn deserializes_without_description() {
        let rate: NewRate =
            serde_json::from_str(r#"{"type":"meal","amount":12.5,"date":"2024-10-01"}"#).unwrap();
        assert_eq!(rate.kind, "meal");
        assert_eq!(rate.description, None);
    }
}
