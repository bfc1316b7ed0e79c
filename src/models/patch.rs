//! Tri-state field for partial updates.
//!
//! A JSON key that is missing, present as `null`, or present with a value are
//! three different requests. Use with `#[serde(default)]` on the field so a
//! missing key lands on `Absent`.

use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key not sent: leave the stored value unchanged.
    Absent,
    /// Key sent as `null`: clear the stored value.
    Null,
    /// Key sent with a value: overwrite.
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// For a column that cannot be null: `Null` is rejected naming `field`.
    pub fn required(self, field: &str) -> AppResult<Option<T>> {
        match self {
            Patch::Absent => Ok(None),
            Patch::Null => Err(AppError::Validation(format!("{} cannot be null", field))),
            Patch::Value(v) => Ok(Some(v)),
        }
    }
}

impl Patch<String> {
    /// Treat a blank string the same as `null`.
    pub fn blank_as_null(self) -> Self {
        match self {
            Patch::Value(v) if v.trim().is_empty() => Patch::Null,
            other => other,
        }
    }

    /// For a non-null text column: `null` and blank strings are rejected.
    pub fn required_text(self, field: &str) -> AppResult<Option<String>> {
        match self.required(field)? {
            Some(v) if v.trim().is_empty() => {
                Err(AppError::Validation(format!("{} cannot be empty", field)))
            }
            other => Ok(other),
        }
    }
}
