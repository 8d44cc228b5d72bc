//! Custom field values: typed values, raw storage rows, and effective views.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::FieldType;

/// Date format used when a [`FieldValue::Date`] is stored as a string.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while converting custom field values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("no field spec declared for '{0}'")]
    UnknownField(String),

    #[error("field '{field}' expects a {expected} value, got {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    #[error("'{value}' is not a valid choice for field '{field}'")]
    InvalidChoice { field: String, value: String },

    #[error("field '{field}' does not allow multiple values")]
    MultipleValuesNotAllowed { field: String },

    #[error("cannot read '{value}' as a value of field '{field}': {reason}")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },
}

/// A typed custom field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    /// Selected values of a multi-valued choice field.
    Choices(Vec<String>),
}

impl FieldValue {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Choices(_) => "choice list",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Choices(values) => f.write_str(&values.join(", ")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::Choices(values)
    }
}

/// One stored value of a custom field.
///
/// A field with several values is stored as several rows sharing a name. A
/// field explicitly set to nothing is stored as a single row whose `value`
/// is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRow {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Sort key derived from the field spec when the row was written.
    #[serde(default = "default_ordinal")]
    pub ordinal: i64,
}

fn default_ordinal() -> i64 {
    -1
}

impl FieldRow {
    pub fn new(name: impl Into<String>, value: Option<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            value,
            field_type,
            ordinal: -1,
        }
    }

    pub fn with_ordinal(mut self, ordinal: i64) -> Self {
        self.ordinal = ordinal;
        self
    }
}

/// The resolved view of one custom field for an issue in its current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Non-null stored values, sorted.
    pub values: Vec<String>,
}

/// Effective fields in workflow declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectiveFields {
    fields: Vec<EffectiveField>,
}

impl EffectiveFields {
    pub(crate) fn push(&mut self, field: EffectiveField) {
        self.fields.push(field);
    }

    pub fn get(&self, name: &str) -> Option<&EffectiveField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EffectiveField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a EffectiveFields {
    type Item = &'a EffectiveField;
    type IntoIter = std::slice::Iter<'a, EffectiveField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
