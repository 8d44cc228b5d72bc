//! Per-project workflow specification.
//!
//! A [`WorkflowSpec`] declares the states an issue may be in, the custom
//! fields issues of the project carry, and which of those fields apply in
//! each state. It is supplied by configuration and is read-only here.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::FieldType;
use crate::field::{DATE_FORMAT, FieldError, FieldValue};
use crate::issue::builtin_field;

/// Error type for malformed workflow specifications.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow must declare at least one state")]
    NoStates,

    #[error("state '{0}' is declared more than once")]
    DuplicateState(String),

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("field name '{0}' is reserved for a built-in issue field")]
    ReservedFieldName(String),

    #[error("state '{state}' references undeclared field '{field}'")]
    UndeclaredField { state: String, field: String },

    #[error("field '{field}' has unsupported type '{field_type}'")]
    UnsupportedFieldType { field: String, field_type: String },

    #[error("field '{0}' allows multiple values but is not a choice field")]
    MultipleNotSupported(String),

    #[error("field '{field}' lists choice '{choice}' more than once")]
    DuplicateChoice { field: String, choice: String },
}

// ---------------------------------------------------------------------------
// Field specs
// ---------------------------------------------------------------------------

/// Declaration of one custom field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Allowed values of a choice field. Empty means any value is accepted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(default)]
    pub allow_multiple: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    fn with_type(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            choices: Vec::new(),
            allow_multiple: false,
            description: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::Date)
    }

    pub fn choice<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Self::with_type(name, FieldType::Choice);
        spec.choices = choices.into_iter().map(Into::into).collect();
        spec
    }

    /// Marks the field as multi-valued.
    pub fn multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    fn check_choice(&self, value: &str) -> Result<(), FieldError> {
        if self.choices.is_empty() || self.choices.iter().any(|c| c == value) {
            Ok(())
        } else {
            Err(FieldError::InvalidChoice {
                field: self.name.clone(),
                value: value.to_owned(),
            })
        }
    }

    fn mismatch(&self, value: &FieldValue) -> FieldError {
        FieldError::TypeMismatch {
            field: self.name.clone(),
            expected: self.field_type.clone(),
            found: value.kind_name(),
        }
    }

    /// Converts a typed value into the strings stored for it.
    ///
    /// An empty text or an empty choice list converts to no strings at all.
    pub fn convert_to_strings(&self, value: &FieldValue) -> Result<Vec<String>, FieldError> {
        match (&self.field_type, value) {
            (FieldType::Text, FieldValue::Text(s)) => Ok(non_empty(s)),
            (FieldType::Integer, FieldValue::Integer(n)) => Ok(vec![n.to_string()]),
            (FieldType::Boolean, FieldValue::Boolean(b)) => Ok(vec![b.to_string()]),
            (FieldType::Date, FieldValue::Date(d)) => Ok(vec![d.format(DATE_FORMAT).to_string()]),
            (FieldType::Choice, FieldValue::Text(s)) => {
                if s.is_empty() {
                    return Ok(Vec::new());
                }
                self.check_choice(s)?;
                Ok(vec![s.clone()])
            }
            (FieldType::Choice, FieldValue::Choices(values)) => {
                let mut seen = HashSet::new();
                let mut strings = Vec::with_capacity(values.len());
                for v in values {
                    self.check_choice(v)?;
                    if seen.insert(v.as_str()) {
                        strings.push(v.clone());
                    }
                }
                if strings.len() > 1 && !self.allow_multiple {
                    return Err(FieldError::MultipleValuesNotAllowed {
                        field: self.name.clone(),
                    });
                }
                Ok(strings)
            }
            _ => Err(self.mismatch(value)),
        }
    }

    /// Converts stored strings back into a typed value.
    ///
    /// Returns `Ok(None)` when there are no strings. Only the first string
    /// is read for single-valued fields.
    pub fn convert_to_value(&self, strings: &[String]) -> Result<Option<FieldValue>, FieldError> {
        let Some(first) = strings.first() else {
            return Ok(None);
        };
        let parse_err = |reason: String| FieldError::Parse {
            field: self.name.clone(),
            value: first.clone(),
            reason,
        };
        let value = match &self.field_type {
            FieldType::Text => FieldValue::Text(first.clone()),
            FieldType::Integer => FieldValue::Integer(
                first
                    .parse::<i64>()
                    .map_err(|e| parse_err(e.to_string()))?,
            ),
            FieldType::Boolean => FieldValue::Boolean(
                first
                    .parse::<bool>()
                    .map_err(|e| parse_err(e.to_string()))?,
            ),
            FieldType::Date => FieldValue::Date(
                NaiveDate::parse_from_str(first, DATE_FORMAT)
                    .map_err(|e| parse_err(e.to_string()))?,
            ),
            FieldType::Choice if self.allow_multiple => FieldValue::Choices(strings.to_vec()),
            FieldType::Choice => FieldValue::Text(first.clone()),
            FieldType::Other(t) => return Err(parse_err(format!("unsupported field type '{t}'"))),
        };
        Ok(Some(value))
    }

    /// Sort key for a value of this field.
    ///
    /// Single choices sort by their position in the choice list and integers
    /// by their value. Everything else has ordinal -1.
    pub fn ordinal(&self, value: Option<&FieldValue>) -> i64 {
        match (&self.field_type, value) {
            (FieldType::Choice, Some(FieldValue::Text(s))) => self
                .choices
                .iter()
                .position(|c| c == s)
                .map_or(-1, |i| i as i64),
            (FieldType::Integer, Some(FieldValue::Integer(n))) => *n,
            _ => -1,
        }
    }
}

fn non_empty(s: &str) -> Vec<String> {
    if s.is_empty() {
        Vec::new()
    } else {
        vec![s.to_owned()]
    }
}

// ---------------------------------------------------------------------------
// State specs
// ---------------------------------------------------------------------------

/// Declaration of one workflow state and the fields applicable in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: Vec<String>,
}

impl StateSpec {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}

// ---------------------------------------------------------------------------
// Workflow spec
// ---------------------------------------------------------------------------

/// States and custom fields of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    /// Ordered states; the first one is the initial state of new issues.
    #[serde(default)]
    pub states: Vec<StateSpec>,

    /// Ordered field declarations.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl WorkflowSpec {
    pub fn new(states: Vec<StateSpec>, fields: Vec<FieldSpec>) -> Self {
        Self { states, fields }
    }

    pub fn state_spec(&self, name: &str) -> Option<&StateSpec> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.state_spec(name).is_some()
    }

    pub fn initial_state(&self) -> Option<&str> {
        self.states.first().map(|s| s.name.as_str())
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_specs(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Names of the fields applicable in `state`.
    ///
    /// A state the workflow does not declare has no applicable fields.
    pub fn applicable_fields(&self, state: &str) -> BTreeSet<&str> {
        self.state_spec(state)
            .map(|s| s.fields.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Checks the workflow for internal consistency.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.states.is_empty() {
            return Err(WorkflowError::NoStates);
        }

        let mut field_names = HashSet::new();
        for field in &self.fields {
            if builtin_field(&field.name).is_some() {
                return Err(WorkflowError::ReservedFieldName(field.name.clone()));
            }
            if !field_names.insert(field.name.as_str()) {
                return Err(WorkflowError::DuplicateField(field.name.clone()));
            }
            if !field.field_type.is_builtin() {
                return Err(WorkflowError::UnsupportedFieldType {
                    field: field.name.clone(),
                    field_type: field.field_type.to_string(),
                });
            }
            if field.allow_multiple && field.field_type != FieldType::Choice {
                return Err(WorkflowError::MultipleNotSupported(field.name.clone()));
            }
            let mut choices = HashSet::new();
            for choice in &field.choices {
                if !choices.insert(choice.as_str()) {
                    return Err(WorkflowError::DuplicateChoice {
                        field: field.name.clone(),
                        choice: choice.clone(),
                    });
                }
            }
        }

        let mut state_names = HashSet::new();
        for state in &self.states {
            if !state_names.insert(state.name.as_str()) {
                return Err(WorkflowError::DuplicateState(state.name.clone()));
            }
            for field in &state.fields {
                if !field_names.contains(field.as_str()) {
                    return Err(WorkflowError::UndeclaredField {
                        state: state.name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
