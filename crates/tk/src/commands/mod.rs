//! Command handlers, one module per subcommand.

pub mod create;
pub mod delete;
pub mod excluded;
pub mod fields;
pub mod init;
pub mod list;
pub mod set_field;
pub mod show;
pub mod transition;
pub mod workflow;

use anyhow::Result;

use ticketry_core::field::{FieldError, FieldValue};
use ticketry_core::workflow::WorkflowSpec;

use crate::context::parse_assignment;

/// Groups repeated `NAME=VALUE` arguments by name, keeping first-seen order.
pub(crate) fn group_assignments(args: &[String]) -> Result<Vec<(String, Vec<String>)>> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for arg in args {
        let (name, value) = parse_assignment(arg)?;
        match groups.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) => values.push(value.to_string()),
            None => groups.push((name.to_string(), vec![value.to_string()])),
        }
    }
    Ok(groups)
}

/// Parses command-line strings into a typed value for field `name`.
///
/// No strings, or only empty ones, mean "no value".
pub(crate) fn parse_field_input(
    workflow: &WorkflowSpec,
    name: &str,
    raw: &[String],
) -> Result<Option<FieldValue>, FieldError> {
    let spec = workflow
        .field_spec(name)
        .ok_or_else(|| FieldError::UnknownField(name.to_owned()))?;
    let values: Vec<String> = raw.iter().filter(|v| !v.is_empty()).cloned().collect();
    if values.len() > 1 && !spec.allow_multiple {
        return Err(FieldError::MultipleValuesNotAllowed {
            field: name.to_owned(),
        });
    }
    spec.convert_to_value(&values)
}
