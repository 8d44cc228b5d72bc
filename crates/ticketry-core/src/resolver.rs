//! Field resolution: from raw field rows to effective, typed field values.
//!
//! Raw rows are what storage holds. Which of them count depends on the
//! issue's current state, the workflow's field declarations (order, type,
//! multiplicity), and whether the stored strings still convert under the
//! current declaration. Nothing computed here is persisted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, error};

use crate::field::{EffectiveField, EffectiveFields, FieldError, FieldRow, FieldValue};
use crate::issue::Issue;
use crate::workflow::{FieldSpec, WorkflowSpec};

/// Errors raised by state-dependent field lookups and projections.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no state spec found for state '{0}'")]
    UnknownState(String),

    #[error("field '{0}' has no slot in the target shape")]
    UnmappedField(String),

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Computes the effective fields from raw rows.
///
/// Rows whose name is not in `applicable` are ignored. The output follows
/// the order of `specs`; each entry carries the type tag of its first row and
/// the sorted, deduplicated non-null values. Single-valued fields keep only
/// the smallest value.
pub fn resolve_effective_fields(
    applicable: &BTreeSet<&str>,
    specs: &[FieldSpec],
    rows: &[FieldRow],
) -> EffectiveFields {
    let mut grouped: HashMap<&str, Vec<&FieldRow>> = HashMap::new();
    for row in rows {
        if applicable.contains(row.name.as_str()) {
            grouped.entry(row.name.as_str()).or_default().push(row);
        }
    }

    let mut effective = EffectiveFields::default();
    for spec in specs {
        let Some(group) = grouped.get(spec.name.as_str()) else {
            continue;
        };
        let Some(first) = group.first() else {
            continue;
        };
        let mut values: Vec<String> = group.iter().filter_map(|r| r.value.clone()).collect();
        values.sort();
        values.dedup();
        if !spec.allow_multiple {
            values.truncate(1);
        }
        effective.push(EffectiveField {
            name: spec.name.clone(),
            field_type: first.field_type.clone(),
            values,
        });
    }
    effective
}

// ---------------------------------------------------------------------------
// Projection targets
// ---------------------------------------------------------------------------

/// One named slot of a [`FieldShape`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSlot {
    pub display_name: String,
    pub property: String,
}

/// Describes the slots of a structured form: field display name to
/// property name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldShape {
    slots: Vec<FieldSlot>,
}

impl FieldShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot.
    pub fn slot(mut self, display_name: impl Into<String>, property: impl Into<String>) -> Self {
        self.slots.push(FieldSlot {
            display_name: display_name.into(),
            property: property.into(),
        });
        self
    }

    /// A shape with one slot per declared field of `workflow`, named after
    /// the field in snake case.
    pub fn from_workflow(workflow: &WorkflowSpec) -> Self {
        workflow
            .field_specs()
            .iter()
            .fold(Self::new(), |shape, spec| {
                let property = property_name(&spec.name);
                shape.slot(spec.name.clone(), property)
            })
    }

    pub fn property_of(&self, display_name: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.display_name == display_name)
            .map(|s| s.property.as_str())
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }
}

/// Converts a display name such as `"Fix Version"` into `"fix_version"`.
pub fn property_name(display_name: &str) -> String {
    display_name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Values held by the slots of a [`FieldShape`], keyed by property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldBean {
    values: BTreeMap<String, Option<FieldValue>>,
}

impl FieldBean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, property: impl Into<String>, value: Option<FieldValue>) {
        self.values.insert(property.into(), value);
    }

    pub fn get(&self, property: &str) -> Option<&FieldValue> {
        self.values.get(property).and_then(Option::as_ref)
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Issue operations
// ---------------------------------------------------------------------------

impl Issue {
    /// Effective custom fields for the issue's current state.
    pub fn effective_fields(&self, workflow: &WorkflowSpec) -> EffectiveFields {
        resolve_effective_fields(
            &workflow.applicable_fields(&self.state),
            workflow.field_specs(),
            &self.fields,
        )
    }

    fn read_value(&self, spec: &FieldSpec, field: &EffectiveField) -> Option<FieldValue> {
        match spec.convert_to_value(&field.values) {
            Ok(value) => value,
            Err(e) => {
                error!(issue = %self.reference(), field = %spec.name, error = %e, "failed to read field value");
                None
            }
        }
    }

    /// Typed value of a custom field, or `None` if it has no effective value.
    ///
    /// Stored strings that no longer convert under the field's declaration
    /// are logged and read as `None`.
    pub fn field_value(&self, workflow: &WorkflowSpec, name: &str) -> Option<FieldValue> {
        let effective = self.effective_fields(workflow);
        let field = effective.get(name)?;
        let spec = workflow.field_spec(name)?;
        self.read_value(spec, field)
    }

    /// Sort key of `value` for field `name`; -1 for undeclared fields.
    pub fn field_ordinal(&self, workflow: &WorkflowSpec, name: &str, value: Option<&FieldValue>) -> i64 {
        workflow.field_spec(name).map_or(-1, |spec| spec.ordinal(value))
    }

    /// Replaces all stored rows of field `name`.
    ///
    /// `None`, or a value converting to no strings, is stored as a single
    /// row without a value. Fails without touching the rows when the field
    /// is not declared or the value does not convert.
    pub fn set_field_value(
        &mut self,
        workflow: &WorkflowSpec,
        name: &str,
        value: Option<FieldValue>,
    ) -> Result<(), FieldError> {
        let spec = workflow
            .field_spec(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_owned()))?;
        let strings = match &value {
            Some(v) => spec.convert_to_strings(v)?,
            None => Vec::new(),
        };
        let ordinal = spec.ordinal(value.as_ref());

        self.fields.retain(|row| row.name != name);
        if strings.is_empty() {
            self.fields
                .push(FieldRow::new(name, None, spec.field_type.clone()).with_ordinal(ordinal));
        } else {
            for s in strings {
                self.fields.push(
                    FieldRow::new(name, Some(s), spec.field_type.clone()).with_ordinal(ordinal),
                );
            }
        }
        debug!(issue = %self.reference(), field = name, "field value set");
        Ok(())
    }

    /// Properties of `shape` to leave out of a form for `state`.
    ///
    /// A declared field is excluded when it does not apply in `state` or
    /// when the issue has no effective value for it.
    pub fn excluded_fields(
        &self,
        workflow: &WorkflowSpec,
        shape: &FieldShape,
        state: &str,
    ) -> Result<BTreeSet<String>, ResolveError> {
        let state_spec = workflow
            .state_spec(state)
            .ok_or_else(|| ResolveError::UnknownState(state.to_owned()))?;
        let effective = self.effective_fields(workflow);

        let mut excluded = BTreeSet::new();
        for spec in workflow.field_specs() {
            let has_value = effective
                .get(&spec.name)
                .and_then(|field| self.read_value(spec, field))
                .is_some();
            if !state_spec.has_field(&spec.name) || !has_value {
                let property = shape
                    .property_of(&spec.name)
                    .ok_or_else(|| ResolveError::UnmappedField(spec.name.clone()))?;
                excluded.insert(property.to_owned());
            }
        }
        Ok(excluded)
    }

    /// Projects the effective fields onto the slots of `shape`.
    pub fn field_bean(
        &self,
        workflow: &WorkflowSpec,
        shape: &FieldShape,
    ) -> Result<FieldBean, ResolveError> {
        let mut bean = FieldBean::new();
        for field in &self.effective_fields(workflow) {
            let property = shape
                .property_of(&field.name)
                .ok_or_else(|| ResolveError::UnmappedField(field.name.clone()))?;
            let value = workflow
                .field_spec(&field.name)
                .and_then(|spec| self.read_value(spec, field));
            bean.set(property, value);
        }
        Ok(bean)
    }

    /// Stores the values of `bean` for the slots whose display name is in
    /// `names`.
    pub fn set_field_bean(
        &mut self,
        workflow: &WorkflowSpec,
        bean: &FieldBean,
        shape: &FieldShape,
        names: &[impl AsRef<str>],
    ) -> Result<(), FieldError> {
        for slot in shape.slots() {
            if names.iter().any(|n| n.as_ref() == slot.display_name) {
                let value = bean.get(&slot.property).cloned();
                self.set_field_value(workflow, &slot.display_name, value)?;
            }
        }
        Ok(())
    }

    /// Moves the issue to `state` and records the change as last activity.
    pub fn change_state(
        &mut self,
        workflow: &WorkflowSpec,
        state: &str,
        user: Option<&str>,
    ) -> Result<(), ResolveError> {
        if !workflow.has_state(state) {
            return Err(ResolveError::UnknownState(state.to_owned()));
        }
        let from = std::mem::replace(&mut self.state, state.to_owned());
        self.touch(format!("changed state from \"{from}\" to \"{state}\""), user);
        debug!(issue = %self.reference(), from = %from, to = state, "state changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::FieldType;
    use crate::workflow::StateSpec;
    use pretty_assertions::assert_eq;

    fn workflow() -> WorkflowSpec {
        WorkflowSpec::new(
            vec![
                StateSpec::new("Open", ["Severity", "Labels", "Estimate"]),
                StateSpec::new("Closed", ["Severity", "Labels", "Estimate", "Resolution"]),
            ],
            vec![
                FieldSpec::choice("Severity", ["Low", "Medium", "High"]),
                FieldSpec::choice("Labels", Vec::<String>::new()).multiple(),
                FieldSpec::integer("Estimate"),
                FieldSpec::text("Resolution"),
            ],
        )
    }

    fn row(name: &str, value: &str, field_type: FieldType) -> FieldRow {
        FieldRow::new(name, Some(value.to_owned()), field_type)
    }

    fn open_issue() -> Issue {
        Issue::new("web", 1, "Crash on save", "Open")
    }

    #[test]
    fn single_valued_field_keeps_smallest_value() {
        let mut issue = open_issue();
        issue.fields.push(row("Severity", "Low", FieldType::Choice));
        issue.fields.push(row("Severity", "High", FieldType::Choice));

        let effective = issue.effective_fields(&workflow());
        assert_eq!(effective.get("Severity").unwrap().values, vec!["High"]);
    }

    #[test]
    fn multi_valued_field_is_sorted() {
        let wf = workflow();
        let mut issue = open_issue();
        issue
            .set_field_value(&wf, "Labels", Some(vec!["b".to_string(), "a".to_string()].into()))
            .unwrap();

        let effective = issue.effective_fields(&wf);
        assert_eq!(effective.get("Labels").unwrap().values, vec!["a", "b"]);
        assert_eq!(
            issue.field_value(&wf, "Labels"),
            Some(FieldValue::Choices(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn output_follows_declaration_order() {
        let mut issue = open_issue();
        issue.fields.push(row("Estimate", "3", FieldType::Integer));
        issue.fields.push(row("Labels", "ui", FieldType::Choice));
        issue.fields.push(row("Severity", "High", FieldType::Choice));

        let effective = issue.effective_fields(&workflow());
        assert_eq!(
            effective.names().collect::<Vec<_>>(),
            vec!["Severity", "Labels", "Estimate"]
        );
    }

    #[test]
    fn rows_outside_state_are_omitted() {
        let wf = workflow();
        let mut issue = open_issue();
        issue.fields.push(row("Resolution", "Fixed", FieldType::Text));
        issue.fields.push(row("Severity", "Low", FieldType::Choice));

        let effective = issue.effective_fields(&wf);
        assert!(!effective.contains("Resolution"));
        let applicable = wf.applicable_fields(&issue.state);
        assert!(effective.names().all(|n| applicable.contains(n)));

        issue.change_state(&wf, "Closed", Some("bob")).unwrap();
        assert_eq!(
            issue.field_value(&wf, "Resolution"),
            Some(FieldValue::Text("Fixed".into()))
        );
    }

    #[test]
    fn type_tag_comes_from_first_row() {
        let mut issue = open_issue();
        issue
            .fields
            .push(row("Severity", "High", FieldType::Other("Legacy Choice".into())));
        let effective = issue.effective_fields(&workflow());
        assert_eq!(
            effective.get("Severity").unwrap().field_type,
            FieldType::Other("Legacy Choice".into())
        );
    }

    #[test]
    fn set_field_value_is_idempotent() {
        let wf = workflow();
        let mut issue = open_issue();
        issue
            .set_field_value(&wf, "Severity", Some("High".into()))
            .unwrap();
        let once = issue.fields.clone();
        issue
            .set_field_value(&wf, "Severity", Some("High".into()))
            .unwrap();
        assert_eq!(issue.fields, once);
        assert_eq!(once.len(), 1);
        assert_eq!(once[0].ordinal, 2);
    }

    #[test]
    fn set_field_value_replaces_previous_rows() {
        let wf = workflow();
        let mut issue = open_issue();
        issue
            .set_field_value(&wf, "Labels", Some(vec!["x".to_string(), "y".to_string()].into()))
            .unwrap();
        issue
            .set_field_value(&wf, "Labels", Some(vec!["z".to_string()].into()))
            .unwrap();
        let labels: Vec<_> = issue
            .fields
            .iter()
            .filter(|r| r.name == "Labels")
            .filter_map(|r| r.value.as_deref())
            .collect();
        assert_eq!(labels, vec!["z"]);
    }

    #[test]
    fn null_value_stores_placeholder_row() {
        let wf = workflow();
        let mut issue = open_issue();
        issue.set_field_value(&wf, "Severity", None).unwrap();

        assert_eq!(issue.fields.len(), 1);
        assert_eq!(issue.fields[0].value, None);
        assert_eq!(issue.fields[0].field_type, FieldType::Choice);
        let effective = issue.effective_fields(&wf);
        assert!(effective.get("Severity").unwrap().values.is_empty());
        assert_eq!(issue.field_value(&wf, "Severity"), None);
    }

    #[test]
    fn unknown_field_is_rejected_and_rows_kept() {
        let wf = workflow();
        let mut issue = open_issue();
        issue.fields.push(row("Component", "ui", FieldType::Text));

        let err = issue
            .set_field_value(&wf, "Component", Some("api".into()))
            .unwrap_err();
        assert_eq!(err, FieldError::UnknownField("Component".into()));
        assert_eq!(issue.fields.len(), 1);
        assert_eq!(issue.fields[0].value.as_deref(), Some("ui"));
    }

    #[test]
    fn invalid_value_leaves_rows_untouched() {
        let wf = workflow();
        let mut issue = open_issue();
        issue
            .set_field_value(&wf, "Severity", Some("Low".into()))
            .unwrap();
        assert!(issue
            .set_field_value(&wf, "Severity", Some("Blocker".into()))
            .is_err());
        assert_eq!(
            issue.field_value(&wf, "Severity"),
            Some(FieldValue::Text("Low".into()))
        );
    }

    #[test]
    fn unreadable_value_reads_as_none() {
        let wf = workflow();
        let mut issue = open_issue();
        issue.fields.push(row("Estimate", "three", FieldType::Integer));
        assert!(issue.effective_fields(&wf).contains("Estimate"));
        assert_eq!(issue.field_value(&wf, "Estimate"), None);
    }

    #[test]
    fn excluded_fields_for_unknown_state_fails() {
        let wf = workflow();
        let shape = FieldShape::from_workflow(&wf);
        assert!(matches!(
            open_issue().excluded_fields(&wf, &shape, "Archived"),
            Err(ResolveError::UnknownState(s)) if s == "Archived"
        ));
    }

    #[test]
    fn excluded_fields_cover_inapplicable_and_empty() {
        let wf = workflow();
        let shape = FieldShape::from_workflow(&wf);
        let mut issue = open_issue();
        issue
            .set_field_value(&wf, "Severity", Some("High".into()))
            .unwrap();
        issue
            .set_field_value(&wf, "Estimate", Some(5_i64.into()))
            .unwrap();

        let excluded = issue.excluded_fields(&wf, &shape, "Open").unwrap();
        assert_eq!(
            excluded.into_iter().collect::<Vec<_>>(),
            vec!["labels", "resolution"]
        );
    }

    #[test]
    fn excluded_field_without_slot_fails() {
        let wf = workflow();
        let shape = FieldShape::new().slot("Severity", "severity");
        assert!(matches!(
            open_issue().excluded_fields(&wf, &shape, "Open"),
            Err(ResolveError::UnmappedField(_))
        ));
    }

    #[test]
    fn field_bean_roundtrip() {
        let wf = workflow();
        let shape = FieldShape::from_workflow(&wf);
        let mut issue = open_issue();
        issue
            .set_field_value(&wf, "Severity", Some("Medium".into()))
            .unwrap();
        issue
            .set_field_value(&wf, "Estimate", Some(8_i64.into()))
            .unwrap();

        let bean = issue.field_bean(&wf, &shape).unwrap();
        assert_eq!(bean.get("severity"), Some(&FieldValue::Text("Medium".into())));
        assert_eq!(bean.get("estimate"), Some(&FieldValue::Integer(8)));

        let mut copy = Issue::new("web", 2, "Copy", "Open");
        copy.set_field_bean(&wf, &bean, &shape, &["Severity", "Estimate"])
            .unwrap();
        assert_eq!(copy.effective_fields(&wf), issue.effective_fields(&wf));
    }

    #[test]
    fn field_bean_rejects_unmapped_field() {
        let wf = workflow();
        let mut issue = open_issue();
        issue
            .set_field_value(&wf, "Severity", Some("Medium".into()))
            .unwrap();
        let shape = FieldShape::new().slot("Labels", "labels");
        assert!(matches!(
            issue.field_bean(&wf, &shape),
            Err(ResolveError::UnmappedField(name)) if name == "Severity"
        ));
    }

    #[test]
    fn change_state_rejects_unknown_state() {
        let wf = workflow();
        let mut issue = open_issue();
        assert!(issue.change_state(&wf, "Archived", None).is_err());
        assert_eq!(issue.state, "Open");
        assert!(issue.last_activity.is_none());
    }

    #[test]
    fn property_names_are_snake_case() {
        assert_eq!(property_name("Fix Version"), "fix_version");
        assert_eq!(property_name("Due-Date"), "due_date");
        assert_eq!(property_name("Severity"), "severity");
    }

    #[test]
    fn ordinal_for_undeclared_field() {
        let issue = open_issue();
        assert_eq!(issue.field_ordinal(&workflow(), "Component", None), -1);
        assert_eq!(
            issue.field_ordinal(&workflow(), "Severity", Some(&"Medium".into())),
            1
        );
    }
}
