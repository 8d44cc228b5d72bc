//! Loading and saving the project workflow (`.ticketry/workflow.yaml`).

use std::path::Path;

use tracing::{debug, warn};

use ticketry_core::workflow::WorkflowSpec;

use crate::config::Result;

/// File name of the workflow inside `.ticketry/`.
pub const WORKFLOW_FILE: &str = "workflow.yaml";

/// Workflow written by `tk init`.
pub const DEFAULT_WORKFLOW_YAML: &str = r#"# States an issue moves through, and the custom fields shown in each.
# The first state is the initial state of new issues.
states:
  - name: Open
    fields: [Severity, Labels, Estimate, Due]
  - name: In Progress
    fields: [Severity, Labels, Estimate, Due]
  - name: Closed
    fields: [Severity, Labels, Resolution]

fields:
  - name: Severity
    type: Choice
    choices: [Critical, High, Medium, Low]
  - name: Labels
    type: Choice
    choices: [bug, feature, docs, ui, api]
    allow-multiple: true
  - name: Estimate
    type: Integer
    description: Estimated effort in hours
  - name: Due
    type: Date
  - name: Resolution
    type: Text
"#;

/// Parses and validates a workflow from YAML text.
pub fn parse_workflow(yaml: &str) -> Result<WorkflowSpec> {
    let workflow: WorkflowSpec = serde_yaml::from_str(yaml)?;
    workflow.validate()?;
    Ok(workflow)
}

/// The built-in default workflow.
pub fn default_workflow() -> Result<WorkflowSpec> {
    parse_workflow(DEFAULT_WORKFLOW_YAML)
}

/// Loads the workflow from the given `.ticketry/` directory.
///
/// Falls back to the default workflow when the file does not exist.
pub fn load_workflow(ticketry_dir: &Path) -> Result<WorkflowSpec> {
    let path = ticketry_dir.join(WORKFLOW_FILE);
    if !path.exists() {
        warn!(path = %path.display(), "workflow file missing, using default workflow");
        return default_workflow();
    }

    let content = std::fs::read_to_string(&path)?;
    let workflow = parse_workflow(&content)?;
    debug!(
        states = workflow.states.len(),
        fields = workflow.fields.len(),
        "workflow loaded"
    );
    Ok(workflow)
}

/// Writes the default workflow into `.ticketry/` unless one already exists.
///
/// Returns `true` if the file was written.
pub fn write_default_workflow(ticketry_dir: &Path) -> Result<bool> {
    let path = ticketry_dir.join(WORKFLOW_FILE);
    if path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(ticketry_dir)?;
    std::fs::write(path, DEFAULT_WORKFLOW_YAML)?;
    Ok(true)
}
