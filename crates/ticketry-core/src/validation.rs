//! Issue validation rules.

use crate::issue::Issue;
use crate::workflow::WorkflowSpec;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Error type for validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("title is required")]
    TitleRequired,

    #[error("title must be 255 characters or less (got {0})")]
    TitleTooLong(usize),

    #[error("project is required")]
    ProjectRequired,

    #[error("state '{0}' is not defined by the workflow")]
    InvalidState(String),
}

/// Validates an issue against its project's workflow.
pub fn validate(issue: &Issue, workflow: &WorkflowSpec) -> Result<(), ValidationError> {
    // Title required.
    if issue.title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    let title_len = issue.title.chars().count();
    if title_len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong(title_len));
    }
    if issue.project.is_empty() {
        return Err(ValidationError::ProjectRequired);
    }
    // State must be one of the workflow's states.
    if !workflow.has_state(&issue.state) {
        return Err(ValidationError::InvalidState(issue.state.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::FieldType;
    use crate::field::FieldRow;
    use crate::issue::IssueBuilder;
    use crate::workflow::{FieldSpec, StateSpec};

    fn workflow() -> WorkflowSpec {
        WorkflowSpec::new(
            vec![StateSpec::new("Open", ["Severity"]), StateSpec::new("Closed", ["Severity"])],
            vec![FieldSpec::choice("Severity", ["High", "Low"])],
        )
    }

    #[test]
    fn valid_issue_passes() {
        let issue = IssueBuilder::new("web", "Valid issue", "Open").build();
        assert!(validate(&issue, &workflow()).is_ok());
    }

    #[test]
    fn empty_title_fails() {
        let issue = IssueBuilder::new("web", "  ", "Open").build();
        match validate(&issue, &workflow()) {
            Err(ValidationError::TitleRequired) => {}
            other => panic!("expected TitleRequired, got {:?}", other),
        }
    }

    #[test]
    fn long_title_fails() {
        let title = "x".repeat(256);
        let issue = IssueBuilder::new("web", title, "Open").build();
        match validate(&issue, &workflow()) {
            Err(ValidationError::TitleTooLong(n)) => assert_eq!(n, 256),
            other => panic!("expected TitleTooLong, got {:?}", other),
        }
    }

    #[test]
    fn unknown_state_fails() {
        let issue = IssueBuilder::new("web", "Test", "Triage").build();
        assert!(matches!(
            validate(&issue, &workflow()),
            Err(ValidationError::InvalidState(s)) if s == "Triage"
        ));
    }

    #[test]
    fn missing_project_fails() {
        let issue = IssueBuilder::new("", "Test", "Open").build();
        assert!(matches!(
            validate(&issue, &workflow()),
            Err(ValidationError::ProjectRequired)
        ));
    }

    #[test]
    fn rows_of_removed_fields_are_tolerated() {
        let wf = workflow();
        let issue = IssueBuilder::new("web", "Test", "Open")
            .field_row(FieldRow::new("Component", Some("ui".into()), FieldType::Text))
            .build();
        assert!(validate(&issue, &wf).is_ok());
        assert!(issue.effective_fields(&wf).is_empty());
    }
}
