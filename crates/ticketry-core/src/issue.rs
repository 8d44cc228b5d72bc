//! Issue struct -- the central domain model for the ticketry system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::field::FieldRow;

// ---------------------------------------------------------------------------
// Built-in fields
// ---------------------------------------------------------------------------

pub const NUMBER: &str = "Number";
pub const STATE: &str = "State";
pub const TITLE: &str = "Title";
pub const DESCRIPTION: &str = "Description";
pub const SUBMITTER: &str = "Submitter";
pub const SUBMIT_DATE: &str = "Submit Date";
pub const UPDATE_DATE: &str = "Update Date";
pub const VOTES: &str = "Votes";
pub const COMMENTS: &str = "Comments";
pub const MILESTONE: &str = "Milestone";

/// Built-in issue fields as `(display name, property)` pairs, in display order.
pub const BUILTIN_FIELDS: &[(&str, &str)] = &[
    (NUMBER, "number"),
    (STATE, "state"),
    (TITLE, "title"),
    (DESCRIPTION, "description"),
    (SUBMITTER, "submitter"),
    (SUBMIT_DATE, "submit_date"),
    (UPDATE_DATE, "last_activity.date"),
    (VOTES, "num_of_votes"),
    (COMMENTS, "num_of_comments"),
    (MILESTONE, "milestone"),
];

/// Returns the property behind a built-in field display name.
pub fn builtin_field(display_name: &str) -> Option<&'static str> {
    BUILTIN_FIELDS
        .iter()
        .find(|(name, _)| *name == display_name)
        .map(|(_, property)| *property)
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// The most recent change made to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastActivity {
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    pub date: DateTime<Utc>,
}

/// A ticket within a project.
///
/// `number` is unique within `project`. `state` must name a state of the
/// project's workflow; custom field values live in `fields` as raw rows and
/// are interpreted through the workflow (see [`crate::resolver`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    // ===== Identification =====
    /// Storage row id; 0 until the issue has been persisted.
    #[serde(default)]
    pub id: i64,

    /// Optimistic-lock version, bumped by every successful save.
    #[serde(default)]
    pub version: i64,

    pub project: String,

    #[serde(default)]
    pub number: i64,

    // ===== Content =====
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // ===== Workflow =====
    pub state: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,

    // ===== Submission =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter: Option<String>,

    /// Display name kept for submitters that no longer exist as users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter_name: Option<String>,

    #[serde(default = "Utc::now")]
    pub submit_date: DateTime<Utc>,

    // ===== Counters =====
    #[serde(default)]
    pub num_of_votes: u32,

    #[serde(default)]
    pub num_of_comments: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<LastActivity>,

    // ===== Custom fields =====
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldRow>,
}

impl Issue {
    pub fn new(
        project: impl Into<String>,
        number: i64,
        title: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            version: 0,
            project: project.into(),
            number,
            title: title.into(),
            description: None,
            state: state.into(),
            milestone: None,
            submitter: None,
            submitter_name: None,
            submit_date: Utc::now(),
            num_of_votes: 0,
            num_of_comments: 0,
            last_activity: None,
            fields: Vec::new(),
        }
    }

    /// `project#number`, the form used to reference issues in text.
    pub fn reference(&self) -> String {
        format!("{}#{}", self.project, self.number)
    }

    /// Decimal form of the number, stored for prefix search.
    pub fn number_str(&self) -> String {
        self.number.to_string()
    }

    /// The title with all whitespace removed, stored for title search.
    pub fn no_space_title(&self) -> String {
        self.title.chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn milestone_name(&self) -> Option<&str> {
        self.milestone.as_deref()
    }

    /// Date of the last change, falling back to the submit date.
    pub fn update_date(&self) -> DateTime<Utc> {
        self.last_activity
            .as_ref()
            .map_or(self.submit_date, |a| a.date)
    }

    /// Records a change as the issue's last activity.
    pub fn touch(&mut self, description: impl Into<String>, user: Option<&str>) {
        self.last_activity = Some(LastActivity {
            description: description.into(),
            user: user.map(str::to_owned),
            date: Utc::now(),
        });
    }

    /// Renders a built-in field by display name.
    pub fn builtin_value(&self, display_name: &str) -> Option<String> {
        match display_name {
            NUMBER => Some(self.number_str()),
            STATE => Some(self.state.clone()),
            TITLE => Some(self.title.clone()),
            DESCRIPTION => self.description.clone(),
            SUBMITTER => self
                .submitter
                .clone()
                .or_else(|| self.submitter_name.clone()),
            SUBMIT_DATE => Some(self.submit_date.to_rfc3339()),
            UPDATE_DATE => Some(self.update_date().to_rfc3339()),
            VOTES => Some(self.num_of_votes.to_string()),
            COMMENTS => Some(self.num_of_comments.to_string()),
            MILESTONE => self.milestone.clone(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Issue`].
#[derive(Debug, Clone)]
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    /// Starts a builder for an issue of `project` titled `title` in `state`.
    pub fn new(project: impl Into<String>, title: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            issue: Issue::new(project, 0, title, state),
        }
    }

    pub fn number(mut self, number: i64) -> Self {
        self.issue.number = number;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.issue.description = Some(description.into());
        self
    }

    pub fn milestone(mut self, milestone: impl Into<String>) -> Self {
        self.issue.milestone = Some(milestone.into());
        self
    }

    pub fn submitter(mut self, submitter: impl Into<String>) -> Self {
        self.issue.submitter = Some(submitter.into());
        self
    }

    pub fn submitter_name(mut self, name: impl Into<String>) -> Self {
        self.issue.submitter_name = Some(name.into());
        self
    }

    pub fn submit_date(mut self, t: DateTime<Utc>) -> Self {
        self.issue.submit_date = t;
        self
    }

    pub fn votes(mut self, votes: u32) -> Self {
        self.issue.num_of_votes = votes;
        self
    }

    pub fn comments(mut self, comments: u32) -> Self {
        self.issue.num_of_comments = comments;
        self
    }

    pub fn field_row(mut self, row: FieldRow) -> Self {
        self.issue.fields.push(row);
        self
    }

    /// Consumes the builder and returns the constructed [`Issue`].
    pub fn build(self) -> Issue {
        self.issue
    }
}
