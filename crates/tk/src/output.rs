//! Output formatting helpers for the `tk` CLI.
//!
//! Provides JSON output, table formatting, and human-readable issue display
//! in both compact (one-liner) and detailed (multi-line) formats.

use std::io::{self, Write};

use serde::Serialize;

use ticketry_core::field::{EffectiveField, EffectiveFields};
use ticketry_core::issue::{
    COMMENTS, Issue, LastActivity, MILESTONE, STATE, SUBMITTER, VOTES,
};
use ticketry_core::workflow::WorkflowSpec;

/// JSON view of an issue: built-in fields plus its effective custom fields.
#[derive(Serialize)]
pub struct IssueView<'a> {
    pub id: i64,
    pub reference: String,
    pub project: &'a str,
    pub number: i64,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub state: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter: Option<&'a str>,
    pub submit_date: String,
    pub update_date: String,
    pub votes: u32,
    pub comments: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<&'a LastActivity>,
    pub version: i64,
    pub fields: EffectiveFields,
}

impl<'a> IssueView<'a> {
    pub fn new(issue: &'a Issue, workflow: &WorkflowSpec) -> Self {
        Self {
            id: issue.id,
            reference: issue.reference(),
            project: &issue.project,
            number: issue.number,
            title: &issue.title,
            description: issue.description.as_deref(),
            state: &issue.state,
            milestone: issue.milestone_name(),
            submitter: issue
                .submitter
                .as_deref()
                .or(issue.submitter_name.as_deref()),
            submit_date: issue.submit_date.to_rfc3339(),
            update_date: issue.update_date().to_rfc3339(),
            votes: issue.num_of_votes,
            comments: issue.num_of_comments,
            last_activity: issue.last_activity.as_ref(),
            version: issue.version,
            fields: issue.effective_fields(workflow),
        }
    }
}

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = handle.write_all(render_table(headers, rows).as_bytes());
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = render_row(&widths, &header);
    out.push_str(&render_row(&widths, &separator));
    for row in rows {
        out.push_str(&render_row(&widths, row));
    }
    out
}

fn render_row(widths: &[usize], cells: &[String]) -> String {
    let line = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| match widths.get(i) {
            Some(width) => format!("{:<width$}", cell, width = width),
            None => cell.clone(),
        })
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", line.trim_end())
}

/// Format an issue as a compact one-line string.
///
/// Format: `{project}#{number} [{state}] {title}`
pub fn format_issue_compact(issue: &Issue) -> String {
    format!("{} [{}] {}", issue.reference(), issue.state, issue.title)
}

/// Format one effective field as `Name: v1, v2`.
pub fn format_field(field: &EffectiveField) -> String {
    if field.values.is_empty() {
        format!("{}: (none)", field.name)
    } else {
        format!("{}: {}", field.name, field.values.join(", "))
    }
}

/// Format an issue in detailed multi-line view, including the effective
/// custom fields for its current state.
pub fn format_issue_detail(issue: &Issue, workflow: &WorkflowSpec) -> String {
    let mut lines = Vec::new();

    lines.push(format!("{} {}", issue.reference(), issue.title));
    for name in [STATE, MILESTONE, SUBMITTER] {
        if let Some(value) = issue.builtin_value(name) {
            lines.push(format!("{name}: {value}"));
        }
    }
    lines.push(format!(
        "Submitted: {}  Updated: {}",
        issue.submit_date.format("%Y-%m-%d %H:%M"),
        issue.update_date().format("%Y-%m-%d %H:%M")
    ));
    if let Some(activity) = &issue.last_activity {
        lines.push(format!(
            "Last activity: {}{}",
            activity.description,
            activity
                .user
                .as_deref()
                .map(|u| format!(" ({u})"))
                .unwrap_or_default()
        ));
    }
    for name in [VOTES, COMMENTS] {
        if let Some(value) = issue.builtin_value(name) {
            lines.push(format!("{name}: {value}"));
        }
    }

    let effective = issue.effective_fields(workflow);
    if !effective.is_empty() {
        lines.push(String::new());
        lines.push("FIELDS".to_string());
        for field in &effective {
            lines.push(format!("  {}", format_field(field)));
        }
    }

    if let Some(description) = &issue.description {
        lines.push(String::new());
        lines.push("DESCRIPTION".to_string());
        lines.push(description.clone());
    }

    lines.join("\n")
}

/// Format an issue as a row for list output.
///
/// Returns a vector of column values suitable for [`output_table`].
pub fn format_issue_row(issue: &Issue) -> Vec<String> {
    vec![
        issue.number.to_string(),
        issue.state.clone(),
        issue.title.clone(),
        issue.milestone.clone().unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketry_core::issue::IssueBuilder;
    use ticketry_core::workflow::{FieldSpec, StateSpec};

    fn workflow() -> WorkflowSpec {
        WorkflowSpec::new(
            vec![StateSpec::new("Open", ["Labels"])],
            vec![FieldSpec::choice("Labels", ["api", "ui"]).multiple()],
        )
    }

    #[test]
    fn compact_format_basic() {
        let issue = IssueBuilder::new("web", "Fix the bug", "Open").number(4).build();
        assert_eq!(format_issue_compact(&issue), "web#4 [Open] Fix the bug");
    }

    #[test]
    fn detail_format_includes_fields() {
        let wf = workflow();
        let mut issue = IssueBuilder::new("web", "Fix the bug", "Open")
            .number(4)
            .description("A detailed description")
            .submitter("alice")
            .build();
        issue
            .set_field_value(&wf, "Labels", Some(vec!["ui".to_string(), "api".to_string()].into()))
            .unwrap();

        let formatted = format_issue_detail(&issue, &wf);
        assert!(formatted.contains("DESCRIPTION"));
        assert!(formatted.contains("A detailed description"));
        assert!(formatted.contains("Submitter: alice"));
        assert!(formatted.contains("Votes: 0"));
        assert!(formatted.contains("Labels: api, ui"));
    }

    #[test]
    fn view_carries_effective_fields() {
        let wf = workflow();
        let mut issue = IssueBuilder::new("web", "Fix", "Open").number(2).build();
        issue
            .set_field_value(&wf, "Labels", Some(vec!["ui".to_string()].into()))
            .unwrap();

        let json = serde_json::to_value(IssueView::new(&issue, &wf)).unwrap();
        assert_eq!(json["reference"], "web#2");
        assert_eq!(json["fields"][0]["name"], "Labels");
        assert_eq!(json["fields"][0]["values"][0], "ui");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn table_columns_align() {
        let rows = vec![
            vec!["1".into(), "Open".into(), "Crash".into()],
            vec!["12".into(), "Closed".into(), "Typo".into()],
        ];
        let table = render_table(&["#", "State", "Title"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "#   State   Title");
        assert_eq!(lines[1], "--  ------  -----");
        assert_eq!(lines[2], "1   Open    Crash");
        assert_eq!(lines[3], "12  Closed  Typo");
    }
}
