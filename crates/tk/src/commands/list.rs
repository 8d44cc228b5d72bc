//! `tk list` -- list issues with optional filters.

use anyhow::{Result, bail};
use tracing::debug;

use ticketry_storage::IssueStore;

use crate::cli::ListArgs;
use crate::context::{RuntimeContext, parse_assignment};
use crate::output::{IssueView, format_issue_row, output_json, output_table};

/// Execute the `tk list` command.
pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let ws = ctx.open()?;

    let mut issues = if let Some(term) = &args.search {
        let limit = if args.limit == 0 { usize::MAX } else { args.limit };
        ws.store.suggest_issues(&ws.project, term, limit)?
    } else if let Some(field) = &args.field {
        let (name, value) = parse_assignment(field)?;
        if ws.workflow.field_spec(name).is_none() {
            bail!("field '{name}' is not declared by the workflow");
        }
        ws.store.issues_by_field(&ws.project, name, value)?
    } else {
        ws.store.list_issues(&ws.project, args.state.as_deref())?
    };

    if args.limit > 0 {
        issues.truncate(args.limit);
    }
    debug!(count = issues.len(), "issues listed");

    if ws.json {
        let views: Vec<IssueView<'_>> = issues
            .iter()
            .map(|issue| IssueView::new(issue, &ws.workflow))
            .collect();
        output_json(&views);
        return Ok(());
    }

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = issues.iter().map(format_issue_row).collect();
    output_table(&["#", "State", "Title", "Milestone"], &rows);
    Ok(())
}
