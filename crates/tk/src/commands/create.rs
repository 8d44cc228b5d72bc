//! `tk create` -- create a new issue.

use anyhow::{Context, Result, bail};
use tracing::info;

use ticketry_core::issue::IssueBuilder;
use ticketry_core::validation::validate;
use ticketry_storage::IssueStore;

use crate::cli::CreateArgs;
use crate::commands::{group_assignments, parse_field_input};
use crate::context::RuntimeContext;
use crate::output::{IssueView, format_issue_compact, output_json};

/// Execute the `tk create` command.
pub fn run(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    let ws = ctx.open()?;

    let state = match &args.state {
        Some(state) => state.clone(),
        None => match ws.workflow.initial_state() {
            Some(state) => state.to_string(),
            None => bail!("the workflow declares no states"),
        },
    };

    let mut builder = IssueBuilder::new(&ws.project, &args.title, state).submitter(&ws.actor);
    if let Some(description) = &args.description {
        builder = builder.description(description);
    }
    if let Some(milestone) = &args.milestone {
        builder = builder.milestone(milestone);
    }
    let mut issue = builder.build();

    for (name, raw) in group_assignments(&args.fields)? {
        let value = parse_field_input(&ws.workflow, &name, &raw)?;
        issue.set_field_value(&ws.workflow, &name, value)?;
    }

    validate(&issue, &ws.workflow)?;
    ws.store
        .create_issue(&mut issue)
        .with_context(|| format!("failed to create issue in project '{}'", ws.project))?;
    info!(issue = %issue.reference(), actor = %ws.actor, "issue created");

    if ws.json {
        output_json(&IssueView::new(&issue, &ws.workflow));
    } else {
        println!("Created {}", format_issue_compact(&issue));
    }
    Ok(())
}
