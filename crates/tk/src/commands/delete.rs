//! `tk delete` -- delete issues.

use anyhow::{Result, bail};
use tracing::info;

use ticketry_storage::IssueStore;

use crate::cli::DeleteArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tk delete` command.
pub fn run(ctx: &RuntimeContext, args: &DeleteArgs) -> Result<()> {
    let ws = ctx.open()?;

    let issues = args
        .numbers
        .iter()
        .map(|reference| ws.load_issue(reference))
        .collect::<Result<Vec<_>>>()?;

    if !args.force {
        let refs: Vec<String> = issues.iter().map(|i| i.reference()).collect();
        bail!(
            "deletion is destructive and cannot be undone.\n\
            Use --force to confirm deletion of {} issue(s): {}",
            refs.len(),
            refs.join(", ")
        );
    }

    let mut deleted = Vec::new();
    for issue in &issues {
        ws.store.delete_issue(issue.id)?;
        info!(issue = %issue.reference(), actor = %ws.actor, "issue deleted");
        deleted.push(issue.reference());
    }

    if ws.json {
        output_json(&serde_json::json!({ "deleted": deleted }));
    } else {
        for reference in &deleted {
            println!("Deleted {reference}");
        }
    }
    Ok(())
}
