//! `tk show` -- display issue details.

use anyhow::Result;

use crate::cli::ShowArgs;
use crate::context::RuntimeContext;
use crate::output::{IssueView, format_issue_detail, output_json};

/// Execute the `tk show` command.
pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    let ws = ctx.open()?;

    let issues = args
        .numbers
        .iter()
        .map(|reference| ws.load_issue(reference))
        .collect::<Result<Vec<_>>>()?;

    if ws.json {
        let views: Vec<IssueView<'_>> = issues
            .iter()
            .map(|issue| IssueView::new(issue, &ws.workflow))
            .collect();
        output_json(&views);
    } else {
        for (i, issue) in issues.iter().enumerate() {
            if i > 0 {
                println!("\n{}\n", "-".repeat(60));
            }
            println!("{}", format_issue_detail(issue, &ws.workflow));
        }
    }
    Ok(())
}
