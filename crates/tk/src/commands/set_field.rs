//! `tk set-field` -- set or clear one custom field of an issue.

use anyhow::Result;
use tracing::info;

use crate::cli::SetFieldArgs;
use crate::commands::fields::print_fields;
use crate::commands::parse_field_input;
use crate::context::RuntimeContext;

/// Execute the `tk set-field` command.
pub fn run(ctx: &RuntimeContext, args: &SetFieldArgs) -> Result<()> {
    let ws = ctx.open()?;
    let mut issue = ws.load_issue(&args.number)?;

    let value = parse_field_input(&ws.workflow, &args.name, &args.values)?;
    let cleared = value.is_none();
    issue.set_field_value(&ws.workflow, &args.name, value)?;
    issue.touch(format!("changed \"{}\"", args.name), Some(&ws.actor));

    ws.save_issue(&mut issue)?;
    info!(issue = %issue.reference(), field = %args.name, cleared, "field updated");

    if !ws.workflow.applicable_fields(&issue.state).contains(args.name.as_str()) && !ws.json {
        eprintln!(
            "Note: '{}' does not apply in state '{}'; the value is kept but not shown.",
            args.name, issue.state
        );
    }
    print_fields(&ws, &issue);
    Ok(())
}
