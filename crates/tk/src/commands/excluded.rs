//! `tk excluded` -- fields a form for a state should leave out.

use anyhow::Result;

use ticketry_core::resolver::FieldShape;

use crate::cli::ExcludedArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tk excluded` command.
pub fn run(ctx: &RuntimeContext, args: &ExcludedArgs) -> Result<()> {
    let ws = ctx.open()?;
    let issue = ws.load_issue(&args.number)?;
    let state = args.state.as_deref().unwrap_or(&issue.state);

    let shape = FieldShape::from_workflow(&ws.workflow);
    let excluded = issue.excluded_fields(&ws.workflow, &shape, state)?;

    if ws.json {
        output_json(&serde_json::json!({
            "issue": issue.reference(),
            "state": state,
            "excluded": excluded,
        }));
        return Ok(());
    }

    println!("{} in state '{}':", issue.reference(), state);
    for slot in shape.slots() {
        let mark = if excluded.contains(&slot.property) { "excluded" } else { "shown" };
        println!("  {:<8}  {} ({})", mark, slot.display_name, slot.property);
    }
    Ok(())
}
