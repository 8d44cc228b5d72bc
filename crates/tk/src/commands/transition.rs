//! `tk transition` -- move an issue to another workflow state.

use anyhow::{Result, bail};
use tracing::info;

use ticketry_core::resolver::{FieldBean, FieldShape};
use ticketry_core::validation::validate;

use crate::cli::TransitionArgs;
use crate::commands::fields::print_fields;
use crate::commands::{group_assignments, parse_field_input};
use crate::context::RuntimeContext;

/// Execute the `tk transition` command.
pub fn run(ctx: &RuntimeContext, args: &TransitionArgs) -> Result<()> {
    let ws = ctx.open()?;
    let mut issue = ws.load_issue(&args.number)?;
    let from = issue.state.clone();

    let shape = FieldShape::from_workflow(&ws.workflow);
    let mut bean = FieldBean::new();
    let mut names = Vec::new();
    for (name, raw) in group_assignments(&args.fields)? {
        let value = parse_field_input(&ws.workflow, &name, &raw)?;
        let Some(property) = shape.property_of(&name) else {
            bail!("field '{name}' is not declared by the workflow");
        };
        bean.set(property, value);
        names.push(name);
    }

    issue.change_state(&ws.workflow, &args.state, Some(&ws.actor))?;
    issue.set_field_bean(&ws.workflow, &bean, &shape, names.as_slice())?;
    validate(&issue, &ws.workflow)?;

    ws.save_issue(&mut issue)?;
    info!(issue = %issue.reference(), from = %from, to = %issue.state, "issue transitioned");

    if !ws.json {
        println!("{}: {} -> {}", issue.reference(), from, issue.state);
    }
    print_fields(&ws, &issue);
    Ok(())
}
