//! `tk workflow` -- show or check the project workflow.

use anyhow::{Context, Result};

use ticketry_config::workflow::{WORKFLOW_FILE, load_workflow};

use crate::cli::WorkflowArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tk workflow` command.
pub fn run(ctx: &RuntimeContext, args: &WorkflowArgs) -> Result<()> {
    if args.check {
        return check(ctx);
    }

    let ws = ctx.open()?;
    if ws.json {
        output_json(&ws.workflow);
        return Ok(());
    }

    let path = ws.dir.join(WORKFLOW_FILE);
    if path.exists() {
        println!("Workflow: {}", path.display());
    } else {
        println!("Workflow: built-in default");
    }
    println!();
    println!("STATES");
    for state in &ws.workflow.states {
        println!("  {}: {}", state.name, state.fields.join(", "));
    }
    println!();
    println!("FIELDS");
    for spec in ws.workflow.field_specs() {
        let mut line = format!("  {} ({})", spec.name, spec.field_type);
        if !spec.choices.is_empty() {
            line.push_str(&format!(" [{}]", spec.choices.join(", ")));
        }
        if spec.allow_multiple {
            line.push_str(" multiple");
        }
        println!("{line}");
    }
    Ok(())
}

/// Validates the workflow file without opening the database.
fn check(ctx: &RuntimeContext) -> Result<()> {
    let dir = ctx.resolve_dir()?;
    let path = dir.join(WORKFLOW_FILE);
    let workflow =
        load_workflow(&dir).with_context(|| format!("invalid workflow: {}", path.display()))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "valid": true,
            "states": workflow.states.len(),
            "fields": workflow.fields.len(),
        }));
    } else if path.exists() {
        println!(
            "{}: ok ({} states, {} fields)",
            path.display(),
            workflow.states.len(),
            workflow.fields.len()
        );
    } else {
        println!("{} not found; the default workflow is used", path.display());
    }
    Ok(())
}
