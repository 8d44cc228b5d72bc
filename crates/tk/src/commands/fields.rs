//! `tk fields` -- show the effective custom fields of an issue.

use anyhow::Result;
use serde::Serialize;

use ticketry_core::field::FieldValue;
use ticketry_core::issue::Issue;

use crate::cli::FieldsArgs;
use crate::context::{RuntimeContext, Workspace};
use crate::output::{format_field, output_json};

#[derive(Serialize)]
struct FieldEntry<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: &'a str,
    values: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<FieldValue>,
    ordinal: i64,
}

/// Execute the `tk fields` command.
pub fn run(ctx: &RuntimeContext, args: &FieldsArgs) -> Result<()> {
    let ws = ctx.open()?;
    let issue = ws.load_issue(&args.number)?;
    print_fields(&ws, &issue);
    Ok(())
}

/// Prints the effective fields of `issue`, with typed values in JSON mode.
pub(crate) fn print_fields(ws: &Workspace, issue: &Issue) {
    let effective = issue.effective_fields(&ws.workflow);

    if ws.json {
        let entries: Vec<FieldEntry<'_>> = effective
            .iter()
            .map(|field| {
                let value = issue.field_value(&ws.workflow, &field.name);
                FieldEntry {
                    name: &field.name,
                    field_type: field.field_type.as_str(),
                    values: &field.values,
                    ordinal: issue.field_ordinal(&ws.workflow, &field.name, value.as_ref()),
                    value,
                }
            })
            .collect();
        output_json(&serde_json::json!({
            "issue": issue.reference(),
            "state": issue.state,
            "fields": entries,
        }));
        return;
    }

    println!("{} [{}]", issue.reference(), issue.state);
    if effective.is_empty() {
        println!("  (no fields)");
    }
    for field in &effective {
        println!("  {}", format_field(field));
    }
}
