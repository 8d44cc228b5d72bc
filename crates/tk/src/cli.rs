//! Clap CLI definitions for the `tk` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// tk -- issue tracker with workflow-driven custom fields.
#[derive(Parser, Debug)]
#[command(
    name = "tk",
    about = "Issue tracker with workflow-driven custom fields",
    long_about = "Track issues whose custom fields are declared per project by a workflow. \
                  Each workflow state decides which fields apply.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Tracker directory (default: $TICKETRY_DIR, or .ticketry found upwards).
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Project to operate on (default: `project` from config.yaml).
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Actor name recorded on changes (default: $TK_ACTOR, config, git user.name, $USER).
    #[arg(long, global = true, env = "TK_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a tracker in the current directory.
    Init(InitArgs),

    /// Create a new issue.
    #[command(alias = "new")]
    Create(CreateArgs),

    /// Show issue details with its effective fields.
    #[command(alias = "view")]
    Show(ShowArgs),

    /// List issues of the project.
    List(ListArgs),

    /// Set (or clear) a custom field of an issue.
    SetField(SetFieldArgs),

    /// Show the effective custom fields of an issue.
    Fields(FieldsArgs),

    /// Move an issue to another workflow state.
    Transition(TransitionArgs),

    /// Show which fields would be left out of a form for a state.
    Excluded(ExcludedArgs),

    /// Delete issues.
    Delete(DeleteArgs),

    /// Show or check the project workflow.
    Workflow(WorkflowArgs),
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Arguments for `tk init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Suppress output.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Re-initialize even if a database already exists.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Arguments for `tk create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Issue title.
    pub title: String,

    /// Issue description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Initial state (default: the workflow's first state).
    #[arg(short = 's', long)]
    pub state: Option<String>,

    /// Milestone name.
    #[arg(short = 'm', long)]
    pub milestone: Option<String>,

    /// Custom field values as NAME=VALUE (repeat NAME for multiple values).
    #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
}

// ---------------------------------------------------------------------------
// Show
// ---------------------------------------------------------------------------

/// Arguments for `tk show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue numbers to display.
    #[arg(required = true)]
    pub numbers: Vec<String>,
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Arguments for `tk list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only issues in this state.
    #[arg(short = 's', long)]
    pub state: Option<String>,

    /// Only issues with a stored field value, as NAME=VALUE.
    #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
    pub field: Option<String>,

    /// Number prefix or title fragment to search for.
    #[arg(long, conflicts_with_all = ["state", "field"])]
    pub search: Option<String>,

    /// Limit results (0 for unlimited).
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Arguments for `tk set-field`.
#[derive(Args, Debug)]
pub struct SetFieldArgs {
    /// Issue number.
    pub number: String,

    /// Field name as declared by the workflow.
    pub name: String,

    /// Values to store; none clears the field.
    pub values: Vec<String>,
}

/// Arguments for `tk fields`.
#[derive(Args, Debug)]
pub struct FieldsArgs {
    /// Issue number.
    pub number: String,
}

// ---------------------------------------------------------------------------
// Transition / Excluded
// ---------------------------------------------------------------------------

/// Arguments for `tk transition`.
#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Issue number.
    pub number: String,

    /// Target state.
    pub state: String,

    /// Field values to set along with the transition, as NAME=VALUE.
    #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
}

/// Arguments for `tk excluded`.
#[derive(Args, Debug)]
pub struct ExcludedArgs {
    /// Issue number.
    pub number: String,

    /// State to compute the form for (default: the issue's state).
    pub state: Option<String>,
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Arguments for `tk delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Issue numbers to delete.
    #[arg(required = true)]
    pub numbers: Vec<String>,

    /// Confirm the deletion; it cannot be undone.
    #[arg(short = 'f', long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Arguments for `tk workflow`.
#[derive(Args, Debug)]
pub struct WorkflowArgs {
    /// Only validate the workflow file and report the result.
    #[arg(long)]
    pub check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_fields() {
        let cli = Cli::parse_from([
            "tk", "create", "Crash", "-f", "Labels=ui", "-f", "Labels=api", "--json",
        ]);
        assert!(cli.global.json);
        match cli.command {
            Some(Commands::Create(args)) => {
                assert_eq!(args.title, "Crash");
                assert_eq!(args.fields, vec!["Labels=ui", "Labels=api"]);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn set_field_without_values_clears() {
        let cli = Cli::parse_from(["tk", "set-field", "3", "Severity"]);
        match cli.command {
            Some(Commands::SetField(args)) => {
                assert_eq!(args.number, "3");
                assert!(args.values.is_empty());
            }
            other => panic!("expected set-field, got {other:?}"),
        }
    }
}
