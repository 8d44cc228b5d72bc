//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds what every command handler needs before a
//! tracker is opened: the global flags. [`Workspace`]
//! is the opened tracker: configuration, workflow and store.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::debug;

use ticketry_config::config::{TicketryConfig, load_config, load_env_config};
use ticketry_config::ticketry_dir::find_ticketry_dir_or_error;
use ticketry_config::workflow::load_workflow;
use ticketry_core::issue::Issue;
use ticketry_core::workflow::WorkflowSpec;
use ticketry_storage::{IssueStore, SqliteStore};

use crate::cli::GlobalArgs;

/// File name of the SQLite database inside `.ticketry/`.
pub const DB_FILE: &str = "ticketry.db";

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit tracker directory from `--dir`.
    pub dir: Option<PathBuf>,

    /// Explicit project from `--project`.
    pub project: Option<String>,

    /// Actor from `--actor` / `TK_ACTOR`, if given.
    pub actor_flag: Option<String>,

    /// Whether `--json` was given.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            dir: global.dir.clone(),
            project: global.project.clone(),
            actor_flag: global.actor.clone(),
            json: global.json,
            verbose: global.verbose,
        }
    }

    /// Locates the `.ticketry` directory: `--dir`, then `TICKETRY_DIR`, then
    /// upwards from the current directory.
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            if !dir.is_dir() {
                bail!("tracker directory {} does not exist", dir.display());
            }
            return Ok(dir.clone());
        }
        let cwd = env::current_dir().context("failed to get current directory")?;
        Ok(find_ticketry_dir_or_error(&cwd)?)
    }

    /// Whether output, errors included, should be JSON: `--json`, or `json`
    /// from the tracker config or `TICKETRY_JSON`.
    pub fn json_output(&self) -> bool {
        if self.json {
            return true;
        }
        let config = match self.resolve_dir() {
            Ok(dir) => load_config(&dir),
            Err(_) => load_env_config(),
        };
        config.map(|c| c.json).unwrap_or(false)
    }

    /// Opens the tracker: configuration, workflow and database.
    pub fn open(&self) -> Result<Workspace> {
        let dir = self.resolve_dir()?;
        Workspace::open(self, dir)
    }
}

/// An opened tracker.
pub struct Workspace {
    /// The `.ticketry` directory.
    pub dir: PathBuf,

    /// The project workflow.
    pub workflow: WorkflowSpec,

    /// Issue storage.
    pub store: SqliteStore,

    /// Project commands operate on.
    pub project: String,

    /// Actor recorded on changes.
    pub actor: String,

    /// Whether to produce JSON output.
    pub json: bool,
}

impl Workspace {
    fn open(ctx: &RuntimeContext, dir: PathBuf) -> Result<Self> {
        let config = load_config(&dir)
            .with_context(|| format!("failed to load configuration from {}", dir.display()))?;
        let workflow = load_workflow(&dir)
            .with_context(|| format!("failed to load workflow from {}", dir.display()))?;

        let db_path = db_path(&dir, &config);
        if !db_path.exists() {
            bail!(
                "no database found at {}\nHint: run 'tk init' to create one",
                db_path.display()
            );
        }
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("failed to open database: {}", db_path.display()))?;

        let project = ctx
            .project
            .clone()
            .unwrap_or_else(|| config.project.clone());
        let actor = resolve_actor(ctx.actor_flag.as_deref(), config.actor.as_deref());
        let json = ctx.json || config.json;
        debug!(dir = %dir.display(), project = %project, actor = %actor, "workspace opened");

        Ok(Self {
            dir,
            workflow,
            store,
            project,
            actor,
            json,
        })
    }

    /// Loads an issue from a reference such as `12`, `#12` or `web#12`.
    pub fn load_issue(&self, reference: &str) -> Result<Issue> {
        let (project, number) = parse_reference(reference, &self.project)?;
        match self.store.get_issue(&project, number) {
            Ok(issue) => Ok(issue),
            Err(e) if e.is_not_found() => bail!("issue {project}#{number} not found"),
            Err(e) => Err(e).with_context(|| format!("failed to load issue {project}#{number}")),
        }
    }

    /// Saves an issue loaded earlier by this command.
    pub fn save_issue(&self, issue: &mut Issue) -> Result<()> {
        match self.store.save_issue(issue) {
            Ok(()) => Ok(()),
            Err(e) if e.is_conflict() => bail!(
                "issue {} was changed by another command since it was loaded; run it again",
                issue.reference()
            ),
            Err(e) => Err(e).with_context(|| format!("failed to save issue {}", issue.reference())),
        }
    }
}

/// Path of the database for a tracker directory, honoring `db` from config.
pub fn db_path(dir: &Path, config: &TicketryConfig) -> PathBuf {
    match &config.db {
        Some(db) if Path::new(db).is_absolute() => PathBuf::from(db),
        Some(db) => dir.join(db),
        None => dir.join(DB_FILE),
    }
}

/// Splits an issue reference into project and number.
pub fn parse_reference(reference: &str, default_project: &str) -> Result<(String, i64)> {
    let (project, number) = match reference.rsplit_once('#') {
        Some(("", number)) => (default_project, number),
        Some((project, number)) => (project, number),
        None => (default_project, reference),
    };
    let number: i64 = number
        .trim()
        .parse()
        .with_context(|| format!("invalid issue reference '{reference}'"))?;
    if number <= 0 {
        bail!("invalid issue reference '{reference}': numbers start at 1");
    }
    Ok((project.to_string(), number))
}

/// Splits a `NAME=VALUE` argument.
pub fn parse_assignment(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("expected NAME=VALUE, got '{arg}'"),
    }
}

/// Resolves the actor name using the priority chain.
///
/// Priority: explicit flag (or `TK_ACTOR`) > config `actor` > git config
/// user.name > USER env > "unknown".
fn resolve_actor(flag_value: Option<&str>, config_value: Option<&str>) -> String {
    // 1. Explicit flag value
    if let Some(actor) = flag_value {
        if !actor.is_empty() {
            return actor.to_string();
        }
    }

    // 2. Config file / TICKETRY_ACTOR
    if let Some(actor) = config_value {
        if !actor.is_empty() {
            return actor.to_string();
        }
    }

    // 3. git config user.name
    if let Ok(output) = Command::new("git").args(["config", "user.name"]).output() {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    // 4. USER env (Unix) or USERNAME env (Windows)
    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        if !user.is_empty() {
            return user;
        }
    }

    // 5. Fallback
    "unknown".to_string()
}
