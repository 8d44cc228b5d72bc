//! `tk init` -- initialize a tracker in the current directory, or in the
//! directory given by `--dir`.

use std::env;
use std::fs;

use anyhow::{Context, Result, bail};
use tracing::info;

use ticketry_config::config::{CONFIG_FILE, TicketryConfig, parse_config, save_config};
use ticketry_config::ticketry_dir::ensure_ticketry_dir;
use ticketry_config::workflow::{WORKFLOW_FILE, write_default_workflow};
use ticketry_storage::{IssueStore, SqliteStore};

use crate::cli::InitArgs;
use crate::context::{RuntimeContext, db_path};
use crate::output::output_json;

/// Default gitignore content for the `.ticketry` directory.
const GITIGNORE_CONTENT: &str = r#"# ticketry database files
*.db
*.db-journal
*.db-wal
*.db-shm
"#;

/// Execute the `tk init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let dir = match &ctx.dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create tracker directory {}", dir.display()))?;
            dir.clone()
        }
        None => {
            let cwd = env::current_dir().context("failed to get current directory")?;
            ensure_ticketry_dir(&cwd).with_context(|| {
                format!("failed to create tracker directory under {}", cwd.display())
            })?
        }
    };

    let config_path = dir.join(CONFIG_FILE);
    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        parse_config(&content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?
    } else {
        TicketryConfig::default()
    };

    let db = db_path(&dir, &config);
    if !args.force && db.exists() {
        bail!(
            "Found existing database in {}\n\n\
            This tracker is already initialized.\n\
            Use --force to re-initialize (existing issues are kept).",
            db.display()
        );
    }

    if let Some(project) = &ctx.project {
        config.project = project.clone();
    }
    save_config(&dir, &config)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    let wrote_workflow = write_default_workflow(&dir)
        .with_context(|| format!("failed to write {}", dir.join(WORKFLOW_FILE).display()))?;

    let gitignore_path = dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE_CONTENT).with_context(|| {
            format!("failed to create .gitignore: {}", gitignore_path.display())
        })?;
    }

    let store = SqliteStore::open(&db)
        .with_context(|| format!("failed to create database: {}", db.display()))?;
    store.set_config("default_project", &config.project)?;
    info!(dir = %dir.display(), project = %config.project, "tracker initialized");

    if ctx.json {
        output_json(&serde_json::json!({
            "dir": dir.display().to_string(),
            "database": db.display().to_string(),
            "project": config.project,
            "workflow_created": wrote_workflow,
        }));
    } else if !args.quiet {
        println!();
        println!("tk initialized successfully!");
        println!();
        println!("  Directory: {}", dir.display());
        println!("  Database:  {}", db.display());
        println!("  Project:   {}", config.project);
        if wrote_workflow {
            println!("  Workflow:  {} (default)", dir.join(WORKFLOW_FILE).display());
        }
        println!();
        println!("Run `tk create \"My first issue\"` to get started.");
        println!();
    }

    Ok(())
}
