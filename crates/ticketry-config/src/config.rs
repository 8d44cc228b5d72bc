//! Configuration types and loading for ticketry.
//!
//! The main entry point is [`TicketryConfig`], the contents of
//! `.ticketry/config.yaml`. Values are layered with `figment`: built-in
//! defaults, then the YAML file, then `TICKETRY_*` environment variables.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use ticketry_core::workflow::WorkflowError;

/// File name of the tracker configuration inside `.ticketry/`.
pub const CONFIG_FILE: &str = "config.yaml";

/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "TICKETRY_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    Read(#[from] std::io::Error),

    /// A configuration file contained invalid YAML.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Layered configuration could not be extracted.
    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// The `.ticketry/` directory was not found.
    #[error("no .ticketry directory found (run 'tk init' first)")]
    DirNotFound,

    /// The workflow file is internally inconsistent.
    #[error("invalid workflow: {0}")]
    InvalidWorkflow(#[from] WorkflowError),
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The tracker configuration, corresponding to `.ticketry/config.yaml`.
///
/// All fields use `serde` defaults so a partially specified file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketryConfig {
    /// Project used when a command does not name one.
    #[serde(default = "default_project")]
    pub project: String,

    /// Actor identity override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Output JSON instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    /// Database path override, relative to `.ticketry/` unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
}

impl Default for TicketryConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            actor: None,
            json: false,
            db: None,
        }
    }
}

fn default_project() -> String {
    "main".to_string()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The layered configuration sources for a `.ticketry/` directory.
pub fn figment(ticketry_dir: &Path) -> Figment {
    Figment::from(Serialized::defaults(TicketryConfig::default()))
        .merge(Yaml::file(ticketry_dir.join(CONFIG_FILE)))
        .merge(env_overrides())
}

/// Defaults plus environment overrides, for when no tracker directory is
/// known.
pub fn env_figment() -> Figment {
    Figment::from(Serialized::defaults(TicketryConfig::default())).merge(env_overrides())
}

fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).only(&["project", "actor", "json", "db"])
}

/// Load configuration for the given `.ticketry/` directory.
///
/// A missing `config.yaml` yields the defaults, still subject to
/// environment overrides.
pub fn load_config(ticketry_dir: &Path) -> Result<TicketryConfig> {
    extract(figment(ticketry_dir))
}

/// Load configuration from the environment alone.
pub fn load_env_config() -> Result<TicketryConfig> {
    extract(env_figment())
}

/// Extracts a [`TicketryConfig`] from arbitrary layered sources.
pub fn extract(figment: Figment) -> Result<TicketryConfig> {
    let config: TicketryConfig = figment.extract().map_err(Box::new)?;
    debug!(project = %config.project, "configuration loaded");
    Ok(config)
}

/// Parses the YAML file contents alone, without defaults layering or
/// environment overrides. An empty document yields the defaults.
pub fn parse_config(yaml: &str) -> Result<TicketryConfig> {
    if yaml.trim().is_empty() {
        return Ok(TicketryConfig::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Save configuration to `config.yaml` inside the given `.ticketry/`
/// directory, creating the directory if needed.
pub fn save_config(ticketry_dir: &Path, config: &TicketryConfig) -> Result<()> {
    std::fs::create_dir_all(ticketry_dir)?;

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(ticketry_dir.join(CONFIG_FILE), yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
