//! Discovery and management of the `.ticketry/` directory.
//!
//! The `.ticketry/` directory holds a tracker's configuration, workflow and
//! database. This module finds it by walking up the directory tree and
//! creates it when initializing a new tracker.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

use tracing::debug;

/// The name of the ticketry metadata directory.
pub const TICKETRY_DIR_NAME: &str = ".ticketry";

/// The name of the environment variable that can override the directory.
const TICKETRY_DIR_ENV: &str = "TICKETRY_DIR";

/// Walk up the directory tree from `start` looking for a `.ticketry/`
/// directory.
///
/// The `TICKETRY_DIR` environment variable is checked first (highest
/// priority). Returns `None` if the filesystem root is reached without
/// finding one.
///
/// # Examples
///
/// ```no_run
/// use ticketry_config::ticketry_dir::find_ticketry_dir;
/// use std::path::Path;
///
/// if let Some(dir) = find_ticketry_dir(Path::new(".")) {
///     println!("Found tracker at {}", dir.display());
/// }
/// ```
pub fn find_ticketry_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(TICKETRY_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            debug!(path = %env_path.display(), "using {TICKETRY_DIR_ENV}");
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(TICKETRY_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Like [`find_ticketry_dir`], but fails with
/// [`ConfigError::DirNotFound`] when nothing is found.
pub fn find_ticketry_dir_or_error(start: &Path) -> Result<PathBuf, ConfigError> {
    find_ticketry_dir(start).ok_or(ConfigError::DirNotFound)
}

/// Ensure a `.ticketry/` directory exists at the given path.
///
/// If `path` itself is not called `.ticketry`, a `.ticketry/` subdirectory
/// is created under it. Returns the path to the `.ticketry/` directory.
pub fn ensure_ticketry_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let dir = if path.ends_with(TICKETRY_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(TICKETRY_DIR_NAME)
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
