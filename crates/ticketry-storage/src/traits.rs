//! The [`IssueStore`] trait -- the public API for issue persistence.
//!
//! Consumers depend on this trait rather than on [`SqliteStore`](crate::SqliteStore)
//! so that alternative backends can be substituted.

use ticketry_core::issue::Issue;

use crate::error::Result;

/// Persistence of issues together with their raw custom field rows.
///
/// Loaded issues always carry their field rows in insertion order. Saving
/// an issue replaces all of its stored rows with the ones on the struct.
pub trait IssueStore: Send + Sync {
    // -- Issue CRUD ----------------------------------------------------------

    /// Inserts a new issue.
    ///
    /// If `issue.number` is not positive, the next free number of the
    /// project is assigned. The storage id is written back into `issue.id`.
    fn create_issue(&self, issue: &mut Issue) -> Result<()>;

    /// Retrieves an issue by project and number.
    fn get_issue(&self, project: &str, number: i64) -> Result<Issue>;

    /// Retrieves an issue by storage id.
    fn get_issue_by_id(&self, id: i64) -> Result<Issue>;

    /// Lists the issues of a project by number, optionally only those in
    /// `state`.
    fn list_issues(&self, project: &str, state: Option<&str>) -> Result<Vec<Issue>>;

    /// Writes back a loaded issue.
    ///
    /// Fails with [`StorageError::Conflict`](crate::StorageError::Conflict)
    /// if the stored version differs from `issue.version`. On success the
    /// version on `issue` is bumped.
    fn save_issue(&self, issue: &mut Issue) -> Result<()>;

    /// Permanently deletes an issue and its field rows.
    fn delete_issue(&self, id: i64) -> Result<()>;

    // -- Lookups -------------------------------------------------------------

    /// Issues of a project having a stored row `name = value`.
    fn issues_by_field(&self, project: &str, name: &str, value: &str) -> Result<Vec<Issue>>;

    /// Issues whose number starts with `term` or whose title contains it,
    /// ignoring whitespace. At most `limit` results.
    fn suggest_issues(&self, project: &str, term: &str, limit: usize) -> Result<Vec<Issue>>;

    // -- Configuration -------------------------------------------------------

    /// Sets a configuration key-value pair.
    fn set_config(&self, key: &str, value: &str) -> Result<()>;

    /// Gets a configuration value by key.
    fn get_config(&self, key: &str) -> Result<String>;
}
