//! Storage backend for the ticketry issue tracker.
//!
//! Provides the [`IssueStore`] trait and a SQLite implementation ([`SqliteStore`]).

pub mod error;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience.
pub use error::StorageError;
pub use sqlite::SqliteStore;
pub use traits::IssueStore;

// ---------------------------------------------------------------------------
// IssueStore trait implementation for SqliteStore
// ---------------------------------------------------------------------------

use ticketry_core::issue::Issue;

use crate::error::Result;

impl IssueStore for SqliteStore {
    fn create_issue(&self, issue: &mut Issue) -> Result<()> {
        self.create_issue_impl(issue)
    }

    fn get_issue(&self, project: &str, number: i64) -> Result<Issue> {
        self.get_issue_impl(project, number)
    }

    fn get_issue_by_id(&self, id: i64) -> Result<Issue> {
        self.get_issue_by_id_impl(id)
    }

    fn list_issues(&self, project: &str, state: Option<&str>) -> Result<Vec<Issue>> {
        self.list_issues_impl(project, state)
    }

    fn save_issue(&self, issue: &mut Issue) -> Result<()> {
        self.save_issue_impl(issue)
    }

    fn delete_issue(&self, id: i64) -> Result<()> {
        self.delete_issue_impl(id)
    }

    fn issues_by_field(&self, project: &str, name: &str, value: &str) -> Result<Vec<Issue>> {
        self.issues_by_field_impl(project, name, value)
    }

    fn suggest_issues(&self, project: &str, term: &str, limit: usize) -> Result<Vec<Issue>> {
        self.suggest_issues_impl(project, term, limit)
    }

    fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.set_config_impl(key, value)
    }

    fn get_config(&self, key: &str) -> Result<String> {
        self.get_config_impl(key)
    }
}
