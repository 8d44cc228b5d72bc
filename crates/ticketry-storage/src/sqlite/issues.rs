//! Issue CRUD operations for [`SqliteStore`].

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use ticketry_core::issue::{Issue, LastActivity};

use crate::error::{Result, StorageError};
use crate::sqlite::fields::{insert_fields_on_conn, load_fields_on_conn, replace_fields_on_conn};
use crate::sqlite::store::SqliteStore;

// ---------------------------------------------------------------------------
// Column list
// ---------------------------------------------------------------------------

/// All issue columns read by [`scan_issue`].
pub(crate) const ISSUE_COLUMNS: &str = r#"
    id, version, project, number, state, title, description,
    milestone, submitter, submitter_name, submit_date,
    num_of_votes, num_of_comments,
    last_activity_description, last_activity_user, last_activity_date
"#;

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

/// Deserialises a row into an [`Issue`] without its field rows.
pub(crate) fn scan_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let submit_date_str: String = row.get("submit_date")?;
    let activity_description: Option<String> = row.get("last_activity_description")?;
    let activity_user: Option<String> = row.get("last_activity_user")?;
    let activity_date_str: Option<String> = row.get("last_activity_date")?;

    let last_activity = match (activity_description, activity_date_str) {
        (Some(description), Some(date)) => Some(LastActivity {
            description,
            user: activity_user,
            date: parse_datetime(&date),
        }),
        _ => None,
    };

    Ok(Issue {
        id: row.get("id")?,
        version: row.get("version")?,
        project: row.get("project")?,
        number: row.get("number")?,
        title: row.get("title")?,
        description: row.get("description")?,
        state: row.get("state")?,
        milestone: row.get("milestone")?,
        submitter: row.get("submitter")?,
        submitter_name: row.get("submitter_name")?,
        submit_date: parse_datetime(&submit_date_str),
        num_of_votes: row.get("num_of_votes")?,
        num_of_comments: row.get("num_of_comments")?,
        last_activity,
        fields: Vec::new(),
    })
}

/// Formats a timestamp for storage.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses a stored timestamp, accepting RFC 3339 and common SQLite formats.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>().unwrap_or_else(|_| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .map(|ndt| ndt.and_utc())
            .unwrap_or_else(|_| Utc::now())
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

/// Next free issue number within a project.
fn next_number_on_conn(conn: &Connection, project: &str) -> Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(number) FROM issues WHERE project = ?1",
        params![project],
        |row| row.get(0),
    )?;
    max.unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| StorageError::NumbersExhausted {
            project: project.to_string(),
        })
}

/// Case-folded title without whitespace, matched by [`suggest_issues_on_conn`].
fn title_search_key(issue: &Issue) -> String {
    issue.no_space_title().to_lowercase()
}

/// Inserts an issue and its field rows, assigning a number when needed.
pub(crate) fn insert_issue_on_conn(conn: &Connection, issue: &mut Issue) -> Result<()> {
    if issue.number <= 0 {
        issue.number = next_number_on_conn(conn, &issue.project)?;
    }
    let activity = issue.last_activity.as_ref();

    conn.execute(
        r#"INSERT INTO issues (
            version, project, number, number_str, state, title, no_space_title,
            description, milestone, submitter, submitter_name, submit_date,
            num_of_votes, num_of_comments,
            last_activity_description, last_activity_user, last_activity_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"#,
        params![
            issue.version,
            issue.project,
            issue.number,
            issue.number_str(),
            issue.state,
            issue.title,
            title_search_key(issue),
            issue.description,
            issue.milestone,
            issue.submitter,
            issue.submitter_name,
            format_datetime(&issue.submit_date),
            issue.num_of_votes,
            issue.num_of_comments,
            activity.map(|a| a.description.as_str()),
            activity.and_then(|a| a.user.as_deref()),
            activity.map(|a| format_datetime(&a.date)),
        ],
    )?;
    issue.id = conn.last_insert_rowid();
    insert_fields_on_conn(conn, issue.id, &issue.fields)?;

    debug!(id = issue.id, reference = %issue.reference(), "created issue");
    Ok(())
}

/// Loads the field rows for each issue in place.
fn attach_fields_on_conn(conn: &Connection, issues: &mut [Issue]) -> Result<()> {
    for issue in issues {
        issue.fields = load_fields_on_conn(conn, issue.id)?;
    }
    Ok(())
}

/// Runs a SELECT over issue columns and attaches field rows.
fn query_issues_on_conn(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Issue>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, scan_issue)?;
    let mut issues = Vec::new();
    for row in rows {
        issues.push(row?);
    }
    attach_fields_on_conn(conn, &mut issues)?;
    Ok(issues)
}

/// Retrieves a single issue by project and number.
pub(crate) fn get_issue_on_conn(conn: &Connection, project: &str, number: i64) -> Result<Issue> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project = ?1 AND number = ?2");
    let mut issue = conn
        .query_row(&sql, params![project, number], scan_issue)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StorageError::not_found("issue", format!("{project}#{number}"))
            }
            other => StorageError::Query(other),
        })?;
    issue.fields = load_fields_on_conn(conn, issue.id)?;
    Ok(issue)
}

/// Retrieves a single issue by storage id.
pub(crate) fn get_issue_by_id_on_conn(conn: &Connection, id: i64) -> Result<Issue> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
    let mut issue = conn
        .query_row(&sql, params![id], scan_issue)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("issue", id.to_string()),
            other => StorageError::Query(other),
        })?;
    issue.fields = load_fields_on_conn(conn, issue.id)?;
    Ok(issue)
}

/// Lists the issues of a project ordered by number.
pub(crate) fn list_issues_on_conn(
    conn: &Connection,
    project: &str,
    state: Option<&str>,
) -> Result<Vec<Issue>> {
    match state {
        Some(state) => {
            let sql = format!(
                "SELECT {ISSUE_COLUMNS} FROM issues WHERE project = ?1 AND state = ?2 ORDER BY number"
            );
            query_issues_on_conn(conn, &sql, params![project, state])
        }
        None => {
            let sql =
                format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project = ?1 ORDER BY number");
            query_issues_on_conn(conn, &sql, params![project])
        }
    }
}

/// Writes back an issue if its stored version still matches.
pub(crate) fn update_issue_on_conn(conn: &Connection, issue: &Issue) -> Result<()> {
    let stored: Option<i64> = conn
        .query_row(
            "SELECT version FROM issues WHERE id = ?1",
            params![issue.id],
            |row| row.get(0),
        )
        .optional()?;
    match stored {
        None => return Err(StorageError::not_found("issue", issue.id.to_string())),
        Some(actual) if actual != issue.version => {
            return Err(StorageError::Conflict {
                id: issue.id,
                expected: issue.version,
                actual,
            });
        }
        Some(_) => {}
    }

    let activity = issue.last_activity.as_ref();
    conn.execute(
        r#"UPDATE issues SET
            version = version + 1,
            project = ?2, number = ?3, number_str = ?4, state = ?5,
            title = ?6, no_space_title = ?7, description = ?8, milestone = ?9,
            submitter = ?10, submitter_name = ?11, submit_date = ?12,
            num_of_votes = ?13, num_of_comments = ?14,
            last_activity_description = ?15, last_activity_user = ?16,
            last_activity_date = ?17
        WHERE id = ?1"#,
        params![
            issue.id,
            issue.project,
            issue.number,
            issue.number_str(),
            issue.state,
            issue.title,
            title_search_key(issue),
            issue.description,
            issue.milestone,
            issue.submitter,
            issue.submitter_name,
            format_datetime(&issue.submit_date),
            issue.num_of_votes,
            issue.num_of_comments,
            activity.map(|a| a.description.as_str()),
            activity.and_then(|a| a.user.as_deref()),
            activity.map(|a| format_datetime(&a.date)),
        ],
    )?;
    replace_fields_on_conn(conn, issue.id, &issue.fields)
}

/// Deletes an issue; field rows go with it via the cascading foreign key.
pub(crate) fn delete_issue_on_conn(conn: &Connection, id: i64) -> Result<()> {
    let affected = conn.execute("DELETE FROM issues WHERE id = ?1", params![id])?;
    if affected == 0 {
        return Err(StorageError::not_found("issue", id.to_string()));
    }
    Ok(())
}

/// Issues of a project with a stored field row `name = value`.
pub(crate) fn issues_by_field_on_conn(
    conn: &Connection,
    project: &str,
    name: &str,
    value: &str,
) -> Result<Vec<Issue>> {
    let sql = format!(
        r#"SELECT {ISSUE_COLUMNS} FROM issues
           WHERE project = ?1 AND id IN (
               SELECT issue_id FROM issue_fields WHERE name = ?2 AND value = ?3
           )
           ORDER BY number"#
    );
    query_issues_on_conn(conn, &sql, params![project, name, value])
}

/// Issues whose number starts with `term` or whose whitespace-free title
/// contains it, case-insensitively. A leading `#` on `term` is ignored.
pub(crate) fn suggest_issues_on_conn(
    conn: &Connection,
    project: &str,
    term: &str,
    limit: usize,
) -> Result<Vec<Issue>> {
    let term: String = term
        .trim_start_matches('#')
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let sql = format!(
        r#"SELECT {ISSUE_COLUMNS} FROM issues
           WHERE project = ?1
             AND (substr(number_str, 1, length(?2)) = ?2
                  OR instr(no_space_title, ?2) > 0)
           ORDER BY number DESC
           LIMIT ?3"#
    );
    query_issues_on_conn(conn, &sql, params![project, term, limit])
}

// ---------------------------------------------------------------------------
// SqliteStore issue methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Creates an issue and its field rows in one transaction.
    pub fn create_issue_impl(&self, issue: &mut Issue) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        insert_issue_on_conn(&tx, issue)?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(())
    }

    /// Retrieves an issue by project and number.
    pub fn get_issue_impl(&self, project: &str, number: i64) -> Result<Issue> {
        let conn = self.lock_conn()?;
        get_issue_on_conn(&conn, project, number)
    }

    /// Retrieves an issue by storage id.
    pub fn get_issue_by_id_impl(&self, id: i64) -> Result<Issue> {
        let conn = self.lock_conn()?;
        get_issue_by_id_on_conn(&conn, id)
    }

    /// Lists the issues of a project.
    pub fn list_issues_impl(&self, project: &str, state: Option<&str>) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        list_issues_on_conn(&conn, project, state)
    }

    /// Saves an issue with an optimistic version check.
    pub fn save_issue_impl(&self, issue: &mut Issue) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        update_issue_on_conn(&tx, issue)?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        issue.version += 1;
        debug!(id = issue.id, version = issue.version, "saved issue");
        Ok(())
    }

    /// Deletes an issue.
    pub fn delete_issue_impl(&self, id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_issue_on_conn(&conn, id)
    }

    /// Finds issues by a stored field value.
    pub fn issues_by_field_impl(
        &self,
        project: &str,
        name: &str,
        value: &str,
    ) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        issues_by_field_on_conn(&conn, project, name, value)
    }

    /// Suggests issues matching a number prefix or title fragment.
    pub fn suggest_issues_impl(
        &self,
        project: &str,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        suggest_issues_on_conn(&conn, project, term, limit)
    }
}
