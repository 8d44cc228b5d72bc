//! DDL statements for the SQLite schema.
//!
//! Timestamps are stored as TEXT in ISO 8601 format (SQLite has no native
//! datetime type). Custom field values are stored one row per value in
//! `issue_fields`; a row with a NULL value marks a field explicitly set to
//! nothing.

/// Current schema version, kept in `PRAGMA user_version`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// DDL statements run when a database is below the current schema version.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Issues table --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS issues (
        id                        INTEGER PRIMARY KEY AUTOINCREMENT,
        version                   INTEGER NOT NULL DEFAULT 0,
        project                   TEXT NOT NULL,
        number                    INTEGER NOT NULL,
        -- Decimal form of number, for prefix search
        number_str                TEXT NOT NULL,
        state                     TEXT NOT NULL,
        title                     TEXT NOT NULL,
        -- Title without whitespace, lowercased, for title search
        no_space_title            TEXT NOT NULL,
        description               TEXT,
        milestone                 TEXT,
        submitter                 TEXT,
        submitter_name            TEXT,
        submit_date               TEXT NOT NULL,
        num_of_votes              INTEGER NOT NULL DEFAULT 0,
        num_of_comments           INTEGER NOT NULL DEFAULT 0,
        -- Last activity
        last_activity_description TEXT,
        last_activity_user        TEXT,
        last_activity_date        TEXT,
        UNIQUE (project, number)
    )
    "#,
    // -- Indexes on issues ---------------------------------------------------
    "CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project)",
    "CREATE INDEX IF NOT EXISTS idx_issues_state ON issues(state)",
    "CREATE INDEX IF NOT EXISTS idx_issues_title ON issues(title)",
    "CREATE INDEX IF NOT EXISTS idx_issues_no_space_title ON issues(no_space_title)",
    "CREATE INDEX IF NOT EXISTS idx_issues_number_str ON issues(number_str)",
    "CREATE INDEX IF NOT EXISTS idx_issues_submit_date ON issues(submit_date)",
    "CREATE INDEX IF NOT EXISTS idx_issues_submitter ON issues(submitter)",
    "CREATE INDEX IF NOT EXISTS idx_issues_votes ON issues(num_of_votes)",
    "CREATE INDEX IF NOT EXISTS idx_issues_comments ON issues(num_of_comments)",
    "CREATE INDEX IF NOT EXISTS idx_issues_milestone ON issues(milestone)",
    "CREATE INDEX IF NOT EXISTS idx_issues_last_activity ON issues(last_activity_date)",
    // -- Issue field rows ----------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS issue_fields (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        issue_id INTEGER NOT NULL,
        name     TEXT NOT NULL,
        value    TEXT,
        type     TEXT NOT NULL,
        ordinal  INTEGER NOT NULL DEFAULT -1,
        FOREIGN KEY (issue_id) REFERENCES issues(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_issue_fields_issue ON issue_fields(issue_id, name)",
    "CREATE INDEX IF NOT EXISTS idx_issue_fields_value ON issue_fields(name, value)",
    "CREATE INDEX IF NOT EXISTS idx_issue_fields_ordinal ON issue_fields(name, ordinal)",
    // -- Config table --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS config (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Default configuration values inserted on first init.
pub const DEFAULT_CONFIG: &[(&str, &str)] = &[("default_project", "main")];
