//! Run-history database.
//!
//! Stack budgets are proven per build; the interesting question over time is
//! whether a function's bound is creeping toward its budget. This module
//! wraps a SQLite database storing one row per analysis run plus the
//! per-function bounds it produced, so successive builds can be compared.

use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::model::WorstCase;
use crate::report::{ReportRow, StackReport};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Error type for history database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    ///
    /// This is intentionally explicit so callers can surface a clear message
    /// instead of silently clobbering or misinterpreting data.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// One persisted analysis run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunRecord {
    /// Work directory the artifacts were discovered under.
    pub work_dir: String,
    /// Content hash over the artifact set, for comparing runs across builds.
    pub artifacts_hash: Option<String>,
    pub unit_count: i64,
    pub diagnostic_count: i64,
    pub started_at: String,
    pub finished_at: String,
}

/// One function's bound inside a persisted run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundRecord {
    pub translation_unit: String,
    pub function: String,
    /// `"unbounded"`, `"incomplete"`, or the byte count as text.
    pub worst_case: String,
    /// Unresolved callee names, comma-separated; empty when the bound is firm.
    pub unresolved: String,
}

impl BoundRecord {
    /// Flatten a report row into its storable shape.
    pub fn from_report_row(row: &ReportRow) -> Self {
        let worst_case = match row.worst_case {
            WorstCase::Unbounded => "unbounded".to_string(),
            WorstCase::Bounded(bytes) => bytes.to_string(),
            WorstCase::Unknown => "incomplete".to_string(),
        };
        Self {
            translation_unit: row.translation_unit.clone(),
            function: row.function.clone(),
            worst_case,
            unresolved: row.unresolved.join(","),
        }
    }
}

/// SQLite-backed run history.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible
/// for opening/creating the DB file, applying schema migrations, and
/// providing small, testable helpers for recording and querying runs.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (or create) a history database at the given path and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert a run record and return its row id.
    pub fn insert_run(&self, record: &RunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO analysis_runs (work_dir, artifacts_hash, unit_count, diagnostic_count, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.work_dir,
                record.artifacts_hash,
                record.unit_count,
                record.diagnostic_count,
                record.started_at,
                record.finished_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Persist every row of a report under the given run.
    pub fn insert_report(&self, run_id: i64, report: &StackReport) -> DbResult<()> {
        for row in &report.rows {
            let bound = BoundRecord::from_report_row(row);
            self.conn.execute(
                r#"
                INSERT INTO function_bounds (run_id, translation_unit, function, worst_case, unresolved)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    run_id,
                    bound.translation_unit,
                    bound.function,
                    bound.worst_case,
                    bound.unresolved
                ],
            )?;
        }
        Ok(())
    }

    /// List all runs with their row ids (ordered by id).
    pub fn list_runs(&self) -> DbResult<Vec<(i64, RunRecord)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, work_dir, artifacts_hash, unit_count, diagnostic_count, started_at, finished_at
            FROM analysis_runs
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get(0)?,
                RunRecord {
                    work_dir: row.get(1)?,
                    artifacts_hash: row.get(2)?,
                    unit_count: row.get(3)?,
                    diagnostic_count: row.get(4)?,
                    started_at: row.get(5)?,
                    finished_at: row.get(6)?,
                },
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// List the bounds recorded for one run (ordered by id, i.e. report order).
    pub fn list_bounds(&self, run_id: i64) -> DbResult<Vec<BoundRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT translation_unit, function, worst_case, unresolved
            FROM function_bounds
            WHERE run_id = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(BoundRecord {
                translation_unit: row.get(0)?,
                function: row.get(1)?,
                worst_case: row.get(2)?,
                unresolved: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: initial schema (analysis_runs, function_bounds)
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS analysis_runs (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                work_dir         TEXT NOT NULL,
                artifacts_hash   TEXT,
                unit_count       INTEGER NOT NULL,
                diagnostic_count INTEGER NOT NULL,
                started_at       TEXT NOT NULL,
                finished_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS function_bounds (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id           INTEGER NOT NULL REFERENCES analysis_runs(id),
                translation_unit TEXT NOT NULL,
                function         TEXT NOT NULL,
                worst_case       TEXT NOT NULL,
                unresolved       TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
