//! Multi-run session state.
//!
//! The original workflow accumulated condition sets in an unbounded
//! interactive loop and wrote uploads to a temp file it never deleted. The
//! session models that flow explicitly: an ordered list of submitted
//! condition sets with their normalized tables, a documented cap, and a
//! scoped temp file (when the database arrives as bytes) that is removed
//! when the session drops. Nothing persists across sessions.

pub mod plan;

use crate::conditions::{ConditionSpec, resolve_phases};
use crate::domain::{CalcError, CalcResult, ConditionSet, ElementSet, ResultTable};
use crate::results::{aggregate, normalize};
use crate::solver::EquilibriumSolver;
use crate::tdb::Database;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Upper bound on condition sets per session. The source loop had no bound;
/// a cap keeps one session's memory and solve time finite.
pub const MAX_CONDITION_SETS: usize = 32;

/// One submitted condition set together with its normalized result.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRun {
    pub set: ConditionSet,
    pub table: ResultTable,
}

pub struct Session {
    database: Database,
    // Keeps an uploaded database on disk for the session lifetime; the file
    // is deleted when the session drops, on every exit path.
    _upload: Option<NamedTempFile>,
    runs: Vec<CompletedRun>,
}

impl Session {
    pub fn from_database_path(path: &Path) -> CalcResult<Self> {
        Ok(Self {
            database: Database::load(path)?,
            _upload: None,
            runs: Vec::new(),
        })
    }

    /// Accepts raw uploaded bytes: they are written to a scoped temp file,
    /// parsed, and kept for the session so later reads stay valid.
    pub fn from_uploaded_bytes(bytes: &[u8]) -> CalcResult<Self> {
        let mut upload = NamedTempFile::new().map_err(|source| {
            CalcError::io_system(
                "IO.UPLOAD_TEMP",
                format!("failed to create temporary database file: {}", source),
            )
        })?;
        upload.write_all(bytes).map_err(|source| {
            CalcError::io_system(
                "IO.UPLOAD_TEMP",
                format!("failed to write uploaded database bytes: {}", source),
            )
        })?;

        let source = std::str::from_utf8(bytes).map_err(|_| {
            CalcError::database_parse(
                "TDB.ENCODING",
                "uploaded database is not valid UTF-8 text",
            )
        })?;
        Ok(Self {
            database: Database::parse_str(source)?,
            _upload: Some(upload),
            runs: Vec::new(),
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn runs(&self) -> &[CompletedRun] {
        &self.runs
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Builds, solves, and records one condition set. On failure nothing is
    /// appended; earlier completed runs stay in the session.
    pub fn submit(
        &mut self,
        set: ConditionSet,
        solver: &dyn EquilibriumSolver,
    ) -> CalcResult<&ResultTable> {
        if self.runs.len() >= MAX_CONDITION_SETS {
            return Err(CalcError::input_validation(
                "INPUT.SESSION_LIMIT",
                format!(
                    "session already holds {} condition sets (the maximum)",
                    MAX_CONDITION_SETS
                ),
            ));
        }

        let spec = ConditionSpec::from_set(&set)?;
        let elements = ElementSet::from_selected(&set.elements)?;
        let phases = resolve_phases(&self.database, &set.phases)?;

        let grid = solver.equilibrium(&self.database, elements.symbols(), phases.names(), &spec)?;
        let table = normalize(&grid)?;

        self.runs.push(CompletedRun { set, table });
        Ok(&self.runs.last().expect("run was just pushed").table)
    }

    /// The combined table across all completed runs, in submission order
    /// with globally renumbered serials.
    pub fn combined(&self) -> ResultTable {
        let tables: Vec<ResultTable> =
            self.runs.iter().map(|run| run.table.clone()).collect();
        aggregate(&tables)
    }

    /// Discards all accumulated runs, as on session end.
    pub fn clear(&mut self) {
        self.runs.clear();
    }
}
