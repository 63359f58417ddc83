//! Batch run plans: a JSON document naming a database and an ordered list of
//! condition sets, executed as one session.

use crate::domain::{CalcError, CalcResult, ConditionSet};
use crate::session::MAX_CONDITION_SETS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A deserialized batch plan. `database` is resolved relative to the
/// caller's working directory, not the plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunPlan {
    pub database: PathBuf,
    pub sets: Vec<ConditionSet>,
}

impl RunPlan {
    pub fn load(path: &Path) -> CalcResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            CalcError::io_system(
                "IO.PLAN_READ",
                format!("failed to read run plan '{}': {}", path.display(), source),
            )
        })?;
        let plan: RunPlan = serde_json::from_str(&source).map_err(|source| {
            CalcError::input_validation(
                "INPUT.PLAN_FORMAT",
                format!("run plan '{}' is not valid: {}", path.display(), source),
            )
        })?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> CalcResult<()> {
        if self.sets.is_empty() {
            return Err(CalcError::input_validation(
                "INPUT.PLAN_EMPTY",
                "run plan contains no condition sets",
            ));
        }
        if self.sets.len() > MAX_CONDITION_SETS {
            return Err(CalcError::input_validation(
                "INPUT.SESSION_LIMIT",
                format!(
                    "run plan contains {} condition sets, more than the maximum of {}",
                    self.sets.len(),
                    MAX_CONDITION_SETS
                ),
            ));
        }
        Ok(())
    }
}

/// Summary of one executed plan entry, reported after a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub index: usize,
    pub elements: Vec<String>,
    pub reference: String,
    pub points: usize,
}
