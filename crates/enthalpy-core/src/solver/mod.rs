//! Equilibrium solver seam. The condition builder talks to any
//! [`EquilibriumSolver`] backend; the crate ships [`GibbsScanSolver`], a
//! minimum-Gibbs-energy scan over the candidate phases.

mod gibbs;

pub use gibbs::GibbsScanSolver;

use crate::conditions::ConditionSpec;
use crate::domain::CalcResult;
use crate::tdb::Database;

/// Molar gas constant in J/(mol K).
pub const GAS_CONSTANT: f64 = 8.314_462_618;

/// Raw solver output: parallel temperature and molar-enthalpy buffers over
/// the swept condition grid, stored row-major against `shape`.
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumGrid {
    shape: Vec<usize>,
    temperatures: Vec<f64>,
    enthalpies: Vec<f64>,
}

impl EquilibriumGrid {
    pub fn new(shape: Vec<usize>, temperatures: Vec<f64>, enthalpies: Vec<f64>) -> Self {
        Self {
            shape,
            temperatures,
            enthalpies,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn expected_point_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn enthalpies(&self) -> &[f64] {
        &self.enthalpies
    }
}

/// Contract of the external equilibrium solver: given a database, the full
/// element list (including the vacancy symbol), candidate phases, and one
/// condition specification, produce temperature/enthalpy values over the
/// swept grid. Failures for infeasible inputs must surface as errors, never
/// as silently truncated grids.
pub trait EquilibriumSolver {
    fn equilibrium(
        &self,
        database: &Database,
        elements: &[String],
        phases: &[String],
        spec: &ConditionSpec,
    ) -> CalcResult<EquilibriumGrid>;
}

#[cfg(test)]
mod tests {
    use super::EquilibriumGrid;

    #[test]
    fn expected_point_count_is_the_shape_product() {
        let grid = EquilibriumGrid::new(vec![3, 2], vec![0.0; 6], vec![0.0; 6]);
        assert_eq!(grid.expected_point_count(), 6);
        assert_eq!(grid.shape(), [3, 2]);
    }
}
