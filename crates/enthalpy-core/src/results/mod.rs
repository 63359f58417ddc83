//! Normalization of raw solver grids into result tables, and aggregation of
//! tables across the condition sets of one session.

use crate::domain::{CalcError, CalcResult, EquilibriumRecord, ResultTable};
use crate::solver::EquilibriumGrid;

/// Flattens the solver grid into a table: temperatures and enthalpies are
/// paired positionally and numbered with a contiguous 1-based serial. A
/// length mismatch between the buffers, or against the declared grid shape,
/// is a solver contract violation and fails fast.
pub fn normalize(grid: &EquilibriumGrid) -> CalcResult<ResultTable> {
    let temperatures = grid.temperatures();
    let enthalpies = grid.enthalpies();

    if temperatures.len() != enthalpies.len() {
        return Err(CalcError::data_shape(
            "RUN.RESULT_SHAPE",
            format!(
                "solver returned {} temperatures but {} enthalpies",
                temperatures.len(),
                enthalpies.len()
            ),
        ));
    }
    if temperatures.len() != grid.expected_point_count() {
        return Err(CalcError::data_shape(
            "RUN.RESULT_SHAPE",
            format!(
                "solver grid shape {:?} promises {} points but carries {}",
                grid.shape(),
                grid.expected_point_count(),
                temperatures.len()
            ),
        ));
    }

    let records = temperatures
        .iter()
        .zip(enthalpies)
        .enumerate()
        .map(|(index, (temperature, enthalpy))| EquilibriumRecord {
            serial: index + 1,
            temperature: *temperature,
            enthalpy: *enthalpy,
        })
        .collect();

    Ok(ResultTable::from_records(records))
}

/// Concatenates tables end-to-end in source order. Serial numbers are
/// re-assigned globally so the combined table carries one contiguous
/// 1-based sequence.
pub fn aggregate(tables: &[ResultTable]) -> ResultTable {
    let mut records = Vec::with_capacity(tables.iter().map(ResultTable::len).sum());
    for table in tables {
        for record in table.records() {
            records.push(EquilibriumRecord {
                serial: records.len() + 1,
                temperature: record.temperature,
                enthalpy: record.enthalpy,
            });
        }
    }
    ResultTable::from_records(records)
}
