pub mod errors;

pub use errors::{CalcError, CalcErrorCategory, CalcResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pseudo-element symbol for lattice vacancies. It participates in the solver
/// element list but never carries an explicit mole fraction.
pub const VACANCY: &str = "VA";

/// Ordered element list handed to the solver: the user-selected elements with
/// the vacancy symbol appended exactly once at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSet {
    symbols: Vec<String>,
}

impl ElementSet {
    /// Builds the solver element list from the user selection. The selection
    /// must be non-empty and free of duplicates; `VA` is appended if the user
    /// did not include it.
    pub fn from_selected<S: AsRef<str>>(selected: &[S]) -> CalcResult<Self> {
        if selected.is_empty() {
            return Err(CalcError::input_validation(
                "INPUT.ELEMENTS_EMPTY",
                "at least one element must be selected",
            ));
        }

        let mut symbols: Vec<String> = Vec::with_capacity(selected.len() + 1);
        for symbol in selected {
            let symbol = symbol.as_ref().trim();
            if symbol.is_empty() {
                return Err(CalcError::input_validation(
                    "INPUT.ELEMENT_SYMBOL",
                    "element symbols cannot be blank",
                ));
            }
            if symbols.iter().any(|existing| existing.as_str() == symbol) {
                return Err(CalcError::input_validation(
                    "INPUT.ELEMENT_DUPLICATE",
                    format!("element '{}' was selected more than once", symbol),
                ));
            }
            symbols.push(symbol.to_string());
        }

        if !symbols.iter().any(|symbol| symbol.as_str() == VACANCY) {
            symbols.push(VACANCY.to_string());
        }

        Ok(Self { symbols })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The selected elements without the vacancy pseudo-element, in order.
    pub fn without_vacancy(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .map(String::as_str)
            .filter(|symbol| *symbol != VACANCY)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|existing| existing.as_str() == symbol)
    }
}

/// One run's user-level parameters, as collected from the CLI flags, the
/// interactive prompts, or a batch run plan. Validation happens when this is
/// turned into a solver condition specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSet {
    pub elements: Vec<String>,
    #[serde(default)]
    pub fractions: BTreeMap<String, f64>,
    pub t_start: f64,
    pub t_end: f64,
    pub t_step: f64,
    #[serde(default = "default_pressure")]
    pub pressure: f64,
    /// Requested equilibrium phases; empty means "use the database default
    /// pair" (the first two phases in file order).
    #[serde(default)]
    pub phases: Vec<String>,
}

fn default_pressure() -> f64 {
    101_325.0
}

/// Ordered, non-empty phase names passed to the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSelection {
    names: Vec<String>,
}

impl PhaseSelection {
    pub fn new(names: Vec<String>) -> CalcResult<Self> {
        if names.is_empty() {
            return Err(CalcError::input_validation(
                "INPUT.PHASES_EMPTY",
                "at least one equilibrium phase must be selected",
            ));
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// One output row: 1-based serial number, temperature in K, molar enthalpy
/// in J/mol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumRecord {
    pub serial: usize,
    pub temperature: f64,
    pub enthalpy: f64,
}

/// Ordered sequence of equilibrium records, possibly the concatenation of
/// several runs within one session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    records: Vec<EquilibriumRecord>,
}

impl ResultTable {
    pub fn from_records(records: Vec<EquilibriumRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EquilibriumRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConditionSet, ElementSet, PhaseSelection, VACANCY};

    #[test]
    fn element_set_appends_vacancy_exactly_once() {
        let set = ElementSet::from_selected(&["FE", "NI"]).expect("selection should be valid");
        assert_eq!(set.symbols(), ["FE", "NI", "VA"]);

        let explicit =
            ElementSet::from_selected(&["FE", "NI", VACANCY]).expect("selection should be valid");
        assert_eq!(explicit.symbols(), ["FE", "NI", "VA"]);
    }

    #[test]
    fn element_set_rejects_empty_and_duplicate_selections() {
        let empty: [&str; 0] = [];
        let error = ElementSet::from_selected(&empty).expect_err("empty selection should fail");
        assert_eq!(error.placeholder(), "INPUT.ELEMENTS_EMPTY");

        let error =
            ElementSet::from_selected(&["FE", "FE"]).expect_err("duplicate selection should fail");
        assert_eq!(error.placeholder(), "INPUT.ELEMENT_DUPLICATE");
    }

    #[test]
    fn without_vacancy_preserves_selection_order() {
        let set = ElementSet::from_selected(&["CU", "AL"]).expect("selection should be valid");
        let selected: Vec<&str> = set.without_vacancy().collect();
        assert_eq!(selected, ["CU", "AL"]);
    }

    #[test]
    fn phase_selection_rejects_empty_list() {
        let error = PhaseSelection::new(Vec::new()).expect_err("empty phases should fail");
        assert_eq!(error.placeholder(), "INPUT.PHASES_EMPTY");
    }

    #[test]
    fn condition_set_deserializes_with_defaults() {
        let set: ConditionSet = serde_json::from_str(
            r#"{ "elements": ["CU"], "t_start": 300.0, "t_end": 400.0, "t_step": 10.0 }"#,
        )
        .expect("condition set should deserialize");
        assert_eq!(set.pressure, 101_325.0);
        assert!(set.fractions.is_empty());
        assert!(set.phases.is_empty());
    }
}
