//! Thermodynamic database (TDB) model: elements, phases, functions, and
//! Gibbs-energy parameters, parsed from the uploaded text format.

mod expr;
mod parser;

pub use expr::{Dual, Expr, PiecewiseFunction, Segment, parse_expression};

use crate::domain::{CalcError, CalcResult, VACANCY};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A phase declaration: name, sublattice site counts, and the constituent
/// species per sublattice (filled in by the CONSTITUENT statement).
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub name: String,
    pub site_counts: Vec<f64>,
    pub constituents: Vec<Vec<String>>,
}

/// One PARAMETER statement. `symbol` is the parameter kind (`G` for
/// end-member Gibbs energy, `L` for interaction energy; other kinds are
/// stored but not consumed by the built-in solver).
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub symbol: String,
    pub phase: String,
    pub constituents: Vec<Vec<String>>,
    pub order: u32,
    pub function: PiecewiseFunction,
}

impl Parameter {
    /// The distinct non-vacancy species this parameter involves.
    fn real_species(&self) -> Vec<&str> {
        let mut species: Vec<&str> = Vec::new();
        for sublattice in &self.constituents {
            for name in sublattice {
                if name.as_str() != VACANCY && !species.contains(&name.as_str()) {
                    species.push(name);
                }
            }
        }
        species
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    elements: Vec<String>,
    functions: BTreeMap<String, PiecewiseFunction>,
    phases: Vec<Phase>,
    parameters: Vec<Parameter>,
}

impl Database {
    fn empty() -> Self {
        Self {
            elements: Vec::new(),
            functions: BTreeMap::new(),
            phases: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn parse_str(source: &str) -> CalcResult<Self> {
        parser::parse_database(source)
    }

    pub fn load(path: &Path) -> CalcResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            CalcError::io_system(
                "IO.TDB_READ",
                format!("failed to read database '{}': {}", path.display(), source),
            )
        })?;
        Self::parse_str(&source)
    }

    /// All declared element symbols in file order, including `VA` and the
    /// electron-gas pseudo-element when the database declares them.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Elements a user can include in an alloy: everything except the
    /// vacancy and electron-gas pseudo-elements.
    pub fn selectable_elements(&self) -> Vec<&str> {
        self.elements
            .iter()
            .map(String::as_str)
            .filter(|symbol| *symbol != VACANCY && *symbol != "/-")
            .collect()
    }

    /// Phases in file order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|phase| phase.name.eq_ignore_ascii_case(name))
    }

    /// Default phase selection: the first two phases in file order (or all
    /// of them when the database defines fewer than two).
    pub fn default_phase_selection(&self) -> Vec<String> {
        self.phases
            .iter()
            .take(2)
            .map(|phase| phase.name.clone())
            .collect()
    }

    pub fn functions(&self) -> &BTreeMap<String, PiecewiseFunction> {
        &self.functions
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The end-member Gibbs energy `G(phase, element)`: a `G` parameter whose
    /// only non-vacancy species is the requested element.
    pub fn pure_gibbs(&self, phase: &str, element: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| {
            parameter.symbol == "G"
                && parameter.phase.eq_ignore_ascii_case(phase)
                && parameter.real_species() == [element]
        })
    }

    /// Binary interaction parameters for a phase, in ascending order of the
    /// Redlich-Kister exponent. Assessments write these as either
    /// `L(phase, a, b; order)` or `G(phase, a, b; order)`; the two-species
    /// constituent array is what marks a parameter as an interaction.
    pub fn binary_interactions(&self, phase: &str, a: &str, b: &str) -> Vec<&Parameter> {
        let mut interactions: Vec<&Parameter> = self
            .parameters
            .iter()
            .filter(|parameter| {
                if parameter.symbol != "L" && parameter.symbol != "G" {
                    return false;
                }
                if !parameter.phase.eq_ignore_ascii_case(phase) {
                    return false;
                }
                let species = parameter.real_species();
                species.len() == 2 && species.contains(&a) && species.contains(&b)
            })
            .collect();
        interactions.sort_by_key(|parameter| parameter.order);
        interactions
    }
}

#[cfg(test)]
mod tests {
    use super::Database;

    const FIXTURE: &str = r#"
 ELEMENT /- ELECTRON_GAS 0.0 0.0 0.0 !
 ELEMENT VA VACUUM 0.0 0.0 0.0 !
 ELEMENT FE BCC_A2 55.847 4489.0 27.28 !
 ELEMENT NI FCC_A1 58.69 4787.0 29.796 !
 FUNCTION GHSERFE 298.15 -8000+3*T; 6000 N !
 FUNCTION GHSERNI 298.15 -6000+2*T; 6000 N !
 PHASE LIQUID % 1 1.0 !
 CONSTITUENT LIQUID :FE,NI: !
 PHASE FCC_A1 % 2 1.0 1.0 !
 CONSTITUENT FCC_A1 :FE,NI% : VA: !
 PARAMETER G(FCC_A1,FE:VA;0) 298.15 +GHSERFE#; 6000 N !
 PARAMETER G(FCC_A1,NI:VA;0) 298.15 +GHSERNI#; 6000 N !
 PARAMETER L(FCC_A1,FE,NI:VA;0) 298.15 -2000+1*T; 6000 N !
 PARAMETER L(FCC_A1,FE,NI:VA;1) 298.15 +500; 6000 N !
"#;

    #[test]
    fn selectable_elements_exclude_pseudo_elements() {
        let database = Database::parse_str(FIXTURE).expect("fixture should parse");
        assert_eq!(database.selectable_elements(), ["FE", "NI"]);
    }

    #[test]
    fn default_phase_selection_is_first_two_in_file_order() {
        let database = Database::parse_str(FIXTURE).expect("fixture should parse");
        assert_eq!(database.default_phase_selection(), ["LIQUID", "FCC_A1"]);
    }

    #[test]
    fn pure_gibbs_matches_single_species_parameters() {
        let database = Database::parse_str(FIXTURE).expect("fixture should parse");
        let parameter = database
            .pure_gibbs("FCC_A1", "FE")
            .expect("FCC_A1 iron end-member should exist");
        assert_eq!(parameter.symbol, "G");
        assert!(database.pure_gibbs("LIQUID", "FE").is_none());
    }

    #[test]
    fn binary_interactions_sort_by_order() {
        let database = Database::parse_str(FIXTURE).expect("fixture should parse");
        let interactions = database.binary_interactions("FCC_A1", "FE", "NI");
        assert_eq!(interactions.len(), 2);
        assert_eq!(interactions[0].order, 0);
        assert_eq!(interactions[1].order, 1);
        // Species order in the lookup does not matter.
        assert_eq!(database.binary_interactions("FCC_A1", "NI", "FE").len(), 2);
    }

    #[test]
    fn load_reports_missing_files_as_io_errors() {
        let error = Database::load(std::path::Path::new("/nonexistent/alloy.tdb"))
            .expect_err("missing file should fail");
        assert_eq!(error.placeholder(), "IO.TDB_READ");
    }
}
