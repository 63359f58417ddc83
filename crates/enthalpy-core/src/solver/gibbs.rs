//! Built-in equilibrium backend: a minimum-Gibbs-energy scan.
//!
//! For each temperature point the molar Gibbs energy of every candidate
//! phase is evaluated at the fixed overall composition and the phase with
//! the lowest energy wins; its molar enthalpy H = G - T*dG/dT is reported.
//! The phase energy is the end-member sum plus the ideal-mixing term plus
//! Redlich-Kister binary excess contributions. Two-phase tangent
//! constructions are out of scope for this backend; the trait seam admits
//! richer solvers.

use super::{EquilibriumGrid, EquilibriumSolver, GAS_CONSTANT};
use crate::conditions::ConditionSpec;
use crate::domain::{CalcError, CalcResult, VACANCY};
use crate::tdb::{Database, Dual};

#[derive(Debug, Default)]
pub struct GibbsScanSolver;

impl GibbsScanSolver {
    pub fn new() -> Self {
        Self
    }
}

impl EquilibriumSolver for GibbsScanSolver {
    fn equilibrium(
        &self,
        database: &Database,
        elements: &[String],
        phases: &[String],
        spec: &ConditionSpec,
    ) -> CalcResult<EquilibriumGrid> {
        if phases.is_empty() {
            return Err(CalcError::solver_failure(
                "RUN.SOLVER_PHASES",
                "equilibrium requires at least one candidate phase",
            ));
        }
        for phase in phases {
            if database.phase(phase).is_none() {
                return Err(CalcError::solver_failure(
                    "RUN.SOLVER_PHASES",
                    format!("candidate phase '{}' is not defined in the database", phase),
                ));
            }
        }

        let composition = composition_vector(elements, spec)?;
        let sweep = spec.sweep().values();
        let mut temperatures = Vec::with_capacity(sweep.len());
        let mut enthalpies = Vec::with_capacity(sweep.len());

        for t in sweep {
            let mut best: Option<(f64, f64)> = None;
            for phase in phases {
                let gibbs = phase_gibbs(database, phase, &composition, t)?;
                if !gibbs.value.is_finite() || !gibbs.dt.is_finite() {
                    return Err(CalcError::solver_failure(
                        "RUN.SOLVER_ENERGY",
                        format!(
                            "phase '{}' produced a non-finite Gibbs energy at {} K",
                            phase, t
                        ),
                    ));
                }
                let enthalpy = gibbs.value - t * gibbs.dt;
                match best {
                    Some((value, _)) if value <= gibbs.value => {}
                    _ => best = Some((gibbs.value, enthalpy)),
                }
            }

            let (_, enthalpy) = best.expect("phase list was checked to be non-empty");
            temperatures.push(t);
            enthalpies.push(enthalpy);
        }

        let count = temperatures.len();
        Ok(EquilibriumGrid::new(vec![count], temperatures, enthalpies))
    }
}

/// Resolves the overall composition: explicit fractions plus the implied
/// reference fraction, over the non-vacancy elements.
fn composition_vector(
    elements: &[String],
    spec: &ConditionSpec,
) -> CalcResult<Vec<(String, f64)>> {
    let mut composition = Vec::new();
    for element in elements {
        if element.as_str() == VACANCY {
            continue;
        }
        let fraction = if element.as_str() == spec.reference() {
            spec.reference_fraction()
        } else {
            spec.fractions().get(element).copied().ok_or_else(|| {
                CalcError::solver_failure(
                    "RUN.SOLVER_COMPOSITION",
                    format!("element '{}' has no mole fraction in the conditions", element),
                )
            })?
        };
        if fraction < -1.0e-12 {
            return Err(CalcError::solver_failure(
                "RUN.SOLVER_COMPOSITION",
                format!("element '{}' has negative implied fraction {}", element, fraction),
            ));
        }
        composition.push((element.clone(), fraction.max(0.0)));
    }

    if composition.is_empty() {
        return Err(CalcError::solver_failure(
            "RUN.SOLVER_COMPOSITION",
            "no non-vacancy elements in the solver element list",
        ));
    }
    Ok(composition)
}

/// Molar Gibbs energy of one phase at temperature `t`, as a dual number so
/// the enthalpy falls out of the same evaluation.
fn phase_gibbs(
    database: &Database,
    phase: &str,
    composition: &[(String, f64)],
    t: f64,
) -> CalcResult<Dual> {
    let functions = database.functions();
    let mut gibbs = Dual::constant(0.0);

    // End-member (pure element) contributions.
    for (element, fraction) in composition {
        if *fraction == 0.0 {
            continue;
        }
        let parameter = database.pure_gibbs(phase, element).ok_or_else(|| {
            CalcError::solver_failure(
                "RUN.SOLVER_PARAMETER",
                format!(
                    "database has no G({},{}) parameter for the selected composition",
                    phase, element
                ),
            )
        })?;
        gibbs = gibbs.add(parameter.function.eval(t, functions)?.scale(*fraction));
    }

    // Ideal mixing: G_id = R*T * sum x ln x. Its enthalpy contribution is
    // exactly zero (G - T*dG/dT cancels), which the dual arithmetic yields
    // without special casing.
    let mut entropy_sum = 0.0;
    for (_, fraction) in composition {
        if *fraction > 0.0 {
            entropy_sum += fraction * fraction.ln();
        }
    }
    gibbs = gibbs.add(Dual::temperature(t).scale(GAS_CONSTANT * entropy_sum));

    // Redlich-Kister binary excess: x_i x_j * sum_v L_v * (x_i - x_j)^v.
    for (index, (element_a, x_a)) in composition.iter().enumerate() {
        for (element_b, x_b) in &composition[index + 1..] {
            if *x_a == 0.0 || *x_b == 0.0 {
                continue;
            }
            for parameter in database.binary_interactions(phase, element_a, element_b) {
                let weight = x_a * x_b * (x_a - x_b).powi(parameter.order as i32);
                gibbs = gibbs.add(parameter.function.eval(t, functions)?.scale(weight));
            }
        }
    }

    Ok(gibbs)
}

#[cfg(test)]
mod tests {
    use super::{GibbsScanSolver, phase_gibbs};
    use crate::conditions::ConditionSpec;
    use crate::domain::ElementSet;
    use crate::solver::{EquilibriumSolver, GAS_CONSTANT};
    use crate::tdb::Database;
    use std::collections::BTreeMap;

    const CU_FIXTURE: &str = r#"
 ELEMENT VA VACUUM 0.0 0.0 0.0 !
 ELEMENT CU FCC_A1 63.546 5004.1 33.15 !
 FUNCTION GHSERCU 298.15 -11000+5*T; 6000 N !
 PHASE LIQUID % 1 1.0 !
 CONSTITUENT LIQUID :CU: !
 PHASE FCC_A1 % 2 1.0 1.0 !
 CONSTITUENT FCC_A1 :CU:VA: !
 PARAMETER G(LIQUID,CU;0) 298.15 +GHSERCU#+13000-10*T; 6000 N !
 PARAMETER G(FCC_A1,CU:VA;0) 298.15 +GHSERCU#; 6000 N !
"#;

    const FENI_FIXTURE: &str = r#"
 ELEMENT VA VACUUM 0.0 0.0 0.0 !
 ELEMENT FE BCC_A2 55.847 4489.0 27.28 !
 ELEMENT NI FCC_A1 58.69 4787.0 29.796 !
 PHASE FCC_A1 % 1 1.0 !
 CONSTITUENT FCC_A1 :FE,NI: !
 PHASE BCC_A2 % 1 1.0 !
 CONSTITUENT BCC_A2 :FE,NI: !
 PARAMETER G(FCC_A1,FE;0) 298.15 -8000+3*T; 6000 N !
 PARAMETER G(FCC_A1,NI;0) 298.15 -6000+2*T; 6000 N !
"#;

    fn pure_cu_spec(t_start: f64, t_end: f64, t_step: f64) -> ConditionSpec {
        ConditionSpec::build(&["CU"], &BTreeMap::new(), t_start, t_end, t_step, 101_325.0)
            .expect("spec should build")
    }

    #[test]
    fn lower_gibbs_phase_wins_on_both_sides_of_the_crossing() {
        // G_liquid - G_fcc = 13000 - 10*T: FCC below 1300 K, liquid above.
        // H_fcc = -11000 (linear G), H_liquid = 2000.
        let database = Database::parse_str(CU_FIXTURE).expect("fixture should parse");
        let elements = ElementSet::from_selected(&["CU"]).expect("element set should build");
        let phases = vec!["LIQUID".to_string(), "FCC_A1".to_string()];
        let spec = pure_cu_spec(300.0, 1850.0, 10.0);

        let grid = GibbsScanSolver::new()
            .equilibrium(&database, elements.symbols(), &phases, &spec)
            .expect("equilibrium should solve");

        assert_eq!(grid.shape(), [155]);
        assert_eq!(grid.temperatures().len(), 155);
        assert!((grid.enthalpies()[0] - -11000.0).abs() < 1.0e-9);
        assert!((grid.enthalpies()[154] - 2000.0).abs() < 1.0e-9);

        // The latent-heat jump happens where the Gibbs curves cross.
        let crossing = grid
            .temperatures()
            .iter()
            .zip(grid.enthalpies())
            .find(|(_, h)| **h > 0.0)
            .map(|(t, _)| *t)
            .expect("liquid branch should appear");
        assert_eq!(crossing, 1300.0);
    }

    #[test]
    fn missing_end_member_parameter_is_a_solver_failure() {
        let database = Database::parse_str(FENI_FIXTURE).expect("fixture should parse");
        let elements = ElementSet::from_selected(&["FE", "NI"]).expect("element set should build");
        let mut fractions = BTreeMap::new();
        fractions.insert("FE".to_string(), 0.4);
        let spec = ConditionSpec::build(&["FE", "NI"], &fractions, 300.0, 400.0, 10.0, 101_325.0)
            .expect("spec should build");

        let error = GibbsScanSolver::new()
            .equilibrium(
                &database,
                elements.symbols(),
                &["BCC_A2".to_string()],
                &spec,
            )
            .expect_err("phase without end-member parameters should fail");
        assert_eq!(error.placeholder(), "RUN.SOLVER_PARAMETER");
    }

    #[test]
    fn ideal_mixing_contributes_entropy_but_no_enthalpy() {
        let database = Database::parse_str(FENI_FIXTURE).expect("fixture should parse");
        let composition = vec![("FE".to_string(), 0.4), ("NI".to_string(), 0.6)];
        let t = 1000.0;

        let gibbs = phase_gibbs(&database, "FCC_A1", &composition, t)
            .expect("phase energy should evaluate");

        let mechanical = 0.4 * (-8000.0 + 3.0 * t) + 0.6 * (-6000.0 + 2.0 * t);
        let mixing = GAS_CONSTANT * t * (0.4_f64 * 0.4_f64.ln() + 0.6 * 0.6_f64.ln());
        assert!((gibbs.value - (mechanical + mixing)).abs() < 1.0e-9);

        // H = G - T*dG/dT: the ideal term cancels, leaving the end-member
        // enthalpies only.
        let enthalpy = gibbs.value - t * gibbs.dt;
        let expected = 0.4 * -8000.0 + 0.6 * -6000.0;
        assert!((enthalpy - expected).abs() < 1.0e-9);
    }

    #[test]
    fn empty_phase_list_is_rejected() {
        let database = Database::parse_str(CU_FIXTURE).expect("fixture should parse");
        let elements = ElementSet::from_selected(&["CU"]).expect("element set should build");
        let spec = pure_cu_spec(300.0, 400.0, 10.0);

        let error = GibbsScanSolver::new()
            .equilibrium(&database, elements.symbols(), &[], &spec)
            .expect_err("empty phase list should fail");
        assert_eq!(error.placeholder(), "RUN.SOLVER_PHASES");
    }
}
