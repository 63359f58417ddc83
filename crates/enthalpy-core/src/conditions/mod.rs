//! Condition construction: reference-element selection, the temperature
//! sweep axis, and validation of one run's solver conditions.

use crate::domain::{CalcError, CalcResult, ConditionSet, PhaseSelection, VACANCY};
use crate::tdb::Database;
use std::collections::BTreeMap;

/// Picks the reference element: the lexicographically last of the selected
/// symbols. Its mole fraction is never specified explicitly; the solver
/// infers it from the constraint that fractions sum to one. Callers pass the
/// user selection without the vacancy symbol.
pub fn select_reference_element<'a, S: AsRef<str>>(elements: &'a [S]) -> CalcResult<&'a str> {
    elements
        .iter()
        .map(AsRef::as_ref)
        .max()
        .ok_or_else(|| {
            CalcError::input_validation(
                "INPUT.ELEMENTS_EMPTY",
                "cannot choose a reference element from an empty selection",
            )
        })
}

/// Hard cap on sweep grid points. A finer step than this buys nothing
/// physically and signals a mistyped input.
pub const MAX_SWEEP_POINTS: usize = 100_000;

/// Half-open temperature grid `[start, end)` sampled every `step` kelvin.
///
/// The half-open convention matches the range-axis semantics of the original
/// solver: 300 K to 1850 K in steps of 10 K yields 155 points (300, 310, ...,
/// 1840), never the end value itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSweep {
    start: f64,
    end: f64,
    step: f64,
}

impl TemperatureSweep {
    pub fn new(start: f64, end: f64, step: f64) -> CalcResult<Self> {
        if !start.is_finite() || !end.is_finite() || !step.is_finite() {
            return Err(CalcError::input_validation(
                "INPUT.RANGE",
                "temperature range values must be finite",
            ));
        }
        if start >= end {
            return Err(CalcError::input_validation(
                "INPUT.RANGE",
                format!(
                    "temperature start ({} K) must be below the end ({} K)",
                    start, end
                ),
            ));
        }
        if step <= 0.0 {
            return Err(CalcError::input_validation(
                "INPUT.RANGE",
                format!("temperature step must be positive, got {}", step),
            ));
        }
        let points = ((end - start) / step - 1.0e-9).ceil();
        if !points.is_finite() || points > MAX_SWEEP_POINTS as f64 {
            return Err(CalcError::input_validation(
                "INPUT.RANGE",
                format!(
                    "sweep would hold {} points, more than the maximum of {}",
                    points, MAX_SWEEP_POINTS
                ),
            ));
        }
        Ok(Self { start, end, step })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of grid points. The small tolerance keeps an exact multiple of
    /// the step (1850 = 300 + 155 * 10) from rounding up to an extra point.
    pub fn len(&self) -> usize {
        ((self.end - self.start) / self.step - 1.0e-9).ceil() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> Vec<f64> {
        (0..self.len())
            .map(|index| self.start + index as f64 * self.step)
            .collect()
    }
}

/// A validated solver condition specification: the temperature axis, a scalar
/// pressure, and one explicit mole fraction per non-reference element.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSpec {
    sweep: TemperatureSweep,
    pressure: f64,
    fractions: BTreeMap<String, f64>,
    reference: String,
}

impl ConditionSpec {
    /// Builds and validates a condition specification from raw selections.
    ///
    /// `selected` is the user element selection (the vacancy symbol is
    /// ignored if present); `fractions` must provide a value in [0, 1] for
    /// every non-reference element and nothing else. A single-element
    /// selection is valid: that element is the reference and the fraction
    /// map stays empty (pure substance).
    pub fn build<S: AsRef<str>>(
        selected: &[S],
        fractions: &BTreeMap<String, f64>,
        t_start: f64,
        t_end: f64,
        t_step: f64,
        pressure: f64,
    ) -> CalcResult<Self> {
        let sweep = TemperatureSweep::new(t_start, t_end, t_step)?;

        if !pressure.is_finite() || pressure <= 0.0 {
            return Err(CalcError::input_validation(
                "INPUT.PRESSURE",
                format!("pressure must be positive, got {}", pressure),
            ));
        }

        let real_elements: Vec<&str> = selected
            .iter()
            .map(AsRef::as_ref)
            .filter(|symbol| *symbol != VACANCY)
            .collect();
        let reference = select_reference_element(&real_elements)?.to_string();

        let mut explicit = BTreeMap::new();
        let mut sum = 0.0;
        for element in &real_elements {
            if *element == reference {
                continue;
            }
            let fraction = fractions.get(*element).copied().ok_or_else(|| {
                CalcError::input_validation(
                    "INPUT.FRACTION_MISSING",
                    format!("no mole fraction supplied for element '{}'", element),
                )
            })?;
            if !(0.0..=1.0).contains(&fraction) {
                return Err(CalcError::input_validation(
                    "INPUT.FRACTION_RANGE",
                    format!(
                        "mole fraction of '{}' must lie in [0, 1], got {}",
                        element, fraction
                    ),
                ));
            }
            sum += fraction;
            explicit.insert((*element).to_string(), fraction);
        }

        for key in fractions.keys() {
            if key == &reference {
                return Err(CalcError::input_validation(
                    "INPUT.FRACTION_REFERENCE",
                    format!(
                        "reference element '{}' must not carry an explicit mole fraction",
                        reference
                    ),
                ));
            }
            if !real_elements.contains(&key.as_str()) {
                return Err(CalcError::input_validation(
                    "INPUT.FRACTION_UNKNOWN",
                    format!("mole fraction given for unselected element '{}'", key),
                ));
            }
        }

        if sum > 1.0 + 1.0e-12 {
            return Err(CalcError::input_validation(
                "INPUT.FRACTION_SUM",
                format!("explicit mole fractions sum to {}, which exceeds 1", sum),
            ));
        }

        Ok(Self {
            sweep,
            pressure,
            fractions: explicit,
            reference,
        })
    }

    pub fn from_set(set: &ConditionSet) -> CalcResult<Self> {
        Self::build(
            &set.elements,
            &set.fractions,
            set.t_start,
            set.t_end,
            set.t_step,
            set.pressure,
        )
    }

    pub fn sweep(&self) -> &TemperatureSweep {
        &self.sweep
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Explicit mole fractions, keyed by non-reference element.
    pub fn fractions(&self) -> &BTreeMap<String, f64> {
        &self.fractions
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The reference element's fraction implied by the simplex constraint.
    pub fn reference_fraction(&self) -> f64 {
        1.0 - self.fractions.values().sum::<f64>()
    }
}

/// Resolves the requested phase names against the database: every requested
/// phase must exist, and an empty request falls back to the database default
/// pair (the first two phases in file order).
pub fn resolve_phases(database: &Database, requested: &[String]) -> CalcResult<PhaseSelection> {
    if requested.is_empty() {
        return PhaseSelection::new(database.default_phase_selection());
    }

    let mut names = Vec::with_capacity(requested.len());
    for name in requested {
        let phase = database.phase(name).ok_or_else(|| {
            CalcError::input_validation(
                "INPUT.PHASE_UNKNOWN",
                format!("phase '{}' is not defined in the database", name),
            )
        })?;
        names.push(phase.name.clone());
    }
    PhaseSelection::new(names)
}
