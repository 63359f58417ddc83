//! Enthalpy-versus-temperature calculations from CALPHAD thermodynamic
//! databases.
//!
//! The crate parses TDB files, builds validated equilibrium conditions for a
//! selected element set, sweeps a temperature range, evaluates molar enthalpy
//! at each point, and renders the results as CSV or an SVG chart. Multiple
//! condition sets accumulate in a [`session::Session`] and can be combined
//! into one numbered table.

pub mod conditions;
pub mod domain;
pub mod export;
pub mod results;
pub mod session;
pub mod solver;
pub mod tdb;
