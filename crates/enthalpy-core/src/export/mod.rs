//! Rendering of result tables: CSV download format and the SVG line chart.

pub mod chart;
pub mod csv;
