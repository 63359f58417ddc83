//! SVG line chart of molar enthalpy against temperature: one polyline for
//! the combined dataset, with tick labels on both axes.

use crate::domain::{CalcError, CalcResult, ResultTable};
use std::fs;
use std::path::Path;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 60.0;
const TICK_COUNT: usize = 5;

pub fn render_svg(table: &ResultTable, title: &str) -> CalcResult<String> {
    if table.is_empty() {
        return Err(CalcError::input_validation(
            "INPUT.CHART_EMPTY",
            "cannot chart an empty result table",
        ));
    }

    let (t_min, t_max) = bounds(table.records().iter().map(|record| record.temperature));
    let (h_min, h_max) = bounds(table.records().iter().map(|record| record.enthalpy));
    // Degenerate spans still need a visible axis.
    let t_span = pad_span(t_max - t_min);
    let h_span = pad_span(h_max - h_min);

    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let x_of = |t: f64| MARGIN_LEFT + (t - t_min) / t_span * plot_width;
    let y_of = |h: f64| MARGIN_TOP + plot_height - (h - h_min) / h_span * plot_height;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
        WIDTH, HEIGHT, WIDTH, HEIGHT
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\">{}</text>\n",
        WIDTH / 2.0,
        escape_text(title)
    ));

    // Axes.
    svg.push_str(&format!(
        "<line x1=\"{l}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"black\"/>\n",
        l = MARGIN_LEFT,
        r = WIDTH - MARGIN_RIGHT,
        b = HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "<line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"black\"/>\n",
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = HEIGHT - MARGIN_BOTTOM
    ));

    for index in 0..=TICK_COUNT {
        let ratio = index as f64 / TICK_COUNT as f64;

        let t_value = t_min + ratio * t_span;
        let x = x_of(t_value);
        svg.push_str(&format!(
            "<line x1=\"{x}\" y1=\"{b}\" x2=\"{x}\" y2=\"{b2}\" stroke=\"black\"/>\n",
            x = x,
            b = HEIGHT - MARGIN_BOTTOM,
            b2 = HEIGHT - MARGIN_BOTTOM + 6.0
        ));
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" font-size=\"12\">{v:.0}</text>\n",
            x = x,
            y = HEIGHT - MARGIN_BOTTOM + 22.0,
            v = t_value
        ));

        let h_value = h_min + ratio * h_span;
        let y = y_of(h_value);
        svg.push_str(&format!(
            "<line x1=\"{x}\" y1=\"{y}\" x2=\"{x2}\" y2=\"{y}\" stroke=\"black\"/>\n",
            x = MARGIN_LEFT - 6.0,
            x2 = MARGIN_LEFT,
            y = y
        ));
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" text-anchor=\"end\" font-size=\"12\">{v:.0}</text>\n",
            x = MARGIN_LEFT - 10.0,
            y = y + 4.0,
            v = h_value
        ));
    }

    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"13\">T (K)</text>\n",
        MARGIN_LEFT + plot_width / 2.0,
        HEIGHT - 14.0
    ));
    svg.push_str(&format!(
        "<text x=\"20\" y=\"{y}\" text-anchor=\"middle\" font-size=\"13\" transform=\"rotate(-90 20 {y})\">H (J/mol)</text>\n",
        y = MARGIN_TOP + plot_height / 2.0
    ));

    let points: Vec<String> = table
        .records()
        .iter()
        .map(|record| format!("{:.2},{:.2}", x_of(record.temperature), y_of(record.enthalpy)))
        .collect();
    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"#1f77b4\" stroke-width=\"1.5\" points=\"{}\"/>\n",
        points.join(" ")
    ));

    svg.push_str("</svg>\n");
    Ok(svg)
}

pub fn write_svg_file(table: &ResultTable, title: &str, path: &Path) -> CalcResult<()> {
    let svg = render_svg(table, title)?;
    fs::write(path, svg).map_err(|source| {
        CalcError::io_system(
            "IO.CHART_WRITE",
            format!("failed to write chart '{}': {}", path.display(), source),
        )
    })
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        min = min.min(value);
        max = max.max(value);
    }
    (min, max)
}

fn pad_span(span: f64) -> f64 {
    if span.abs() < 1.0e-9 { 1.0 } else { span }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::render_svg;
    use crate::domain::{EquilibriumRecord, ResultTable};

    fn table() -> ResultTable {
        ResultTable::from_records(
            (0..10)
                .map(|index| EquilibriumRecord {
                    serial: index + 1,
                    temperature: 300.0 + index as f64 * 10.0,
                    enthalpy: -11000.0 + index as f64 * 50.0,
                })
                .collect(),
        )
    }

    #[test]
    fn chart_contains_one_polyline_with_all_points() {
        let svg = render_svg(&table(), "Enthalpy vs. Temperature").expect("chart should render");
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<polyline").count(), 1);
        let points_attr = svg
            .split("points=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .expect("polyline should carry points");
        assert_eq!(points_attr.split(' ').count(), 10);
        assert!(svg.contains("T (K)"));
        assert!(svg.contains("H (J/mol)"));
    }

    #[test]
    fn empty_table_is_rejected() {
        let error = render_svg(&ResultTable::default(), "empty")
            .expect_err("empty table should not chart");
        assert_eq!(error.placeholder(), "INPUT.CHART_EMPTY");
    }

    #[test]
    fn title_text_is_escaped() {
        let svg = render_svg(&table(), "Fe<Ni & Cu>").expect("chart should render");
        assert!(svg.contains("Fe&lt;Ni &amp; Cu&gt;"));
    }
}
