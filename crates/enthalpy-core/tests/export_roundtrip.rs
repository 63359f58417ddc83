use enthalpy_core::domain::{EquilibriumRecord, ResultTable};
use enthalpy_core::export::chart::write_svg_file;
use enthalpy_core::export::csv::{parse_csv, write_csv_file};
use std::fs;
use tempfile::TempDir;

fn sample_table() -> ResultTable {
    ResultTable::from_records(
        (0..25)
            .map(|index| EquilibriumRecord {
                serial: index + 1,
                temperature: 300.0 + index as f64 * 10.0,
                enthalpy: -11000.0 + index as f64 * 123.456789,
            })
            .collect(),
    )
}

#[test]
fn csv_file_round_trips_through_the_download_format() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("results.csv");
    let table = sample_table();

    write_csv_file(&table, &path).expect("CSV should be written");

    let written = fs::read_to_string(&path).expect("CSV should be readable");
    assert!(written.starts_with("S.N.,T,H\n"));
    assert_eq!(written.lines().count(), 26);

    let parsed = parse_csv(&written).expect("written CSV should parse back");
    assert_eq!(parsed.len(), table.len());
    for (original, reparsed) in table.records().iter().zip(parsed.records()) {
        assert_eq!(original.serial, reparsed.serial);
        assert!((original.temperature - reparsed.temperature).abs() < 1.0e-9);
        assert!((original.enthalpy - reparsed.enthalpy).abs() < 1.0e-9);
    }
}

#[test]
fn csv_write_failure_surfaces_as_an_io_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("missing-directory").join("results.csv");

    let error = write_csv_file(&sample_table(), &path)
        .expect_err("write into a missing directory should fail");
    assert_eq!(error.placeholder(), "IO.CSV_WRITE");
    assert_eq!(error.exit_code(), 6);
}

#[test]
fn chart_file_is_valid_svg_with_one_series() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("chart.svg");

    write_svg_file(&sample_table(), "Cu enthalpy", &path).expect("chart should be written");

    let svg = fs::read_to_string(&path).expect("chart should be readable");
    assert!(svg.starts_with("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert_eq!(svg.matches("<polyline").count(), 1);
    assert!(svg.contains("Cu enthalpy"));
}
