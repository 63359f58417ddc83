//! The comma-separated download format: header `S.N.,T,H`, one row per
//! computed point, values as plain decimal numbers.

use crate::domain::{CalcError, CalcResult, EquilibriumRecord, ResultTable};
use std::fs;
use std::path::Path;

pub const CSV_HEADER: &str = "S.N.,T,H";

pub fn to_csv_string(table: &ResultTable) -> String {
    let mut out = String::with_capacity(16 + table.len() * 24);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in table.records() {
        out.push_str(&format!(
            "{},{},{}\n",
            record.serial, record.temperature, record.enthalpy
        ));
    }
    out
}

pub fn write_csv_file(table: &ResultTable, path: &Path) -> CalcResult<()> {
    fs::write(path, to_csv_string(table)).map_err(|source| {
        CalcError::io_system(
            "IO.CSV_WRITE",
            format!("failed to write CSV '{}': {}", path.display(), source),
        )
    })
}

/// Parses the download format back into a table. Used by the round-trip
/// tests and by anyone re-importing a previous export.
pub fn parse_csv(source: &str) -> CalcResult<ResultTable> {
    let mut lines = source.lines();
    let header = lines.next().unwrap_or("").trim();
    if header != CSV_HEADER {
        return Err(CalcError::input_validation(
            "INPUT.CSV_HEADER",
            format!("expected header '{}', found '{}'", CSV_HEADER, header),
        ));
    }

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row_number = index + 2;
        let mut fields = line.split(',');
        let serial = parse_field::<usize>(fields.next(), row_number, "S.N.")?;
        let temperature = parse_field::<f64>(fields.next(), row_number, "T")?;
        let enthalpy = parse_field::<f64>(fields.next(), row_number, "H")?;
        if fields.next().is_some() {
            return Err(CalcError::input_validation(
                "INPUT.CSV_ROW",
                format!("row {} has more than three fields", row_number),
            ));
        }
        records.push(EquilibriumRecord {
            serial,
            temperature,
            enthalpy,
        });
    }

    Ok(ResultTable::from_records(records))
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    row: usize,
    column: &str,
) -> CalcResult<T> {
    let text = field.map(str::trim).filter(|text| !text.is_empty()).ok_or_else(|| {
        CalcError::input_validation(
            "INPUT.CSV_ROW",
            format!("row {} is missing the '{}' column", row, column),
        )
    })?;
    text.parse::<T>().map_err(|_| {
        CalcError::input_validation(
            "INPUT.CSV_ROW",
            format!("row {} has invalid '{}' value '{}'", row, column, text),
        )
    })
}
