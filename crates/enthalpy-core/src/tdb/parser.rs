//! Statement-oriented parser for the TDB text format.
//!
//! A database is a sequence of statements terminated by `!`. Comment lines
//! start with `$`. Only the statements the solver consumes are modelled
//! (`ELEMENT`, `FUNCTION`, `PHASE`, `CONSTITUENT`, `PARAMETER`); everything
//! else is skipped so assessed databases with type definitions or reference
//! lists still load.

use super::expr::{PiecewiseFunction, Segment, parse_expression};
use super::{Database, Parameter, Phase};
use crate::domain::{CalcError, CalcResult};

pub(super) fn parse_database(source: &str) -> CalcResult<Database> {
    let mut database = Database::empty();

    for statement in split_statements(source) {
        let mut tokens = statement.text.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword.to_ascii_uppercase().as_str() {
            "ELEMENT" => parse_element(&statement, &mut database)?,
            "FUNCTION" | "FUN" => parse_function(&statement, &mut database)?,
            "PHASE" => parse_phase(&statement, &mut database)?,
            "CONSTITUENT" => parse_constituent(&statement, &mut database)?,
            "PARAMETER" | "PARA" => parse_parameter(&statement, &mut database)?,
            _ => {}
        }
    }

    if database.elements.is_empty() {
        return Err(CalcError::database_parse(
            "TDB.NO_ELEMENTS",
            "database does not define any ELEMENT statements",
        ));
    }

    Ok(database)
}

struct Statement {
    text: String,
    line: usize,
}

fn split_statements(source: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut buffer = String::new();
    let mut start_line = 1;

    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.starts_with('$') {
            continue;
        }

        let mut rest = line;
        while let Some(bang) = rest.find('!') {
            if buffer.trim().is_empty() {
                start_line = line_number;
            }
            buffer.push(' ');
            buffer.push_str(&rest[..bang]);
            let text = buffer.trim().to_string();
            if !text.is_empty() {
                statements.push(Statement {
                    text,
                    line: start_line,
                });
            }
            buffer.clear();
            rest = &rest[bang + 1..];
        }

        if !rest.trim().is_empty() {
            if buffer.trim().is_empty() {
                start_line = line_number;
            }
            buffer.push(' ');
            buffer.push_str(rest);
        }
    }

    statements
}

/// First whitespace-delimited token and the trimmed remainder.
fn next_token(text: &str) -> Option<(&str, &str)> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find(char::is_whitespace) {
        Some(split) => Some((&trimmed[..split], trimmed[split..].trim_start())),
        None => Some((trimmed, "")),
    }
}

fn statement_error(statement: &Statement, placeholder: &str, message: impl Into<String>) -> CalcError {
    CalcError::database_parse(
        placeholder,
        format!("line {}: {}", statement.line, message.into()),
    )
}

fn parse_element(statement: &Statement, database: &mut Database) -> CalcResult<()> {
    let symbol = statement
        .text
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| {
            statement_error(statement, "TDB.ELEMENT", "ELEMENT statement is missing a symbol")
        })?
        .to_ascii_uppercase();

    if !database.elements.iter().any(|existing| *existing == symbol) {
        database.elements.push(symbol);
    }
    Ok(())
}

fn parse_function(statement: &Statement, database: &mut Database) -> CalcResult<()> {
    let (_, rest) = next_token(&statement.text).expect("statement text is never empty");
    let (name, body) = next_token(rest).ok_or_else(|| {
        statement_error(statement, "TDB.FUNCTION", "FUNCTION statement is missing a name")
    })?;
    let name = name.to_ascii_uppercase();
    if body.is_empty() {
        return Err(statement_error(
            statement,
            "TDB.FUNCTION",
            format!("FUNCTION '{}' has no temperature intervals", name),
        ));
    }

    let function = parse_piecewise(statement, &name, body)?;
    database.functions.insert(name, function);
    Ok(())
}

/// Parses the `<t_lo> <expr>; <t_1> Y <expr>; ... <t_n> N` interval chain
/// shared by FUNCTION and PARAMETER statements.
fn parse_piecewise(
    statement: &Statement,
    name: &str,
    body: &str,
) -> CalcResult<PiecewiseFunction> {
    let chunks: Vec<&str> = body.split(';').collect();

    let first = chunks[0].trim();
    let (t_lo_text, first_expr) = first.split_once(char::is_whitespace).ok_or_else(|| {
        statement_error(
            statement,
            "TDB.FUNCTION_RANGE",
            format!("'{}' is missing a lower temperature limit", name),
        )
    })?;
    let mut lower = parse_limit(statement, name, t_lo_text)?;
    let mut pending_expr = first_expr.trim().to_string();
    let mut segments = Vec::new();

    for chunk in &chunks[1..] {
        let (limit_text, after_limit) = next_token(chunk).unwrap_or(("", ""));
        let upper = parse_limit(statement, name, limit_text)?;
        if upper <= lower {
            return Err(statement_error(
                statement,
                "TDB.FUNCTION_RANGE",
                format!(
                    "'{}' has non-increasing temperature limits ({} then {})",
                    name, lower, upper
                ),
            ));
        }

        let expr = parse_expression(&pending_expr).map_err(|error| {
            let placeholder = error.placeholder().to_string();
            statement_error(
                statement,
                &placeholder,
                format!("'{}': {}", name, error.message()),
            )
        })?;
        segments.push(Segment {
            t_min: lower,
            t_max: upper,
            expr,
        });

        let (continuation, after_flag) = next_token(after_limit).unwrap_or(("N", ""));
        match continuation.to_ascii_uppercase().as_str() {
            "Y" => {
                if after_flag.is_empty() {
                    return Err(statement_error(
                        statement,
                        "TDB.FUNCTION_RANGE",
                        format!("'{}' continues with Y but has no further expression", name),
                    ));
                }
                pending_expr = after_flag.to_string();
                lower = upper;
            }
            "N" => {
                return PiecewiseFunction::new(segments).map_err(|error| {
                    let placeholder = error.placeholder().to_string();
                    statement_error(
                        statement,
                        &placeholder,
                        format!("'{}': {}", name, error.message()),
                    )
                });
            }
            other => {
                return Err(statement_error(
                    statement,
                    "TDB.FUNCTION_RANGE",
                    format!("'{}' has invalid continuation flag '{}'", name, other),
                ));
            }
        }
    }

    Err(statement_error(
        statement,
        "TDB.FUNCTION_RANGE",
        format!("'{}' does not close its final temperature interval", name),
    ))
}

fn parse_limit(statement: &Statement, name: &str, text: &str) -> CalcResult<f64> {
    text.parse::<f64>().map_err(|_| {
        statement_error(
            statement,
            "TDB.FUNCTION_RANGE",
            format!("'{}' has invalid temperature limit '{}'", name, text),
        )
    })
}

fn parse_phase(statement: &Statement, database: &mut Database) -> CalcResult<()> {
    let tokens: Vec<&str> = statement.text.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(statement_error(
            statement,
            "TDB.PHASE",
            "PHASE statement needs a name, type code, and sublattice count",
        ));
    }

    let name = phase_name(tokens[1]);
    let sublattice_count: usize = tokens[3].parse().map_err(|_| {
        statement_error(
            statement,
            "TDB.PHASE",
            format!("phase '{}' has invalid sublattice count '{}'", name, tokens[3]),
        )
    })?;

    let mut site_counts = Vec::with_capacity(sublattice_count);
    for offset in 0..sublattice_count {
        let token = tokens.get(4 + offset).ok_or_else(|| {
            statement_error(
                statement,
                "TDB.PHASE",
                format!(
                    "phase '{}' declares {} sublattices but lists fewer site counts",
                    name, sublattice_count
                ),
            )
        })?;
        let sites = token.parse::<f64>().map_err(|_| {
            statement_error(
                statement,
                "TDB.PHASE",
                format!("phase '{}' has invalid site count '{}'", name, token),
            )
        })?;
        site_counts.push(sites);
    }

    database.phases.push(Phase {
        name,
        site_counts,
        constituents: Vec::new(),
    });
    Ok(())
}

fn parse_constituent(statement: &Statement, database: &mut Database) -> CalcResult<()> {
    let (_, rest) = next_token(&statement.text).expect("statement text is never empty");
    let (name_token, body) = next_token(rest).ok_or_else(|| {
        statement_error(
            statement,
            "TDB.CONSTITUENT",
            "CONSTITUENT statement is missing a phase name",
        )
    })?;
    let name = phase_name(name_token);

    let first = body.find(':');
    let last = body.rfind(':');
    let (Some(first), Some(last)) = (first, last) else {
        return Err(statement_error(
            statement,
            "TDB.CONSTITUENT",
            format!("phase '{}' constituents must be wrapped in ':' separators", name),
        ));
    };
    if last <= first {
        return Err(statement_error(
            statement,
            "TDB.CONSTITUENT",
            format!("phase '{}' constituents must close with ':'", name),
        ));
    }

    let constituents = parse_constituent_array(&body[first + 1..last]);

    let phase = database
        .phases
        .iter_mut()
        .find(|phase| phase.name == name)
        .ok_or_else(|| {
            statement_error(
                statement,
                "TDB.CONSTITUENT",
                format!("CONSTITUENT refers to undeclared phase '{}'", name),
            )
        })?;
    phase.constituents = constituents;
    Ok(())
}

fn parse_parameter(statement: &Statement, database: &mut Database) -> CalcResult<()> {
    let (_, rest) = next_token(&statement.text).expect("statement text is never empty");
    let (name, body) = next_token(rest).ok_or_else(|| {
        statement_error(statement, "TDB.PARAMETER", "PARAMETER statement is missing a name")
    })?;
    if body.is_empty() {
        return Err(statement_error(
            statement,
            "TDB.PARAMETER",
            format!("parameter '{}' has no temperature intervals", name),
        ));
    }

    let open = name.find('(');
    let close = name.rfind(')');
    let (Some(open), Some(close)) = (open, close) else {
        return Err(statement_error(
            statement,
            "TDB.PARAMETER",
            format!("parameter name '{}' is not of the form SYMBOL(PHASE,ARRAY;ORDER)", name),
        ));
    };
    if close <= open {
        return Err(statement_error(
            statement,
            "TDB.PARAMETER",
            format!("parameter name '{}' has mismatched parentheses", name),
        ));
    }

    let symbol = name[..open].to_ascii_uppercase();
    let inner = &name[open + 1..close];

    let (phase_part, array_part) = inner.split_once(',').ok_or_else(|| {
        statement_error(
            statement,
            "TDB.PARAMETER",
            format!("parameter '{}' is missing a constituent array", name),
        )
    })?;
    let phase = phase_name(phase_part.trim());

    let (array_text, order) = match array_part.rsplit_once(';') {
        Some((array, order_text)) => {
            let order = order_text.trim().parse::<u32>().map_err(|_| {
                statement_error(
                    statement,
                    "TDB.PARAMETER",
                    format!("parameter '{}' has invalid interaction order '{}'", name, order_text),
                )
            })?;
            (array, order)
        }
        None => (array_part, 0),
    };

    let function = parse_piecewise(statement, name, body)?;

    database.parameters.push(Parameter {
        symbol,
        phase,
        constituents: parse_constituent_array(array_text),
        order,
        function,
    });
    Ok(())
}

/// Splits a constituent array into sublattices (`:`-separated) of species
/// (`,`-separated). Major-constituent markers (`FE%`) are stripped.
fn parse_constituent_array(text: &str) -> Vec<Vec<String>> {
    text.split(':')
        .map(|sublattice| {
            sublattice
                .split(',')
                .map(|species| species.trim().trim_end_matches('%').to_ascii_uppercase())
                .filter(|species| !species.is_empty())
                .collect()
        })
        .filter(|species: &Vec<String>| !species.is_empty())
        .collect()
}

/// Phase names may carry a `:L`-style model suffix in PHASE / CONSTITUENT /
/// PARAMETER statements; the bare name identifies the phase everywhere.
fn phase_name(token: &str) -> String {
    token
        .split(':')
        .next()
        .unwrap_or(token)
        .to_ascii_uppercase()
}
