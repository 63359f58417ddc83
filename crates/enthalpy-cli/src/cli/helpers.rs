use super::CliError;
use enthalpy_core::domain::CalcError;
use std::io::{BufRead, Write};

/// Parses one `--fraction EL=VALUE` flag into an uppercased symbol and its
/// mole fraction. Range checking happens later, with the other conditions.
pub(super) fn parse_fraction_flag(flag: &str) -> Result<(String, f64), CliError> {
    let (element, value) = flag.split_once('=').ok_or_else(|| {
        CliError::Usage(format!(
            "invalid --fraction '{}'; expected the form EL=VALUE (e.g. FE=0.4)",
            flag
        ))
    })?;
    let element = element.trim().to_ascii_uppercase();
    if element.is_empty() {
        return Err(CliError::Usage(format!(
            "invalid --fraction '{}'; the element symbol is empty",
            flag
        )));
    }
    let fraction = value.trim().parse::<f64>().map_err(|_| {
        CliError::Usage(format!(
            "invalid mole fraction '{}' in --fraction '{}'",
            value.trim(),
            flag
        ))
    })?;
    Ok((element, fraction))
}

/// Splits a comma-separated symbol list, trimming and uppercasing entries.
pub(super) fn parse_symbol_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|symbol| symbol.trim().to_ascii_uppercase())
        .filter(|symbol| !symbol.is_empty())
        .collect()
}

/// Prints a prompt and reads one trimmed line. `None` means end of input.
pub(super) fn prompt_line(
    input: &mut impl BufRead,
    prompt: &str,
) -> Result<Option<String>, CliError> {
    print!("{}", prompt);
    std::io::stdout().flush().map_err(|source| {
        CliError::Compute(CalcError::io_system(
            "IO.PROMPT",
            format!("failed to flush prompt: {}", source),
        ))
    })?;

    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(|source| {
        CliError::Compute(CalcError::io_system(
            "IO.PROMPT",
            format!("failed to read interactive input: {}", source),
        ))
    })?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Prompts for a number, falling back to `default` on an empty line.
pub(super) fn prompt_number(
    input: &mut impl BufRead,
    prompt: &str,
    default: f64,
) -> Result<Option<f64>, CliError> {
    let Some(line) = prompt_line(input, prompt)? else {
        return Ok(None);
    };
    if line.is_empty() {
        return Ok(Some(default));
    }
    match line.parse::<f64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            println!("'{}' is not a number; using {}.", line, default);
            Ok(Some(default))
        }
    }
}
