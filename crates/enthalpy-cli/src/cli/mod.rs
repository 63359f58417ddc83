mod commands;
mod helpers;

use clap::Parser;
use enthalpy_core::domain::CalcError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_calc_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            eprintln!("FATAL EXIT CODE: {}", diagnostic.exit_code());
            diagnostic.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "enthalpyfromtdb",
    about = "Enthalpy-vs-temperature curves from TDB thermodynamic databases"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// List the elements, phases, and functions a database defines
    Inspect(commands::InspectArgs),
    /// Solve one condition set over a temperature sweep and export the results
    Sweep(commands::SweepArgs),
    /// Execute a JSON run plan and export the combined table
    Batch(commands::BatchArgs),
    /// Collect condition sets interactively from stdin
    Interactive(commands::InteractiveArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
        CliCommand::Sweep(args) => commands::run_sweep_command(args),
        CliCommand::Batch(args) => commands::run_batch_command(args),
        CliCommand::Interactive(args) => commands::run_interactive_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(CalcError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_calc_error(&self) -> CalcError {
        match self {
            Self::Usage(message) => CalcError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => CalcError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
