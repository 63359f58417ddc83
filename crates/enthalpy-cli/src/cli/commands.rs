use super::CliError;
use super::helpers::*;
use enthalpy_core::conditions::{ConditionSpec, select_reference_element};
use enthalpy_core::domain::{CalcError, ConditionSet, VACANCY};
use enthalpy_core::export::chart::write_svg_file;
use enthalpy_core::export::csv::write_csv_file;
use enthalpy_core::session::plan::{RunPlan, RunReport};
use enthalpy_core::session::{MAX_CONDITION_SETS, Session};
use enthalpy_core::solver::GibbsScanSolver;
use enthalpy_core::tdb::Database;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// TDB database path
    database: PathBuf,

    /// Emit a machine-readable JSON summary instead of the text listing
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct SweepArgs {
    /// TDB database path
    database: PathBuf,

    /// Element to include in the alloy (repeat per element)
    #[arg(long = "element", value_name = "EL", required = true)]
    elements: Vec<String>,

    /// Mole fraction assignment, e.g. --fraction FE=0.4 (repeat per element;
    /// the reference element's fraction is implied)
    #[arg(long = "fraction", value_name = "EL=X")]
    fractions: Vec<String>,

    /// Sweep start temperature in K
    #[arg(long, default_value_t = 300.0)]
    t_start: f64,

    /// Sweep end temperature in K (exclusive)
    #[arg(long, default_value_t = 1850.0)]
    t_end: f64,

    /// Sweep step in K
    #[arg(long, default_value_t = 10.0)]
    t_step: f64,

    /// Pressure in Pa
    #[arg(long, default_value_t = 101_325.0)]
    pressure: f64,

    /// Equilibrium phase (repeat; defaults to the database's first two)
    #[arg(long = "phase", value_name = "NAME")]
    phases: Vec<String>,

    /// CSV output path
    #[arg(long, default_value = "results.csv")]
    csv: PathBuf,

    /// Optional SVG chart output path
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Chart title
    #[arg(long, default_value = "Enthalpy vs. Temperature")]
    title: String,
}

#[derive(clap::Args)]
pub(super) struct BatchArgs {
    /// Run plan JSON path
    plan: PathBuf,

    /// Combined CSV output path
    #[arg(long, default_value = "combined.csv")]
    csv: PathBuf,

    /// Optional SVG chart of the combined table
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Chart title
    #[arg(long, default_value = "Enthalpy vs. Temperature")]
    title: String,

    /// Emit per-run JSON reports instead of the text summary
    #[arg(long)]
    json: bool,

    /// Optional JSON report output path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct InteractiveArgs {
    /// TDB database path
    database: PathBuf,

    /// Combined CSV output path, written when the session ends
    #[arg(long, default_value = "combined.csv")]
    csv: PathBuf,

    /// Optional SVG chart of the combined table
    #[arg(long)]
    chart: Option<PathBuf>,
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let database = Database::load(&args.database).map_err(CliError::Compute)?;
    let phase_names: Vec<&str> = database
        .phases()
        .iter()
        .map(|phase| phase.name.as_str())
        .collect();

    if args.json {
        let summary = serde_json::json!({
            "elements": database.selectable_elements(),
            "phases": phase_names,
            "default_phases": database.default_phase_selection(),
            "functions": database.functions().len(),
            "parameters": database.parameters().len(),
        });
        let rendered = serde_json::to_string_pretty(&summary).map_err(anyhow::Error::from)?;
        println!("{}", rendered);
    } else {
        println!("Elements:   {}", database.selectable_elements().join(", "));
        println!("Phases:     {}", phase_names.join(", "));
        println!(
            "Default phase selection: {}",
            database.default_phase_selection().join(", ")
        );
        println!("Functions:  {}", database.functions().len());
        println!("Parameters: {}", database.parameters().len());
    }
    Ok(0)
}

pub(super) fn run_sweep_command(args: SweepArgs) -> Result<i32, CliError> {
    let set = condition_set_from_flags(&args)?;
    let spec = ConditionSpec::from_set(&set).map_err(CliError::Compute)?;

    let mut session = Session::from_database_path(&args.database).map_err(CliError::Compute)?;
    tracing::info!(
        database = %args.database.display(),
        reference = spec.reference(),
        points = spec.sweep().len(),
        "conditions built"
    );

    let solver = GibbsScanSolver::new();
    let table = session.submit(set, &solver).map_err(CliError::Compute)?;
    tracing::info!(points = table.len(), "sweep solved");

    write_csv_file(table, &args.csv).map_err(CliError::Compute)?;
    println!(
        "Wrote {} rows to '{}' (reference element {}).",
        table.len(),
        args.csv.display(),
        spec.reference()
    );

    if let Some(chart_path) = &args.chart {
        write_svg_file(table, &args.title, chart_path).map_err(CliError::Compute)?;
        println!("Wrote chart to '{}'.", chart_path.display());
    }
    Ok(0)
}

pub(super) fn run_batch_command(args: BatchArgs) -> Result<i32, CliError> {
    let plan = RunPlan::load(&args.plan).map_err(CliError::Compute)?;
    let mut session = Session::from_database_path(&plan.database).map_err(CliError::Compute)?;
    tracing::info!(
        plan = %args.plan.display(),
        sets = plan.sets.len(),
        "run plan loaded"
    );

    let solver = GibbsScanSolver::new();
    let mut reports = Vec::with_capacity(plan.sets.len());
    for (index, set) in plan.sets.into_iter().enumerate() {
        let spec = ConditionSpec::from_set(&set).map_err(CliError::Compute)?;
        let reference = spec.reference().to_string();
        let elements = set.elements.clone();

        let table = session.submit(set, &solver).map_err(CliError::Compute)?;
        let points = table.len();
        tracing::info!(run = index + 1, points, "condition set solved");

        reports.push(RunReport {
            index: index + 1,
            elements,
            reference,
            points,
        });
    }

    if let Some(report_path) = &args.report {
        let rendered = serde_json::to_string_pretty(&reports).map_err(anyhow::Error::from)?;
        std::fs::write(report_path, rendered).map_err(|source| {
            CliError::Compute(CalcError::io_system(
                "IO.REPORT_WRITE",
                format!(
                    "failed to write run report '{}': {}",
                    report_path.display(),
                    source
                ),
            ))
        })?;
        println!("JSON report: {}", report_path.display());
    }

    if args.json {
        let rendered = serde_json::to_string_pretty(&reports).map_err(anyhow::Error::from)?;
        println!("{}", rendered);
    } else {
        for report in &reports {
            println!(
                "Run {}: {} (reference {}), {} points.",
                report.index,
                report.elements.join("-"),
                report.reference,
                report.points
            );
        }
    }

    let combined = session.combined();
    write_csv_file(&combined, &args.csv).map_err(CliError::Compute)?;
    println!(
        "Wrote {} combined rows to '{}'.",
        combined.len(),
        args.csv.display()
    );

    if let Some(chart_path) = &args.chart {
        write_svg_file(&combined, &args.title, chart_path).map_err(CliError::Compute)?;
        println!("Wrote chart to '{}'.", chart_path.display());
    }
    Ok(0)
}

pub(super) fn run_interactive_command(args: InteractiveArgs) -> Result<i32, CliError> {
    let mut session = Session::from_database_path(&args.database).map_err(CliError::Compute)?;
    println!(
        "Loaded '{}'. Selectable elements: {}",
        args.database.display(),
        session.database().selectable_elements().join(", ")
    );

    let solver = GibbsScanSolver::new();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    loop {
        if session.run_count() >= MAX_CONDITION_SETS {
            println!(
                "Session limit of {} condition sets reached.",
                MAX_CONDITION_SETS
            );
            break;
        }

        let Some(set) = read_condition_set(&mut input)? else {
            break;
        };

        // A rejected set leaves earlier completed runs in the session.
        match session.submit(set, &solver) {
            Ok(table) => println!("Computed {} points.", table.len()),
            Err(error) => println!("{}", error.diagnostic_line()),
        }

        let Some(answer) = prompt_line(&mut input, "Add another condition set? [y/N]: ")? else {
            break;
        };
        if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
            break;
        }
    }

    if session.run_count() == 0 {
        println!("No completed runs; nothing to export.");
        return Ok(0);
    }

    let combined = session.combined();
    write_csv_file(&combined, &args.csv).map_err(CliError::Compute)?;
    println!(
        "Wrote {} rows from {} run(s) to '{}'.",
        combined.len(),
        session.run_count(),
        args.csv.display()
    );

    if let Some(chart_path) = &args.chart {
        write_svg_file(&combined, "Enthalpy vs. Temperature", chart_path)
            .map_err(CliError::Compute)?;
        println!("Wrote chart to '{}'.", chart_path.display());
    }
    Ok(0)
}

fn condition_set_from_flags(args: &SweepArgs) -> Result<ConditionSet, CliError> {
    let elements: Vec<String> = args
        .elements
        .iter()
        .map(|element| element.trim().to_ascii_uppercase())
        .collect();

    let mut fractions = BTreeMap::new();
    for flag in &args.fractions {
        let (element, fraction) = parse_fraction_flag(flag)?;
        if fractions.insert(element.clone(), fraction).is_some() {
            return Err(CliError::Usage(format!(
                "element '{}' appears in more than one --fraction flag",
                element
            )));
        }
    }

    let phases: Vec<String> = args
        .phases
        .iter()
        .map(|phase| phase.trim().to_ascii_uppercase())
        .collect();

    Ok(ConditionSet {
        elements,
        fractions,
        t_start: args.t_start,
        t_end: args.t_end,
        t_step: args.t_step,
        pressure: args.pressure,
        phases,
    })
}

/// Reads one condition set from the interactive prompts. `None` means the
/// user finished (blank element list or end of input).
fn read_condition_set(input: &mut impl BufRead) -> Result<Option<ConditionSet>, CliError> {
    let (elements, reference) = loop {
        let Some(elements_line) =
            prompt_line(input, "Elements (comma-separated, blank to finish): ")?
        else {
            return Ok(None);
        };
        if elements_line.is_empty() {
            return Ok(None);
        }
        let elements = parse_symbol_list(&elements_line);

        let real_elements: Vec<String> = elements
            .iter()
            .filter(|symbol| symbol.as_str() != VACANCY)
            .cloned()
            .collect();
        match select_reference_element(&real_elements) {
            Ok(reference) => break (elements, reference.to_string()),
            Err(error) => println!("{}", error.diagnostic_line()),
        }
    };
    println!("Reference element: {} (fraction implied).", reference);

    let real_elements: Vec<&str> = elements
        .iter()
        .map(String::as_str)
        .filter(|symbol| *symbol != VACANCY)
        .collect();

    let mut fractions = BTreeMap::new();
    for element in &real_elements {
        if *element == reference {
            continue;
        }
        let Some(fraction) =
            prompt_number(input, &format!("Mole fraction of {}: ", element), 0.0)?
        else {
            return Ok(None);
        };
        fractions.insert((*element).to_string(), fraction);
    }

    let Some(t_start) = prompt_number(input, "Start temperature in K [300]: ", 300.0)? else {
        return Ok(None);
    };
    let Some(t_end) = prompt_number(input, "End temperature in K [1850]: ", 1850.0)? else {
        return Ok(None);
    };
    let Some(t_step) = prompt_number(input, "Temperature step in K [10]: ", 10.0)? else {
        return Ok(None);
    };
    let Some(pressure) = prompt_number(input, "Pressure in Pa [101325]: ", 101_325.0)? else {
        return Ok(None);
    };

    let Some(phases_line) =
        prompt_line(input, "Phases (comma-separated, blank for database default): ")?
    else {
        return Ok(None);
    };
    let phases = parse_symbol_list(&phases_line);

    Ok(Some(ConditionSet {
        elements,
        fractions,
        t_start,
        t_end,
        t_step,
        pressure,
        phases,
    }))
}
