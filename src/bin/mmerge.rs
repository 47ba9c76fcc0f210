//! mmerge - managed field merge CLI tool
//!
//! Performs typed operations on YAML/JSON files and replays merge scenarios.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use managed_merge::scenario::Scenario;
use managed_merge::typed::{deduced_parseable_type, ParseableType, Parser as SchemaParser};
use managed_merge::value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "mmerge", version)]
#[command(about = "Typed merges with per-manager field ownership", long_about = None)]
struct Cli {
    /// Path to the schema file. Without one, objects are treated as
    /// untyped maps.
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// Name of the type in the schema to use (default: the first one)
    #[arg(short, long, global = true)]
    type_name: Option<String>,

    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-", global = true)]
    output: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all types in the schema
    ListTypes,
    /// Validate a YAML/JSON file against the schema
    Validate { file: PathBuf },
    /// Build a field set from a YAML/JSON file
    Fieldset { file: PathBuf },
    /// Compare two YAML/JSON files
    Compare {
        #[arg(long)]
        lhs: PathBuf,
        #[arg(long)]
        rhs: PathBuf,
    },
    /// Merge two YAML/JSON files
    Merge {
        #[arg(long)]
        lhs: PathBuf,
        #[arg(long)]
        rhs: PathBuf,
    },
    /// Replay a scenario of applies and updates
    Run { scenario: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> CliResult {
    let parser = match &cli.schema {
        Some(path) => Some(SchemaParser::new(&read(path)?)?),
        None => None,
    };

    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(&cli.output)
                .map_err(|e| format!("failed to create output file {:?}: {}", cli.output, e))?,
        )
    };

    let pt = || parseable_type(parser.as_ref(), cli.type_name.as_deref());
    match cli.command {
        Command::ListTypes => list_types(parser.as_ref(), &mut output),
        Command::Validate { file } => validate(&pt()?, &file, &mut output),
        Command::Fieldset { file } => fieldset(&pt()?, &file, &mut output),
        Command::Compare { lhs, rhs } => compare(&pt()?, &lhs, &rhs, &mut output),
        Command::Merge { lhs, rhs } => merge(&pt()?, &lhs, &rhs, &mut output),
        Command::Run { scenario } => run_scenario(&pt()?, &scenario, &mut output),
    }
}

fn parseable_type(
    parser: Option<&SchemaParser>,
    type_name: Option<&str>,
) -> Result<ParseableType, Box<dyn std::error::Error>> {
    let parser = match parser {
        Some(parser) => parser,
        None => return Ok(deduced_parseable_type()),
    };
    let type_name = match type_name {
        Some(name) => name.to_string(),
        None => parser
            .type_names()
            .first()
            .map(|s| s.to_string())
            .ok_or("no types found in schema")?,
    };
    debug!(type_name = %type_name, "using schema type");
    Ok(parser.checked_type(&type_name)?)
}

fn list_types(parser: Option<&SchemaParser>, output: &mut dyn Write) -> CliResult {
    let parser = parser.ok_or("list-types requires --schema")?;
    for name in parser.type_names() {
        writeln!(output, "{}", name)?;
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    fs::read_to_string(path).map_err(|e| format!("failed to read {:?}: {}", path, e).into())
}

fn validate(pt: &ParseableType, file: &Path, output: &mut dyn Write) -> CliResult {
    pt.from_yaml(&read(file)?)?;
    writeln!(output, "{}: valid", file.display())?;
    Ok(())
}

fn fieldset(pt: &ParseableType, file: &Path, output: &mut dyn Write) -> CliResult {
    let set = pt.from_yaml(&read(file)?)?.to_field_set()?;
    write!(output, "{}", serde_json::to_string_pretty(&set)?)?;
    writeln!(output)?;
    Ok(())
}

fn compare(pt: &ParseableType, lhs: &Path, rhs: &Path, output: &mut dyn Write) -> CliResult {
    let lhs = pt.from_yaml(&read(lhs)?)?;
    let rhs = pt.from_yaml(&read(rhs)?)?;
    let comparison = lhs.compare(&rhs)?;

    if comparison.is_same() {
        writeln!(output, "No difference")?;
    } else {
        writeln!(output, "{}", comparison)?;
    }
    Ok(())
}

fn merge(pt: &ParseableType, lhs: &Path, rhs: &Path, output: &mut dyn Write) -> CliResult {
    let lhs = pt.from_yaml(&read(lhs)?)?;
    let rhs = pt.from_yaml(&read(rhs)?)?;
    let merged = lhs.merge(&rhs)?;
    write!(output, "{}", value::to_yaml(merged.value())?)?;
    Ok(())
}

fn run_scenario(pt: &ParseableType, file: &Path, output: &mut dyn Write) -> CliResult {
    let scenario = Scenario::from_yaml(&read(file)?)?;
    let state = scenario.run(pt)?;

    writeln!(output, "object:")?;
    write!(output, "{}", indent(&value::to_yaml(state.object.value())?))?;
    writeln!(output, "managedFields:")?;
    write!(output, "{}", indent(&serde_yaml::to_string(&state.managers)?))?;
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("  {}\n", line)).collect()
}
