//! # gridcalc-cli
//!
//! Command-line interface for recalculating grid documents and evaluating
//! formulas.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use gridcalc_formulas::{EngineLimits, FormulaEngine};
use gridcalc_primitives::Value;
use gridcalc_sheet::Sheet;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// gridcalc - spreadsheet formula engine
#[derive(Parser)]
#[command(name = "gridcalc")]
#[command(author, version, about = "Recalculate spreadsheet grids", long_about = None)]
struct Cli {
    /// Grid document (JSON with columns, data and styles)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Evaluate a formula against the grid (or an empty grid)
    #[arg(short = 'e', long = "eval", value_name = "FORMULA")]
    eval: Option<String>,

    /// Output format (table, json)
    #[arg(short = 'f', long = "format", default_value = "table")]
    format: OutputFormat,

    /// JSON file with engine limits
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Largest range a formula may read
    #[arg(long)]
    max_range_cells: Option<usize>,

    /// Deepest cell-to-cell dependency chain
    #[arg(long)]
    max_depth: Option<usize>,

    /// Most formula cells evaluated per top-level call
    #[arg(long)]
    max_evaluations: Option<usize>,

    /// Deepest expression nesting within one formula
    #[arg(long)]
    max_nesting: Option<usize>,

    /// List the available functions and exit
    #[arg(long)]
    functions: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output format for results.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Aligned table output (default)
    #[default]
    Table,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let limits = load_limits(&cli)?;
    let engine = FormulaEngine::new().with_limits(limits);
    tracing::info!(?limits, "engine configured");

    if cli.functions {
        print_functions(&engine);
        return Ok(());
    }

    let sheet = match &cli.file {
        Some(path) => Sheet::from_json_path(path)
            .with_context(|| format!("Failed to load grid: {}", path.display()))?,
        None => Sheet::default(),
    }
    .with_engine(engine);

    if let Some(formula) = &cli.eval {
        let value = sheet.evaluate_formula(formula);
        print_value(formula, &value, cli.format)?;
    } else if cli.file.is_some() {
        print_sheet(&sheet, cli.format)?;
    } else {
        // No arguments - show help
        Cli::parse_from(["gridcalc", "--help"]);
    }
    Ok(())
}

/// Limits from the config file (if any), then flag overrides.
fn load_limits(cli: &Cli) -> Result<EngineLimits> {
    let mut limits = match &cli.config {
        Some(path) => read_limits(path)?,
        None => EngineLimits::default(),
    };
    if let Some(n) = cli.max_range_cells {
        limits.max_range_cells = n;
    }
    if let Some(n) = cli.max_depth {
        limits.max_depth = n;
    }
    if let Some(n) = cli.max_evaluations {
        limits.max_evaluations = n;
    }
    if let Some(n) = cli.max_nesting {
        limits.max_nesting = n;
    }
    Ok(limits)
}

fn read_limits(path: &Path) -> Result<EngineLimits> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid limits config: {}", path.display()))
}

fn print_functions(engine: &FormulaEngine) {
    let functions = engine.functions();
    for name in functions.names() {
        let signature = functions.signature(name).unwrap_or_else(|| name.to_string());
        let description = functions
            .get(name)
            .map(|def| def.metadata.description)
            .unwrap_or_default();
        println!("{}  {}", signature.yellow(), description);
    }
}

/// Print an ad-hoc formula result.
fn print_value(formula: &str, value: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "formula": formula,
                "value": value_to_json(value),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => println!("{}", highlight(value, &value.to_string())),
    }
    Ok(())
}

/// Print the recalculated grid.
fn print_sheet(sheet: &Sheet, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let values: Vec<Vec<serde_json::Value>> = sheet
                .recalculate()
                .iter()
                .map(|row| row.iter().map(value_to_json).collect())
                .collect();
            let json = serde_json::json!({
                "columns": sheet.columns(),
                "values": values,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => {
            let values = sheet.recalculate();
            let shown = sheet.format_values(&values);
            for line in render_table(sheet.columns(), &values, &shown) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Aligned rows with a row-number gutter; widths come from the plain text
/// so colouring does not skew alignment.
fn render_table(columns: &[String], values: &[Vec<Value>], shown: &[Vec<String>]) -> Vec<String> {
    let gutter = shown.len().to_string().len();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(col, name)| {
            shown
                .iter()
                .filter_map(|row| row.get(col))
                .map(|text| text.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(shown.len() + 1);
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, width)| format!("{name:<width$}").bold().to_string())
        .collect();
    lines.push(format!("{:gutter$} | {}", "", header.join(" | ")));

    for (row, (texts, row_values)) in shown.iter().zip(values).enumerate() {
        let cells: Vec<String> = texts
            .iter()
            .zip(row_values)
            .zip(&widths)
            .map(|((text, value), width)| {
                let padded = if value.as_number().is_some() {
                    format!("{text:>width$}")
                } else {
                    format!("{text:<width$}")
                };
                highlight(value, &padded)
            })
            .collect();
        lines.push(format!("{:>gutter$} | {}", row + 1, cells.join(" | ")));
    }
    lines
}

/// Error sentinels in red; everything else unchanged.
fn highlight(value: &Value, text: &str) -> String {
    if value.is_error() {
        text.red().bold().to_string()
    } else {
        text.to_string()
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Empty => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Array(items) => items.iter().map(value_to_json).collect(),
        Value::String(_) | Value::Error(_) => serde_json::Value::String(value.to_string()),
    }
}
