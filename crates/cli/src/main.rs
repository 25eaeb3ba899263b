// Tabula CLI - headless front end: load a table, summarize it, edit cells

mod exit_codes;
mod render;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tabula_config::Settings;
use tabula_engine::{CellValue, EditSession, Summary, Table, TableError};
use tabula_io::{FileError, LoadOptions};

use exit_codes::{EXIT_EDIT_REJECTED, EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Summarize and edit tabular data files (CSV, TSV, Excel)")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (default: <config dir>/tabula/settings.toml)
    #[arg(long, global = true, env = "TABULA_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoadArgs {
    /// Input file (.csv, .tsv, .txt, .xlsx, .xlsm, .xls, .xlsb, .ods)
    file: PathBuf,

    /// Field delimiter for delimited text (default: sniffed)
    #[arg(long, short = 'd')]
    delimiter: Option<char>,

    /// Worksheet to read from a workbook (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print count, mean, std, min, max and quartiles for every column
    #[command(after_help = "\
Examples:
  tabula describe sales.csv
  tabula describe sales.csv --precision 2
  tabula describe book.xlsx --sheet Q3 --json")]
    Describe {
        #[command(flatten)]
        load: LoadArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Decimal places for statistic values
        #[arg(long, value_name = "N")]
        precision: Option<usize>,
    },

    /// Print the table
    #[command(after_help = "\
--sort-all sorts every column on its own. Values in the same printed row no
longer belong to the same record afterwards.

Examples:
  tabula show data.csv
  tabula show data.tsv --sort-all
  tabula show data.csv --json")]
    Show {
        #[command(flatten)]
        load: LoadArgs,

        /// Sort each column independently (numbers before text)
        #[arg(long)]
        sort_all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit cells, then print the table and its recomputed summary
    #[command(after_help = "\
ROW is the 0-based data row (the header is not counted). VALUE becomes a
number when it parses as one, text otherwise.

Exit code 5 means some edits addressed a missing column or row; all other
edits were still applied.

Examples:
  tabula edit prices.csv --set price:0=4.5
  tabula edit prices.csv --set price:0=4.5 --set item:2=scone -o out.csv
  tabula edit prices.csv --set price:0=4.5 --reset")]
    Edit {
        #[command(flatten)]
        load: LoadArgs,

        /// Cell edit, repeatable
        #[arg(long = "set", value_name = "COLUMN:ROW=VALUE", required = true)]
        set: Vec<String>,

        /// Discard the queued edits instead of committing them
        #[arg(long)]
        reset: bool,

        /// Write the resulting table to this CSV file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Decimal places for statistic values
        #[arg(long, value_name = "N")]
        precision: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = match cli.command {
        Commands::Describe { load, json, precision } => cmd_describe(&settings, &load, json, precision),
        Commands::Show { load, sort_all, json } => cmd_show(&settings, &load, sort_all, json),
        Commands::Edit { load, set, reset, output, json, precision } => {
            cmd_edit(&settings, &load, &set, reset, output.as_deref(), json, precision)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Map a load failure to an exit code, keeping the path in the message.
    fn load(path: &Path, err: FileError) -> Self {
        let message = format!("{}: {}", path.display(), err);
        match err {
            FileError::Io(_) => Self::io(message),
            FileError::UnsupportedFormat(_) => Self::new(EXIT_PARSE, message)
                .with_hint("supported: csv, tsv, txt, xlsx, xlsm, xls, xlsb, ods"),
            FileError::SheetNotFound(_) => {
                let error = Self::new(EXIT_PARSE, message);
                match tabula_io::xlsx::sheet_names(path) {
                    Ok(names) => error.with_hint(format!("available sheets: {}", names.join(", "))),
                    Err(_) => error.with_hint("pick a sheet with --sheet NAME"),
                }
            }
            _ => Self::new(EXIT_PARSE, message),
        }
    }
}

// ============================================================================
// loading
// ============================================================================

/// Resolve load options (flags first, then settings), load the file and
/// report data-shape problems on stderr.
fn load_table(settings: &Settings, load: &LoadArgs) -> Result<Table, CliError> {
    let delimiter = load
        .delimiter
        .or(settings.import.delimiter)
        .map(tabula_config::delimiter_byte)
        .transpose()
        .map_err(|e| CliError::usage(e.to_string()))?;

    let options = LoadOptions {
        delimiter,
        sheet: load.sheet.clone().or_else(|| settings.import.sheet.clone()),
    };

    let raw = tabula_io::load(&load.file, &options).map_err(|e| CliError::load(&load.file, e))?;
    let table = raw.into_table();

    for issue in table.shape_issues() {
        eprintln!("warning: {}", issue);
    }

    Ok(table)
}

// ============================================================================
// output
// ============================================================================

fn emit(text: &str) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .and_then(|_| handle.flush())
        .map_err(|e| CliError::io(e.to_string()))
}

fn emit_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
    emit(&format!("{}\n", text))
}

fn table_text(table: &Table) -> String {
    let headers: Vec<String> = table.column_names().map(str::to_string).collect();
    let rows: Vec<Vec<String>> = table
        .rows()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| cell.map(CellValue::raw_display).unwrap_or_default())
                .collect()
        })
        .collect();
    render::grid(&headers, &rows)
}

fn summary_text(summary: &Summary, precision: Option<usize>, undefined_label: &str) -> String {
    let headers: Vec<String> = std::iter::once(summary.label_header())
        .chain(summary.columns().iter().cloned())
        .collect();
    let rows: Vec<Vec<String>> = summary
        .rows()
        .iter()
        .map(|row| {
            std::iter::once(row.stat.label().to_string())
                .chain(row.values.iter().map(|v| v.format(precision, undefined_label)))
                .collect()
        })
        .collect();
    render::grid(&headers, &rows)
}

// ============================================================================
// describe
// ============================================================================

fn cmd_describe(settings: &Settings, load: &LoadArgs, json: bool, precision: Option<usize>) -> Result<(), CliError> {
    let table = load_table(settings, load)?;
    let session = EditSession::new(table);

    if json {
        return emit_json(session.summary());
    }

    let precision = precision.or(settings.display.precision);
    emit(&summary_text(session.summary(), precision, &settings.display.undefined_label))
}

// ============================================================================
// show
// ============================================================================

fn cmd_show(settings: &Settings, load: &LoadArgs, sort_all: bool, json: bool) -> Result<(), CliError> {
    let mut table = load_table(settings, load)?;

    if sort_all {
        table.sort_all();
        eprintln!("warning: columns were sorted independently; rows are no longer aligned");
    }

    if json {
        emit_json(&table)
    } else {
        emit(&table_text(&table))
    }
}

// ============================================================================
// edit
// ============================================================================

/// One parsed `--set COLUMN:ROW=VALUE`.
#[derive(Debug, PartialEq)]
struct CellEdit {
    column: String,
    row: usize,
    value: String,
}

/// Split at the first `=`, then at the last `:` before it, so column names
/// may contain colons and values may contain `=`.
fn parse_set(arg: &str) -> Result<CellEdit, CliError> {
    let bad = || {
        CliError::usage(format!("invalid --set '{}'", arg)).with_hint("expected COLUMN:ROW=VALUE, e.g. price:0=4.5")
    };

    let (target, value) = arg.split_once('=').ok_or_else(bad)?;
    let (column, row) = target.rsplit_once(':').ok_or_else(bad)?;
    if column.is_empty() {
        return Err(bad());
    }
    let row = row.trim().parse::<usize>().map_err(|_| bad())?;

    Ok(CellEdit {
        column: column.to_string(),
        row,
        value: value.to_string(),
    })
}

fn cmd_edit(
    settings: &Settings,
    load: &LoadArgs,
    set: &[String],
    reset: bool,
    output: Option<&Path>,
    json: bool,
    precision: Option<usize>,
) -> Result<(), CliError> {
    // Parse every --set before touching the table
    let edits = set.iter().map(|s| parse_set(s)).collect::<Result<Vec<_>, _>>()?;

    let table = load_table(settings, load)?;
    let mut session = EditSession::new(table);

    let mut rejected: Vec<TableError> = Vec::new();
    for edit in edits {
        if let Err(e) = session.record_edit(&edit.column, edit.row, CellValue::from_input(&edit.value)) {
            log::warn!("edit rejected: {}", e);
            rejected.push(e);
        }
    }

    let report = if reset { session.reset() } else { session.commit() };
    rejected.extend(report.rejected.iter().map(|r| r.error.clone()));

    if let Some(path) = output {
        tabula_io::csv::export(session.table(), path).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
        log::info!("wrote {}", path.display());
    }

    if json {
        let rejected_messages: Vec<String> = rejected.iter().map(ToString::to_string).collect();
        emit_json(&json!({
            "state": report.state,
            "applied": report.applied,
            "discarded": report.discarded,
            "rejected": rejected_messages,
            "table": session.table(),
            "summary": session.summary(),
        }))?;
    } else {
        let precision = precision.or(settings.display.precision);
        let mut text = format!(
            "edits: {} applied, {} discarded, {} rejected\n\n",
            report.applied,
            report.discarded,
            rejected.len()
        );
        text.push_str(&table_text(session.table()));
        text.push('\n');
        text.push_str(&summary_text(session.summary(), precision, &settings.display.undefined_label));
        emit(&text)?;
    }

    if rejected.is_empty() {
        return Ok(());
    }
    for e in &rejected {
        eprintln!("rejected: {}", e);
    }
    Err(CliError::new(EXIT_EDIT_REJECTED, format!("{} edit(s) rejected", rejected.len())))
}
