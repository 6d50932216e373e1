use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use engine_test_explorer::axis::AxisBinding;
use engine_test_explorer::config::EngineConfig;
use engine_test_explorer::data::filter::TimeWindow;
use engine_test_explorer::data::loader;
use engine_test_explorer::data::model::DecimalSeparator;
use engine_test_explorer::export::{self, TextLayout};
use engine_test_explorer::settings::{JsonFileStore, MemoryStore, SettingsStore};
use engine_test_explorer::state::Session;
use engine_test_explorer::summary::MetricSet;

#[derive(Parser)]
#[command(name = "engine-test-explorer", version, about = "Inspect and summarise tab-delimited engine-test logs")]
struct Cli {
    /// JSON engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON file remembering the last folder between runs
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Selection {
    /// Folder to scan (defaults to the last one used)
    root: Option<PathBuf>,

    /// Only files whose name contains this text
    #[arg(long, default_value = "")]
    filter: String,

    /// Decimal separator of numeric fields: "." or ","
    #[arg(long)]
    decimal: Option<DecimalSeparator>,
}

#[derive(Args)]
struct Binding {
    /// Date/time column (defaults to the first detected one)
    #[arg(long)]
    time: Option<String>,

    /// Data column per Y axis, in order (up to four)
    #[arg(long = "axis", value_name = "COLUMN")]
    axes: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List data files
    Scan {
        #[command(flatten)]
        selection: Selection,
    },
    /// Show numeric and time column candidates
    Inspect {
        #[command(flatten)]
        selection: Selection,
    },
    /// Show the first rows of each file
    Preview {
        #[command(flatten)]
        selection: Selection,
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Summary statistics per file and bound column
    Summary {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        binding: Binding,
        /// mean, median, min/max, std dev, or a comma-separated list
        #[arg(long, default_value = "mean")]
        metrics: String,
        /// Window start in elapsed seconds
        #[arg(long, default_value = "")]
        start: String,
        /// Window end in elapsed seconds
        #[arg(long, default_value = "")]
        end: String,
        /// Write to .csv/.tsv instead of printing
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write elapsed time and bound columns of all files to one table
    Export {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        binding: Binding,
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let settings: Box<dyn SettingsStore> = match &cli.settings {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(MemoryStore::default()),
    };
    let mut session = Session::new(config, settings);

    match cli.command {
        Command::Scan { selection } => {
            open(&mut session, &selection)?;
            for file in &session.visible {
                println!("{}", file.path.display());
            }
        }
        Command::Inspect { selection } => {
            open(&mut session, &selection)?;
            println!("numeric: {}", session.columns.numeric.join(", "));
            println!("time:    {}", session.columns.time.join(", "));
        }
        Command::Preview { selection, rows } => {
            open(&mut session, &selection)?;
            let files = session.selected_files();
            for (file, table) in loader::preview(&files, session.config.decimal_separator, rows) {
                println!("== {}", file.file_name());
                match table {
                    Ok(t) => {
                        println!("{}", t.columns.join("\t"));
                        for row in &t.rows {
                            println!("{}", row.join("\t"));
                        }
                    }
                    Err(msg) => println!("{msg}"),
                }
            }
        }
        Command::Summary {
            selection,
            binding,
            metrics,
            start,
            end,
            output,
        } => {
            open(&mut session, &selection)?;
            bind(&mut session, binding)?;
            session.metrics = MetricSet::parse(&metrics);
            session.window = TimeWindow::parse(&start, &end);

            let summary = session.summarize()?;
            report_load_errors(&session);
            match output {
                Some(path) => export::export_summary(&summary, &path, None)?,
                None => {
                    println!("{}", summary.header().join("\t"));
                    for row in &summary.rows {
                        let cells: Vec<String> = row.values.iter().map(|v| export::preview_value(*v)).collect();
                        println!("{}\t{}", row.file.display_name, cells.join("\t"));
                    }
                }
            }
        }
        Command::Export {
            selection,
            binding,
            output,
        } => {
            open(&mut session, &selection)?;
            bind(&mut session, binding)?;
            let frame = session.merged_series()?;
            report_load_errors(&session);
            let layout = TextLayout::for_path(&output, session.config.decimal_separator);
            export::export_series(&frame, &output, layout)?;
            println!("Data exported: {}", output.display());
        }
    }

    Ok(())
}

/// Scan the folder, apply the name filter and select every visible file.
fn open(session: &mut Session, selection: &Selection) -> Result<()> {
    if let Some(decimal) = selection.decimal {
        session.config.decimal_separator = decimal;
    }
    let root = selection
        .root
        .clone()
        .or_else(|| session.last_folder())
        .context("No folder given and no last-used folder remembered")?;

    session.scan(&root);
    session.set_filter(&selection.filter);
    session.select_all();
    log::info!(
        "{} of {} files selected under {}",
        session.visible.len(),
        session.catalog.len(),
        root.display()
    );
    Ok(())
}

fn bind(session: &mut Session, binding: Binding) -> Result<()> {
    if binding.time.is_some() {
        session.time_column = binding.time;
    }
    if binding.axes.is_empty() {
        let candidates: Vec<String> = session
            .columns
            .numeric
            .iter()
            .filter(|c| Some(*c) != session.time_column.as_ref())
            .cloned()
            .collect();
        session.axes.fill_unbound(&candidates);
    } else {
        session.axes = AxisBinding::with_columns(binding.axes)?;
    }
    Ok(())
}

fn report_load_errors(session: &Session) {
    for err in &session.load_errors {
        eprintln!("warning: {err}");
    }
}
