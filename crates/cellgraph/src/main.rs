//! `cellgraph` command-line tool.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use cellgraph_core::DuplicatePolicy;
use cellgraph_engine::{
    run, AbortSignal, ConfigError, EdgeOrder, IndexKind, InputConfig, InputFormat, OutputConfig,
    OutputFormat, RunConfig,
};
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Build a directed spatial adjacency graph from 3D cell centroids.
#[derive(Parser, Debug)]
#[command(name = "cellgraph", version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cell input file (`id,x,y,z` CSV or JSON Lines)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Edge output file; parent directories are created
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum centroid distance for adjacency
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Input encoding (default: from the file extension)
    #[arg(long, value_enum)]
    input_format: Option<FormatArg>,

    /// Output encoding (default: from the file extension)
    #[arg(long, value_enum)]
    output_format: Option<FormatArg>,

    /// Worker threads (default: available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Cells per work batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Policy for repeated cell ids
    #[arg(long, value_enum)]
    duplicates: Option<DuplicatesArg>,

    /// Edge ordering in the output
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Candidate index backend
    #[arg(long, value_enum)]
    index: Option<IndexArg>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Less logging (-q warnings only, -qq errors only)
    #[arg(short, long, action = ArgAction::Count)]
    quiet: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Csv,
    Jsonl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DuplicatesArg {
    LastWriteWins,
    KeepFirst,
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    Registration,
    ById,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum IndexArg {
    Grid,
    BruteForce,
}

impl Cli {
    /// Default log level from `-v` / `-q`.
    fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "info",
            (1, _) => "debug",
            (v, _) if v >= 2 => "trace",
            (_, 1) => "warn",
            _ => "error",
        }
    }

    /// Load the config file (if any) and layer flags over it.
    fn resolve_config(&self) -> Result<RunConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };

        if let Some(t) = self.threshold {
            config.adjacency_threshold = t;
        }
        if let Some(path) = &self.input {
            config.input = Some(InputConfig::new(path));
        }
        if let Some(format) = self.input_format {
            let input = config.input.as_mut().ok_or(ConfigError::MissingInput)?;
            input.format = Some(match format {
                FormatArg::Csv => InputFormat::Csv,
                FormatArg::Jsonl => InputFormat::JsonLines,
            });
        }
        if let Some(path) = &self.output {
            config.output = Some(OutputConfig::new(path));
        }
        if let Some(format) = self.output_format {
            let output = config.output.as_mut().ok_or(ConfigError::MissingOutput)?;
            output.format = Some(match format {
                FormatArg::Csv => OutputFormat::Csv,
                FormatArg::Jsonl => OutputFormat::JsonLines,
            });
        }
        if let Some(n) = self.workers {
            config.workers = Some(n);
        }
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(d) = self.duplicates {
            config.duplicate_policy = match d {
                DuplicatesArg::LastWriteWins => DuplicatePolicy::LastWriteWins,
                DuplicatesArg::KeepFirst => DuplicatePolicy::KeepFirst,
                DuplicatesArg::Reject => DuplicatePolicy::Reject,
            };
        }
        if let Some(o) = self.order {
            config.edge_order = match o {
                OrderArg::Registration => EdgeOrder::Registration,
                OrderArg::ById => EdgeOrder::ById,
            };
        }
        if let Some(i) = self.index {
            config.index = match i {
                IndexArg::Grid => IndexKind::Grid,
                IndexArg::BruteForce => IndexKind::BruteForce,
            };
        }
        Ok(config)
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `err` followed by each of its causes, joined with `": "`.
fn render_chain(err: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(err), |&e| e.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// Raise `abort` on Ctrl-C so the run stops after its in-flight batches and
/// still reports a summary.
fn install_interrupt_handler(abort: &AbortSignal) {
    let signal = abort.clone();
    let installed = ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, stopping after in-flight batches");
        signal.raise();
    });
    if let Err(e) = installed {
        tracing::warn!(error = %e, "cannot install interrupt handler");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: configure stage failed: {}", render_chain(&e));
            return ExitCode::FAILURE;
        }
    };

    let abort = AbortSignal::new();
    install_interrupt_handler(&abort);

    match run(&config, &abort) {
        Ok(summary) => {
            if cli.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("error: cannot encode summary: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!("{summary}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(stage = %e.stage, "run failed");
            eprintln!("error: {}", render_chain(&e));
            ExitCode::FAILURE
        }
    }
}
