use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::time::Instant;
use clap::{Parser, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use statlib::config::SweepConfig;
use statlib::io::get_reader;
use statlib::report::OutputFormat;
use statlib::sweep::Sweeper;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = String::from("Estimates random and LRU cache miss ratios from reuse-distance histograms"))]
struct Args {
    /// Histogram file, bucket boundaries on the first line
    input: String,

    /// JSON sweep configuration, defaults are used for anything missing
    #[arg(short, long)]
    config: Option<String>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    init_logging(args.debug || args.performance);
    #[cfg(debug_assertions)]
    debug!("Running the debug binary, debug mode is enabled by default. If benchmarking, re-compile with the --release argument");

    let config: SweepConfig = match &args.config {
        Some(path) => {
            let config_file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
            serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?
        }
        None => SweepConfig::default(),
    };
    debug!("Parsed sweep configuration: {config:?}");
    let mut sweeper = Sweeper::new(config).map_err(|e| format!("Invalid configuration: {e}"))?;

    let input_file = File::open(&args.input).map_err(|e| format!("Couldn't open the input file at path {}: {e}", args.input))?;
    let input = get_reader(input_file).map_err(|e| format!("Couldn't read the input file at path {}: {e}", args.input))?;

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|e| format!("Couldn't create the output file at path {path}: {e}"))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let summary = sweeper.run(input, args.format.into(), out).map_err(|e| e.to_string())?;

    if args.performance {
        let total_time = start.elapsed();
        info!("Solve time: {}s", sweeper.get_solve_time().as_nanos() as f64 / 1e9);
        info!("Total execution time (includes parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9);
    }
    if summary.misaligned_rows > 0 {
        warn!("{} of {} rows didn't match the bucket definition", summary.misaligned_rows, summary.rows);
    }
    Ok(())
}
