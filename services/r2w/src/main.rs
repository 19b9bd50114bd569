//! Radar to WRF converter.
//!
//! Reads the CAPPI2..CAPPI8 NetCDF files of one timestamp from an input
//! directory and writes the little_r observation report consumed by WRF data
//! assimilation.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use radar2wrf::{Converter, ConverterConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "r2w")]
#[command(about = "Convert CAPPI radar volumes into little_r observations for WRF")]
struct Args {
    /// Directory containing CAPPI{n}-{key}.nc files
    input_dir: PathBuf,

    /// Report file to write
    output_file: PathBuf,

    /// Timestamp key, YYYYMMDDHH or YYYYMMDDHHMM
    timestamp_key: String,

    /// YAML configuration file
    #[arg(short, long, env = "RADAR2WRF_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Conversion failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // The report may go to stdout, keep logs on stderr
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr);

    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &Args) -> Result<ConverterConfig> {
    let mut config = match &args.config {
        Some(path) => ConverterConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConverterConfig::default(),
    };
    config.apply_env().context("applying environment overrides")?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    info!(
        bands = ?config.bands.iter().map(|b| b.get()).collect::<Vec<_>>(),
        absent_bands = ?config.absent_bands,
        "Loaded configuration"
    );

    let converter = Converter::new(config)?;
    let mut report = converter
        .convert(&args.input_dir, &args.timestamp_key)
        .with_context(|| {
            format!(
                "converting {} from {}",
                args.timestamp_key,
                args.input_dir.display()
            )
        })?;

    let file = File::create(&args.output_file)
        .with_context(|| format!("creating {}", args.output_file.display()))?;
    let mut out = BufWriter::new(file);
    let bytes = io::copy(&mut report, &mut out)
        .with_context(|| format!("writing {}", args.output_file.display()))?;
    out.flush()
        .with_context(|| format!("flushing {}", args.output_file.display()))?;

    info!(
        output = %args.output_file.display(),
        bytes = bytes,
        "Report written"
    );
    Ok(())
}
