use clap::Parser;
use rle8_benchmark_rs::benchmark::{run, RunOptions};
use rle8_benchmark_rs::benchmark_utils::*;
use rle8_benchmark_rs::dataset::{input_files, input_name, load_input};
use rle8_benchmark_rs::error::{BenchError, Result};
use rle8_benchmark_rs::mode::{CodecVariant, ModeConfig};
use rle8_benchmark_rs::platform::apply_benchmark_hints;
use std::fs;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Runs every rle8 variant over every file in a directory and prints a
/// summary table per variant.
#[derive(Parser, Debug)]
#[command(name = "benchmark_all")]
struct Args {
    /// Directory holding the input files.
    directory: PathBuf,

    /// Results file, replaced on every invocation.
    #[arg(short, long, default_value = "benchmark_results.json")]
    output: PathBuf,

    /// Timed repetitions per phase.
    #[arg(short = 'r', long, default_value_t = NonZeroU32::new(15).unwrap_or(NonZeroU32::MIN))]
    runs: NonZeroU32,

    /// Sub section count for the multi-section variant.
    #[arg(short = 's', long, default_value_t = NonZeroU32::new(8).unwrap_or(NonZeroU32::MIN))]
    sub_sections: NonZeroU32,

    /// Optional CPU core for pinning.
    #[arg(long)]
    core: Option<usize>,
}

fn execute(args: &Args) -> Result<usize> {
    let files = input_files(&args.directory)?;
    if args.output.exists() {
        fs::remove_file(&args.output).map_err(|source| BenchError::Io {
            path: args.output.clone(),
            source,
        })?;
    }

    let mut failures = 0;
    for path in &files {
        let name = input_name(path);
        println!("Processing input \"{}\"", path.display());
        let input = load_input(path)?;

        for variant in CodecVariant::all(args.sub_sections) {
            println!("- {variant}");
            let config = ModeConfig::for_variant(variant, args.runs);
            match run(&config, input.clone(), &RunOptions::default()) {
                Ok(report) => {
                    info!(input = %name, %variant, rate = report.compression_rate(), "run finished");
                    append_benchmark_result(&BenchmarkRecord::from_report(&name, &report), &args.output)?;
                }
                Err(err) => {
                    error!(input = %name, %variant, category = err.category(), "{err}");
                    failures += 1;
                }
            }
        }
    }

    let records = read_benchmark_results(&args.output)?;
    print_benchmark_results(&records);
    Ok(failures)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    apply_benchmark_hints(args.core);

    match execute(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            eprintln!("{failures} benchmark run(s) failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{}: {}", err.category(), err);
            ExitCode::FAILURE
        }
    }
}
