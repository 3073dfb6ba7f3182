use clap::{ArgAction, Parser};
use rle8_benchmark_rs::benchmark::{run, RunOptions};
use rle8_benchmark_rs::benchmark_utils::{append_benchmark_result, BenchmarkRecord};
use rle8_benchmark_rs::dataset::{input_name, load_input};
use rle8_benchmark_rs::error::{BenchError, Result};
use rle8_benchmark_rs::mode::ModeFlags;
use rle8_benchmark_rs::platform::apply_benchmark_hints;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_CORE_ID: usize = 0;

/// Compresses a file with one rle8 variant, decompresses it again and
/// reports timings after validating the round trip.
#[derive(Parser, Debug)]
#[command(name = "rle8", version)]
struct Args {
    /// File to benchmark.
    input: PathBuf,

    /// Write the compressed stream to this file.
    #[arg(short = 'o', long = "to")]
    to: Option<PathBuf>,

    /// Split the input into this many independently decodable sub sections.
    #[arg(short = 's', long = "sub-sections", allow_negative_numbers = true)]
    sub_sections: Option<i64>,

    /// Repeat every timed phase this many times.
    #[arg(short = 'r', long = "runs", allow_negative_numbers = true)]
    runs: Option<i64>,

    /// Encode runs of the most frequent symbol only.
    #[arg(long)]
    single: bool,

    /// Byte-aligned token format.
    #[arg(long)]
    ultra: bool,

    /// Nibble token format with wide copies.
    #[arg(long)]
    extreme: bool,

    /// Skip the accelerator decompression phase.
    #[arg(long)]
    no_accel: bool,

    /// Pin the benchmark thread to this core.
    #[arg(long, default_value_t = DEFAULT_CORE_ID)]
    core: usize,

    /// Append a JSON record of this run to the given file.
    #[arg(long)]
    json: Option<PathBuf>,

    /// More log output; repeat for debug.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(args: Args) -> Result<()> {
    let config = ModeFlags {
        sub_sections: args.sub_sections,
        repetitions: args.runs,
        single_symbol: args.single,
        ultra: args.ultra,
        extreme: args.extreme,
    }
    .resolve()?;

    apply_benchmark_hints(Some(args.core));

    let input = load_input(&args.input)?;
    let options = RunOptions {
        output_path: args.to,
        accelerator: !args.no_accel,
    };
    let report = run(&config, input, &options)?;
    println!("{report}");

    if let Some(path) = &args.json {
        let record = BenchmarkRecord::from_report(input_name(&args.input), &report);
        append_benchmark_result(&record, path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn report_failure(err: &BenchError) {
    eprintln!("{}: {}", err.category(), err);
}
