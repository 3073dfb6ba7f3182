use clap::Parser;
use rle8_benchmark_rs::benchmark::{run, RunOptions};
use rle8_benchmark_rs::dataset::{input_files, input_name, load_input};
use rle8_benchmark_rs::error::Result;
use rle8_benchmark_rs::mode::{CodecVariant, ModeConfig};
use rle8_benchmark_rs::sampling;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Round-trips every rle8 variant, host and accelerator paths, over the files
/// of a directory or over generated inputs when no directory is given.
#[derive(Parser, Debug)]
#[command(name = "test_correctness")]
struct Args {
    /// Directory holding the input files.
    directory: Option<PathBuf>,

    /// Length of each generated input.
    #[arg(long, default_value_t = 1 << 20)]
    synthetic_len: usize,

    /// Seed for the generated inputs.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Sub section counts to exercise for the multi-section variant.
    #[arg(short = 's', long, value_delimiter = ',', default_values_t = [1u32, 3, 8, 64])]
    sub_sections: Vec<u32>,
}

fn inputs(args: &Args) -> Result<Vec<(String, Vec<u8>)>> {
    match &args.directory {
        Some(dir) => input_files(dir)?
            .iter()
            .map(|path| Ok((input_name(path), load_input(path)?)))
            .collect(),
        None => Ok(sampling::corpus(args.synthetic_len, args.seed)
            .into_iter()
            .map(|(name, data)| (name.to_string(), data))
            .collect()),
    }
}

fn variants(sub_sections: &[u32]) -> Vec<CodecVariant> {
    let mut variants: Vec<CodecVariant> = CodecVariant::all(NonZeroU32::MIN)
        .into_iter()
        .filter(|v| !v.has_accelerator_path())
        .collect();
    variants.extend(
        sub_sections
            .iter()
            .filter_map(|&n| NonZeroU32::new(n))
            .map(|sub_sections| CodecVariant::MultiSection { sub_sections }),
    );
    variants
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let inputs = match inputs(&args) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("{}: {}", err.category(), err);
            return ExitCode::FAILURE;
        }
    };

    let mut failures = 0;
    for (name, data) in &inputs {
        println!("Testing input: {name}");
        for variant in variants(&args.sub_sections) {
            if matches!(variant, CodecVariant::MultiSection { sub_sections } if sub_sections.get() as usize > data.len()) {
                continue;
            }
            let config = ModeConfig::for_variant(variant, NonZeroU32::MIN);
            let label = variant.to_string();
            match run(&config, data.clone(), &RunOptions::default()) {
                Ok(_) => println!("  {label:<28} ok"),
                Err(err) => {
                    println!("  {label:<28} FAILED {}: {}", err.category(), err);
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        eprintln!("{failures} round trip(s) failed");
        ExitCode::FAILURE
    } else {
        println!("All round trips passed.");
        ExitCode::SUCCESS
    }
}
