//! The benchmark harness: size, compress, decompress, validate and
//! optionally repeat decompression on the accelerator.
//!
//! All buffers are owned by the run and the accelerator session releases its
//! device on drop, so every early return cleans up exactly once.

use crate::accelerator::{Accelerator, AcceleratorSession, PooledDevice, SessionError};
use crate::bounds::BufferPlan;
use crate::buffers::BenchBuffers;
use crate::codec;
use crate::error::{BenchError, CodecError, Phase, Result};
use crate::mode::{CodecVariant, ModeConfig};
use crate::timing::{measure, BenchmarkResult};
use crate::validation::check_round_trip;
use std::fmt;
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Runtime options that are not part of the codec mode.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Destination for the compressed stream, written once after compression.
    pub output_path: Option<PathBuf>,
    /// Repeat decompression on the accelerator when the variant supports it.
    pub accelerator: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_path: None,
            accelerator: true,
        }
    }
}

/// Results of a successful run.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub variant: CodecVariant,
    pub compress: BenchmarkResult,
    pub decompress: BenchmarkResult,
    pub accelerator: Option<BenchmarkResult>,
}

impl BenchmarkReport {
    pub fn input_len(&self) -> usize {
        self.compress.bytes_in
    }

    pub fn compressed_len(&self) -> usize {
        self.compress.bytes_out
    }

    /// Compressed size as a percentage of the input size.
    pub fn compressed_percent(&self) -> f64 {
        self.compressed_len() as f64 / self.input_len() as f64 * 100.0
    }

    /// Original size divided by compressed size.
    pub fn compression_rate(&self) -> f64 {
        self.input_len() as f64 / self.compressed_len() as f64
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = self.input_len();
        writeln!(
            f,
            "Compressed {} bytes -> {} bytes ({:.6} %) in {:.6} ms. (=> {:.6} MB/s)",
            input,
            self.compressed_len(),
            self.compressed_percent(),
            self.compress.mean_latency_ms(),
            self.compress.throughput_mb_s(input),
        )?;
        write!(
            f,
            "Decompressed in {:.6} ms. (=> {:.6} MB/s)",
            self.decompress.mean_latency_ms(),
            self.decompress.throughput_mb_s(input),
        )?;
        if let Some(accelerator) = &self.accelerator {
            write!(
                f,
                "\nDecompressed in {:.6} ms (accelerator). (=> {:.6} MB/s)",
                accelerator.mean_latency_ms(),
                accelerator.throughput_mb_s(input),
            )?;
        }
        Ok(())
    }
}

/// Runs the benchmark with the default pooled accelerator device.
pub fn run(config: &ModeConfig, input: Vec<u8>, options: &RunOptions) -> Result<BenchmarkReport> {
    run_with_device(config, input, options, PooledDevice::default())
}

/// Runs the benchmark, using `device` for the accelerator phase. The device
/// is only touched when the configuration selects the multi-section variant.
pub fn run_with_device<A: Accelerator>(
    config: &ModeConfig,
    input: Vec<u8>,
    options: &RunOptions,
    device: A,
) -> Result<BenchmarkReport> {
    if input.is_empty() {
        return Err(BenchError::InvalidConfiguration("input is empty".into()));
    }
    if u32::try_from(input.len()).is_err() {
        return Err(BenchError::InvalidConfiguration(format!(
            "input of {} bytes exceeds the 4 GiB limit",
            input.len()
        )));
    }

    let variant = config.variant();
    if let CodecVariant::MultiSection { sub_sections } = variant {
        if sub_sections.get() as usize > input.len() {
            return Err(BenchError::InvalidConfiguration(format!(
                "{sub_sections} sub sections exceed the {} byte input",
                input.len()
            )));
        }
    }
    let repetitions = config.repetitions();
    let plan = BufferPlan::for_variant(variant, input.len());
    debug!(%variant, ?plan, "buffer plan");
    let mut buffers = BenchBuffers::allocate(&plan, input)?;

    let compress = compress_phase(variant, repetitions, &plan, &mut buffers)?;
    info!(
        %variant,
        bytes_in = compress.bytes_in,
        bytes_out = compress.bytes_out,
        mean_ms = compress.mean_latency_ms(),
        "compression finished"
    );

    if let Some(path) = &options.output_path {
        write_compressed(path, buffers.compressed.as_slice())?;
    }

    let decompress = decompress_phase(variant, repetitions, &mut buffers)?;
    check_round_trip(
        Phase::Decompress,
        buffers.input.as_slice(),
        buffers.decompressed.full(),
        decompress.bytes_out,
    )?;
    info!(%variant, mean_ms = decompress.mean_latency_ms(), "decompression validated");

    let accelerator = match variant {
        CodecVariant::MultiSection { sub_sections } if options.accelerator => {
            let result = accelerator_phase(sub_sections, repetitions, &mut buffers, device)?;
            info!(%variant, mean_ms = result.mean_latency_ms(), "accelerator decompression validated");
            Some(result)
        }
        _ => None,
    };

    Ok(BenchmarkReport {
        variant,
        compress,
        decompress,
        accelerator,
    })
}

/// Every stream carries a length header and the input is never empty, so a
/// codec call producing nothing has failed.
fn reject_empty<E: From<CodecError>>(produced: std::result::Result<usize, E>) -> std::result::Result<usize, E> {
    match produced {
        Ok(0) => Err(CodecError::EmptyOutput.into()),
        other => other,
    }
}

fn warn_if_unstable(phase: Phase, stable: bool) {
    if !stable {
        warn!(%phase, "repetitions produced different lengths; reporting the last one");
    }
}

fn compress_phase(
    variant: CodecVariant,
    repetitions: NonZeroU32,
    plan: &BufferPlan,
    buffers: &mut BenchBuffers,
) -> Result<BenchmarkResult> {
    let BenchBuffers {
        input, compressed, ..
    } = buffers;
    let source = input.as_slice();
    let destination = compressed.limited_mut(plan.compress_limit());

    let measurement = measure(repetitions, || reject_empty(codec::compress(variant, source, destination)))
        .map_err(BenchError::codec(Phase::Compress))?;

    warn_if_unstable(Phase::Compress, measurement.stable);
    compressed.set_used(measurement.produced);
    Ok(measurement.into_result(Phase::Compress, source.len()))
}

fn decompress_phase(
    variant: CodecVariant,
    repetitions: NonZeroU32,
    buffers: &mut BenchBuffers,
) -> Result<BenchmarkResult> {
    let BenchBuffers {
        input,
        compressed,
        decompressed,
    } = buffers;
    let expected = input.used();
    let source = compressed.as_slice();
    let destination = decompressed.full_mut();

    let measurement = measure(repetitions, || {
        reject_empty(codec::decompress(variant, source, destination, expected))
    })
    .map_err(BenchError::codec(Phase::Decompress))?;

    warn_if_unstable(Phase::Decompress, measurement.stable);
    decompressed.set_used(measurement.produced);
    Ok(measurement.into_result(Phase::Decompress, source.len()))
}

fn accelerator_phase<A: Accelerator>(
    sub_sections: NonZeroU32,
    repetitions: NonZeroU32,
    buffers: &mut BenchBuffers,
    device: A,
) -> Result<BenchmarkResult> {
    let BenchBuffers {
        input,
        compressed,
        decompressed,
    } = buffers;
    decompressed.clear();
    let expected = input.used();
    let source = compressed.as_slice();

    let mut session = AcceleratorSession::new(device);
    session.init(expected, source.len(), sub_sections.get())?;

    let destination = decompressed.full_mut();
    let measurement = measure(repetitions, || {
        reject_empty::<SessionError>(session.decompress(source, destination, expected))
    })
    .map_err(|e| e.into_bench(Phase::AcceleratorDecompress))?;
    session.destroy()?;

    warn_if_unstable(Phase::AcceleratorDecompress, measurement.stable);
    decompressed.set_used(measurement.produced);
    check_round_trip(
        Phase::AcceleratorDecompress,
        input.as_slice(),
        decompressed.full(),
        measurement.produced,
    )?;
    Ok(measurement.into_result(Phase::AcceleratorDecompress, source.len()))
}

fn write_compressed(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "compressed stream written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ModeFlags;

    fn config(flags: ModeFlags) -> ModeConfig {
        flags.resolve().unwrap()
    }

    #[test]
    fn report_lines_follow_the_classic_format() {
        let flags = ModeFlags {
            repetitions: Some(2),
            ..ModeFlags::default()
        };
        let report = run(&config(flags), b"aaaaaaaaaabbbbbbbbbb".to_vec(), &RunOptions::default()).unwrap();
        let text = report.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Compressed 20 bytes -> "), "{text}");
        assert!(lines[1].starts_with("Decompressed in "), "{text}");
        assert_eq!(report.compress.repetitions, 2);
        assert!(report.accelerator.is_none());
    }

    #[test]
    fn accelerator_phase_can_be_disabled() {
        let flags = ModeFlags {
            sub_sections: Some(2),
            ..ModeFlags::default()
        };
        let options = RunOptions {
            accelerator: false,
            ..RunOptions::default()
        };
        let report = run(&config(flags), vec![3; 1000], &options).unwrap();
        assert!(report.accelerator.is_none());
    }

    #[test]
    fn header_only_stream_is_a_codec_failure() {
        let variant = CodecVariant::Standard;
        let plan = BufferPlan::for_variant(variant, 10);
        let mut buffers = BenchBuffers::allocate(&plan, vec![1; 10]).unwrap();
        buffers.compressed.full_mut()[..4].copy_from_slice(&10u32.to_le_bytes());
        buffers.compressed.set_used(4);

        let err = decompress_phase(variant, NonZeroU32::MIN, &mut buffers).unwrap_err();
        assert!(matches!(
            err,
            BenchError::CodecFailure {
                phase: Phase::Decompress,
                source: CodecError::EmptyOutput,
            }
        ));
    }

    #[test]
    fn more_sub_sections_than_input_bytes_is_rejected() {
        let flags = ModeFlags {
            sub_sections: Some(4_000_000_000),
            ..ModeFlags::default()
        };
        let err = run(&config(flags), vec![1; 16], &RunOptions::default()).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)));

        let flags = ModeFlags {
            sub_sections: Some(16),
            ..ModeFlags::default()
        };
        assert!(run(&config(flags), vec![1; 16], &RunOptions::default()).is_ok());
    }

    #[test]
    fn empty_input_is_rejected_before_any_codec_call() {
        let err = run(&config(ModeFlags::default()), Vec::new(), &RunOptions::default()).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)));
    }
}
