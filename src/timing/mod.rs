//! Timed run executor.

use crate::error::Phase;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

/// Aggregate timing of one benchmark phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub phase: Phase,
    pub bytes_in: usize,
    pub bytes_out: usize,
    pub total_elapsed_ns: u64,
    pub repetitions: u32,
}

impl BenchmarkResult {
    pub fn mean_latency(&self) -> Duration {
        Duration::from_nanos(self.total_elapsed_ns / u64::from(self.repetitions.max(1)))
    }

    /// Mean latency in milliseconds, with sub-nanosecond precision kept.
    pub fn mean_latency_ms(&self) -> f64 {
        self.total_elapsed_ns as f64 / f64::from(self.repetitions.max(1)) / 1_000_000.0
    }

    /// Throughput in MB/s (MiB) of `bytes` processed per repetition.
    pub fn throughput_mb_s(&self, bytes: usize) -> f64 {
        let seconds = self.total_elapsed_ns as f64 / f64::from(self.repetitions.max(1)) / 1_000_000_000.0;
        if seconds > 0.0 {
            (bytes as f64 / (1024.0 * 1024.0)) / seconds
        } else {
            0.0
        }
    }
}

/// Outcome of [`measure`]: the last produced length and the total time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub produced: usize,
    pub elapsed: Duration,
    pub repetitions: NonZeroU32,
    /// False when some repetition produced a different length than the first.
    pub stable: bool,
}

impl Measurement {
    pub fn into_result(self, phase: Phase, bytes_in: usize) -> BenchmarkResult {
        BenchmarkResult {
            phase,
            bytes_in,
            bytes_out: self.produced,
            total_elapsed_ns: u64::try_from(self.elapsed.as_nanos()).unwrap_or(u64::MAX),
            repetitions: self.repetitions.get(),
        }
    }
}

/// Runs `operation` exactly `repetitions` times back to back.
///
/// The clock is read immediately before the first call and after the last
/// one. The first error aborts the loop and is returned as is.
pub fn measure<F, E>(repetitions: NonZeroU32, mut operation: F) -> Result<Measurement, E>
where
    F: FnMut() -> Result<usize, E>,
{
    let mut first = None;
    let mut produced = 0;
    let mut stable = true;

    let start = Instant::now();
    for _ in 0..repetitions.get() {
        produced = operation()?;
        match first {
            None => first = Some(produced),
            Some(expected) => stable &= expected == produced,
        }
    }
    let elapsed = start.elapsed();

    Ok(Measurement {
        produced,
        elapsed,
        repetitions,
        stable,
    })
}
