//! Failure taxonomy of the benchmark harness.
//!
//! Every variant of [`BenchError`] is terminal for a run. Codec level problems
//! are described by [`CodecError`] and wrapped together with the phase in
//! which they occurred.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Benchmark phase a result or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Compress,
    Decompress,
    AcceleratorDecompress,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Compress => f.write_str("compression"),
            Phase::Decompress => f.write_str("decompression"),
            Phase::AcceleratorDecompress => f.write_str("accelerator decompression"),
        }
    }
}

/// Errors reported by the codec variants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Destination cannot hold the produced bytes.
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    OutputTooSmall { needed: usize, available: usize },

    /// Compressed stream ended in the middle of a token.
    #[error("compressed stream truncated at offset {offset}")]
    Truncated { offset: usize },

    /// Compressed stream is structurally invalid.
    #[error("malformed compressed stream at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },

    /// Input does not fit the 32-bit length header.
    #[error("input of {0} bytes exceeds the 32-bit length header")]
    InputTooLarge(usize),

    /// A codec call reported success without producing a single byte.
    #[error("codec produced no output")]
    EmptyOutput,
}

/// Main error type for a benchmark run.
#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    /// Mutually exclusive or out-of-range flags, or an unusable input.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to allocate {bytes} bytes")]
    AllocationFailure { bytes: usize },

    #[error("{phase} failed: {source}")]
    CodecFailure {
        phase: Phase,
        #[source]
        source: CodecError,
    },

    /// Reconstructed length differs from the original length.
    #[error("{phase} produced {actual} bytes, expected {expected}")]
    SizeMismatch {
        phase: Phase,
        expected: usize,
        actual: usize,
    },

    /// Reconstructed bytes differ from the original.
    #[error("{phase} validation failed: first invalid byte at {offset} (0x{expected:02x} != 0x{actual:02x})")]
    ByteMismatch {
        phase: Phase,
        offset: usize,
        expected: u8,
        actual: u8,
    },

    #[error("accelerator initialization failed: {0}")]
    AcceleratorInitFailure(String),

    /// Accelerator session operation invoked outside its valid state.
    #[error("cannot {operation} an accelerator session that is {state}")]
    AcceleratorState {
        operation: &'static str,
        state: crate::accelerator::SessionState,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    /// Short failure category, used as the prefix of one-line diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            BenchError::InvalidConfiguration(_) => "InvalidConfiguration",
            BenchError::AllocationFailure { .. } => "AllocationFailure",
            BenchError::CodecFailure { .. } => "CodecFailure",
            BenchError::SizeMismatch { .. } => "SizeMismatch",
            BenchError::ByteMismatch { .. } => "ByteMismatch",
            BenchError::AcceleratorInitFailure(_) => "AcceleratorInitFailure",
            BenchError::AcceleratorState { .. } => "AcceleratorState",
            BenchError::Io { .. } => "Io",
        }
    }

    pub(crate) fn codec(phase: Phase) -> impl FnOnce(CodecError) -> BenchError {
        move |source| BenchError::CodecFailure { phase, source }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
