pub mod accelerator;
pub mod benchmark;
pub mod benchmark_utils;
pub mod bounds;
pub mod buffers;
pub mod codec;
pub mod dataset;
pub mod error;
pub mod mode;
pub mod platform;
pub mod sampling;
pub mod timing;
pub mod validation;

pub use benchmark::{run, run_with_device, BenchmarkReport, RunOptions};
pub use error::{BenchError, CodecError, Phase, Result};
pub use mode::{CodecVariant, ModeConfig, ModeFlags};
