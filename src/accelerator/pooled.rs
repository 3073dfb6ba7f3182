use super::Accelerator;
use crate::codec::multi::{decode_section, parse_sections, split_outputs};
use crate::error::CodecError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Accelerator backed by a dedicated rayon pool.
///
/// `init` builds the pool and allocates device-side staging memory for the
/// compressed stream and the decoded output. `decompress` uploads the
/// stream, decodes all sub sections in parallel on the pool and copies the
/// result back. Nothing runs on the caller's thread while the device works.
pub struct PooledDevice {
    threads: usize,
    resources: Option<DeviceResources>,
}

struct DeviceResources {
    pool: ThreadPool,
    staging: Vec<u8>,
    output: Vec<u8>,
}

fn device_buffer(len: usize) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| format!("cannot allocate {len} bytes of device memory"))?;
    buffer.resize(len, 0);
    Ok(buffer)
}

impl PooledDevice {
    /// `threads == 0` sizes the pool by the sub section count, capped at the
    /// available parallelism.
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            resources: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }
}

impl Default for PooledDevice {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Accelerator for PooledDevice {
    fn init(&mut self, input_len: usize, compressed_len: usize, sub_sections: u32) -> Result<(), String> {
        if self.resources.is_some() {
            return Err("device is already initialized".into());
        }
        if sub_sections == 0 {
            return Err("the accelerator needs at least one sub section".into());
        }
        let available = std::thread::available_parallelism().map_or(1, |n| n.get());
        let threads = if self.threads == 0 {
            (sub_sections as usize).min(available)
        } else {
            self.threads
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("rle8-device-{index}"))
            .build()
            .map_err(|e| e.to_string())?;
        let staging = device_buffer(compressed_len)?;
        let output = device_buffer(input_len)?;
        debug!(threads, compressed_len, input_len, "device resources acquired");
        self.resources = Some(DeviceResources {
            pool,
            staging,
            output,
        });
        Ok(())
    }

    fn decompress(&mut self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError> {
        let Some(device) = self.resources.as_mut() else {
            return Err(CodecError::Malformed {
                offset: 0,
                reason: "device is not initialized",
            });
        };
        if input.len() > device.staging.len() {
            return Err(CodecError::OutputTooSmall {
                needed: input.len(),
                available: device.staging.len(),
            });
        }
        if output.len() < expected_len {
            return Err(CodecError::OutputTooSmall {
                needed: expected_len,
                available: output.len(),
            });
        }

        let staging = &mut device.staging[..input.len()];
        staging.copy_from_slice(input);
        let staging = &*staging;

        let sections = parse_sections(staging, expected_len)?;
        let parts = split_outputs(&sections, &mut device.output, expected_len)?;
        let produced = device.pool.install(|| {
            sections
                .par_iter()
                .zip(parts.into_par_iter())
                .map(|(section, part)| decode_section(section, part))
                .try_reduce(|| 0, |a, b| Ok(a + b))
        })?;

        output[..expected_len].copy_from_slice(&device.output[..expected_len]);
        Ok(produced)
    }

    fn destroy(&mut self) {
        if let Some(device) = self.resources.take() {
            debug!(threads = device.pool.current_num_threads(), "device resources released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, MultiSectionCodec};
    use std::num::NonZeroU32;

    fn encode(input: &[u8], sections: u32) -> Vec<u8> {
        let codec = MultiSectionCodec::new(NonZeroU32::new(sections).unwrap());
        let mut out = vec![0u8; codec.compress_bounds(input.len())];
        let size = codec.compress(input, &mut out).unwrap();
        out.truncate(size);
        out
    }

    #[test]
    fn matches_host_decoding() {
        let input: Vec<u8> = (0..50_000u32).map(|i| (i / 7 % 13) as u8).collect();
        let compressed = encode(&input, 6);

        let mut device = PooledDevice::default();
        device.init(input.len(), compressed.len(), 6).unwrap();
        let mut out = vec![0u8; input.len()];
        assert_eq!(device.decompress(&compressed, &mut out, input.len()), Ok(input.len()));
        assert_eq!(out, input);
        device.destroy();
        assert!(!device.is_initialized());
    }

    #[test]
    fn rejects_streams_larger_than_staging() {
        let input = vec![1u8; 1_000];
        let compressed = encode(&input, 2);
        let mut device = PooledDevice::new(2);
        device.init(input.len(), compressed.len() - 1, 2).unwrap();
        let mut out = vec![0u8; input.len()];
        assert!(matches!(
            device.decompress(&compressed, &mut out, input.len()),
            Err(CodecError::OutputTooSmall { .. })
        ));
    }

    #[test]
    fn uninitialized_device_refuses_work() {
        let mut device = PooledDevice::default();
        let mut out = [0u8; 1];
        assert!(device.decompress(&[0; 8], &mut out, 1).is_err());
        assert!(device.init(1, 1, 0).is_err());
    }
}
