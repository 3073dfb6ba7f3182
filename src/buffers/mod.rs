use crate::bounds::BufferPlan;
use crate::error::{BenchError, Result};
use tracing::debug;

/// Fixed-capacity byte buffer with a logical used length.
///
/// The capacity never changes after allocation and `used() <= capacity()`
/// holds at all times.
#[derive(Debug)]
pub struct Buffer {
    data: Vec<u8>,
    used: usize,
}

impl Buffer {
    /// Allocates `capacity` zeroed bytes, reporting failure instead of aborting.
    pub fn zeroed(capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| BenchError::AllocationFailure { bytes: capacity })?;
        data.resize(capacity, 0);
        Ok(Self { data, used: 0 })
    }

    /// Takes ownership of already loaded bytes; all of them are in use.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let used = data.len();
        Self { data, used }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn used(&self) -> usize {
        self.used
    }

    /// The logically used bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// Whole capacity, headroom included.
    pub fn full(&self) -> &[u8] {
        &self.data
    }

    pub fn full_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The first `limit` bytes of the capacity, for writers that must not
    /// touch the headroom.
    pub fn limited_mut(&mut self, limit: usize) -> &mut [u8] {
        let limit = limit.min(self.data.len());
        &mut self.data[..limit]
    }

    /// Records how many bytes are in use. Clamped to the capacity.
    pub fn set_used(&mut self, used: usize) {
        debug_assert!(used <= self.data.len());
        self.used = used.min(self.data.len());
    }

    /// Zeroes the whole capacity and marks it unused.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.used = 0;
    }
}

/// The three buffers of a run: original input, compression destination and
/// decompression destination.
#[derive(Debug)]
pub struct BenchBuffers {
    pub input: Buffer,
    pub compressed: Buffer,
    pub decompressed: Buffer,
}

impl BenchBuffers {
    pub fn allocate(plan: &BufferPlan, input: Vec<u8>) -> Result<Self> {
        debug_assert_eq!(plan.input_len, input.len());
        debug!(
            input = plan.input_len,
            compressed = plan.compressed_capacity,
            decompressed = plan.decompressed_capacity,
            headroom = plan.headroom,
            "allocating benchmark buffers"
        );
        Ok(Self {
            input: Buffer::from_vec(input),
            compressed: Buffer::zeroed(plan.compressed_capacity)?,
            decompressed: Buffer::zeroed(plan.decompressed_capacity)?,
        })
    }
}
