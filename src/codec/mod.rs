//! Codec dispatch and the seven RLE codec variants.
//!
//! Every stream starts with the original length as a little-endian `u32`.
//! Failures are reported through [`CodecError`]; a produced length is only
//! ever returned on success, so an empty result is never confused with a
//! failure.

pub mod extreme;
pub mod multi;
pub mod standard;
pub(crate) mod stream;
pub mod ultra;

use crate::bounds;
use crate::error::CodecError;
use crate::mode::CodecVariant;
use std::cmp::Reverse;
use stream::{Sink, Source};

pub use extreme::{ExtremeMultiCodec, ExtremeSingleCodec};
pub use multi::MultiSectionCodec;
pub use standard::{StandardCodec, StandardSingleCodec};
pub use ultra::{UltraCodec, UltraSingleCodec};

/// Capability set shared by all codec variants.
pub trait Codec {
    /// Compresses `input` into `output`, returning the compressed length.
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError>;

    /// Decompresses `input` into `output`, returning the produced length.
    ///
    /// `output` must hold `expected_len` plus [`Codec::decompression_headroom`]
    /// bytes. A clean stream that ends early yields a length below
    /// `expected_len` rather than an error.
    fn decompress(&self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError>;

    /// Worst-case compressed size for `input_len` bytes.
    fn compress_bounds(&self, input_len: usize) -> usize;

    /// Bytes the decoder may write past the logical end.
    fn decompression_headroom(&self) -> usize {
        0
    }
}

impl Codec for CodecVariant {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        match *self {
            CodecVariant::Standard => StandardCodec.compress(input, output),
            CodecVariant::StandardSingleSymbol => StandardSingleCodec.compress(input, output),
            CodecVariant::Ultra => UltraCodec.compress(input, output),
            CodecVariant::UltraSingleSymbol => UltraSingleCodec.compress(input, output),
            CodecVariant::ExtremeSingle => ExtremeSingleCodec.compress(input, output),
            CodecVariant::ExtremeMulti => ExtremeMultiCodec.compress(input, output),
            CodecVariant::MultiSection { sub_sections } => {
                MultiSectionCodec::new(sub_sections).compress(input, output)
            }
        }
    }

    fn decompress(&self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError> {
        match *self {
            CodecVariant::Standard => StandardCodec.decompress(input, output, expected_len),
            CodecVariant::StandardSingleSymbol => {
                StandardSingleCodec.decompress(input, output, expected_len)
            }
            CodecVariant::Ultra => UltraCodec.decompress(input, output, expected_len),
            CodecVariant::UltraSingleSymbol => UltraSingleCodec.decompress(input, output, expected_len),
            CodecVariant::ExtremeSingle => ExtremeSingleCodec.decompress(input, output, expected_len),
            CodecVariant::ExtremeMulti => ExtremeMultiCodec.decompress(input, output, expected_len),
            CodecVariant::MultiSection { sub_sections } => {
                MultiSectionCodec::new(sub_sections).decompress(input, output, expected_len)
            }
        }
    }

    fn compress_bounds(&self, input_len: usize) -> usize {
        bounds::capacity_for(*self, input_len)
    }

    fn decompression_headroom(&self) -> usize {
        bounds::decompression_headroom(*self)
    }
}

/// Compresses with the codec selected by `variant`.
pub fn compress(variant: CodecVariant, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    Codec::compress(&variant, input, output)
}

/// Decompresses with the codec selected by `variant`.
pub fn decompress(
    variant: CodecVariant,
    input: &[u8],
    output: &mut [u8],
    expected_len: usize,
) -> Result<usize, CodecError> {
    Codec::decompress(&variant, input, output, expected_len)
}

/// Most frequent byte of `data`, lowest value on ties.
pub fn most_frequent_symbol(data: &[u8]) -> u8 {
    let mut histogram = [0usize; 256];
    for &byte in data {
        histogram[byte as usize] += 1;
    }
    (0..256usize)
        .max_by_key(|&symbol| (histogram[symbol], Reverse(symbol)))
        .map_or(0, |symbol| symbol as u8)
}

/// Length of the run of identical bytes at the start of `data`.
#[inline]
pub(crate) fn run_length(data: &[u8]) -> usize {
    match data.first() {
        Some(&symbol) => data.iter().take_while(|&&byte| byte == symbol).count(),
        None => 0,
    }
}

pub(crate) fn write_header(sink: &mut Sink<'_>, input_len: usize) -> Result<(), CodecError> {
    let len = u32::try_from(input_len).map_err(|_| CodecError::InputTooLarge(input_len))?;
    sink.put_u32(len)
}

pub(crate) fn read_header(source: &mut Source<'_>, expected_len: usize) -> Result<(), CodecError> {
    let len = source.u32()?;
    if len as usize != expected_len {
        return Err(CodecError::Malformed {
            offset: 0,
            reason: "length header does not match the expected length",
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_data {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Inputs that stress literal framing, run framing and their transitions.
    pub fn corpus() -> Vec<Vec<u8>> {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let random: Vec<u8> = (0..5_000).map(|_| rng.gen::<u8>()).collect();
        let mut mixed = Vec::new();
        while mixed.len() < 20_000 {
            let symbol = rng.gen_range(0..4u8);
            let len = rng.gen_range(1..300);
            mixed.extend(std::iter::repeat(symbol).take(len));
        }
        vec![
            vec![42],
            vec![1, 2],
            vec![9; 3],
            b"aab".repeat(400),
            b"aaab".repeat(400),
            b"xaaaa".repeat(300),
            vec![0; 100_000],
            (0..=255u8).cycle().take(70_000).collect(),
            random,
            mixed,
        ]
    }
}
