//! Buffer sizing oracle.
//!
//! Worst-case compressed sizes per variant family and the decode headroom the
//! extreme decoders need. These numbers are the only thing standing between a
//! codec and an out-of-bounds write, so every bound here is an upper bound for
//! incompressible input and is monotonic in the input length.

use crate::mode::CodecVariant;

/// Extra bytes the extreme decoders may write past the logical end.
pub const EXTREME_DECOMPRESS_HEADROOM: usize = 16;

/// Bytes of the per-section size table entry in a multi-section stream.
pub(crate) const SECTION_ENTRY_SIZE: usize = 4;

/// Upper bound for Standard, Ultra and their single-symbol forms.
pub fn compress_bounds(input_len: usize) -> usize {
    input_len
        .saturating_add(input_len >> 6)
        .saturating_add(16)
}

/// Upper bound for both extreme variants.
pub fn extreme_compress_bounds(input_len: usize) -> usize {
    input_len
        .saturating_add(input_len >> 7)
        .saturating_add(16)
}

/// Upper bound for the multi-section variant. Every section carries its own
/// table entry and literal framing.
pub fn multi_compress_bounds(sub_sections: u32, input_len: usize) -> usize {
    compress_bounds(input_len).saturating_add((sub_sections as usize).saturating_mul(2 * SECTION_ENTRY_SIZE))
}

pub fn extreme_decompress_additional_size() -> usize {
    EXTREME_DECOMPRESS_HEADROOM
}

/// Minimum compression destination capacity for `variant`, excluding headroom.
pub fn capacity_for(variant: CodecVariant, input_len: usize) -> usize {
    match variant {
        CodecVariant::Standard
        | CodecVariant::StandardSingleSymbol
        | CodecVariant::Ultra
        | CodecVariant::UltraSingleSymbol => compress_bounds(input_len),
        CodecVariant::ExtremeSingle | CodecVariant::ExtremeMulti => {
            extreme_compress_bounds(input_len)
        }
        CodecVariant::MultiSection { sub_sections } => {
            multi_compress_bounds(sub_sections.get(), input_len)
        }
    }
}

/// Trailing bytes a decode destination needs beyond the original length.
pub fn decompression_headroom(variant: CodecVariant) -> usize {
    match variant {
        CodecVariant::ExtremeSingle | CodecVariant::ExtremeMulti => {
            extreme_decompress_additional_size()
        }
        _ => 0,
    }
}

/// Capacities of the three benchmark buffers for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPlan {
    pub input_len: usize,
    pub headroom: usize,
    /// Compression destination: bound plus headroom.
    pub compressed_capacity: usize,
    /// Decompression destination: original length plus headroom.
    pub decompressed_capacity: usize,
}

impl BufferPlan {
    pub fn for_variant(variant: CodecVariant, input_len: usize) -> Self {
        let headroom = decompression_headroom(variant);
        Self {
            input_len,
            headroom,
            compressed_capacity: capacity_for(variant, input_len).saturating_add(headroom),
            decompressed_capacity: input_len.saturating_add(headroom),
        }
    }

    /// Bytes the compressor may use, i.e. the capacity without headroom.
    pub fn compress_limit(&self) -> usize {
        self.compressed_capacity - self.headroom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::num::NonZeroU32;

    const SIZES: [usize; 9] = [0, 1, 2, 15, 127, 128, 4096, 65_537, 1 << 24];

    fn variants() -> [CodecVariant; 7] {
        CodecVariant::all(NonZeroU32::new(4).unwrap())
    }

    #[test]
    fn bounds_cover_raw_input_at_every_size() {
        for variant in variants() {
            for len in SIZES {
                assert!(capacity_for(variant, len) > len, "{variant} at {len}");
            }
        }
    }

    #[test]
    fn bounds_are_monotonic() {
        for variant in variants() {
            let mut previous = 0;
            for len in (0..10_000).step_by(37).chain(SIZES) {
                if len < previous {
                    continue;
                }
                assert!(capacity_for(variant, len) >= capacity_for(variant, previous));
                previous = len;
            }
        }
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    #[case(1024)]
    fn multi_section_bound_exceeds_standard(#[case] sections: u32) {
        for len in SIZES {
            assert!(multi_compress_bounds(sections, len) > compress_bounds(len));
        }
        assert!(multi_compress_bounds(sections + 1, 4096) > multi_compress_bounds(sections, 4096));
    }

    #[rstest]
    #[case(CodecVariant::Standard, 0)]
    #[case(CodecVariant::StandardSingleSymbol, 0)]
    #[case(CodecVariant::Ultra, 0)]
    #[case(CodecVariant::UltraSingleSymbol, 0)]
    #[case(CodecVariant::ExtremeSingle, EXTREME_DECOMPRESS_HEADROOM)]
    #[case(CodecVariant::ExtremeMulti, EXTREME_DECOMPRESS_HEADROOM)]
    #[case(CodecVariant::MultiSection { sub_sections: NonZeroU32::MIN }, 0)]
    fn headroom_is_reserved_in_both_destinations(#[case] variant: CodecVariant, #[case] headroom: usize) {
        assert_eq!(decompression_headroom(variant), headroom);
        for len in SIZES {
            let plan = BufferPlan::for_variant(variant, len);
            assert_eq!(plan.decompressed_capacity, len + headroom);
            assert_eq!(plan.compressed_capacity, capacity_for(variant, len) + headroom);
            assert_eq!(plan.compress_limit(), capacity_for(variant, len));
        }
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        assert_eq!(compress_bounds(usize::MAX), usize::MAX);
        assert_eq!(multi_compress_bounds(u32::MAX, usize::MAX - 1), usize::MAX);
    }
}
