use proptest::prelude::*;
use rle8_benchmark_rs::bounds::{capacity_for, decompression_headroom, BufferPlan};
use rle8_benchmark_rs::codec;
use rle8_benchmark_rs::mode::CodecVariant;
use rle8_benchmark_rs::validation::{validate, ValidationOutcome};
use std::num::NonZeroU32;

/// Inputs built from runs, so both literal and run tokens show up.
fn run_heavy_input() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec((0u8..6, 1usize..600), 1..40).prop_map(|runs| {
        runs.into_iter()
            .flat_map(|(symbol, len)| std::iter::repeat(symbol).take(len))
            .collect()
    })
}

fn any_input() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 1..4096),
        run_heavy_input(),
    ]
}

fn any_variant() -> impl Strategy<Value = CodecVariant> {
    (0usize..7, 1u32..17).prop_map(|(index, n)| {
        CodecVariant::all(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))[index]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn round_trip_holds_within_bounds(input in any_input(), variant in any_variant()) {
        let plan = BufferPlan::for_variant(variant, input.len());
        let mut compressed = vec![0u8; plan.compressed_capacity];
        let size = codec::compress(variant, &input, &mut compressed[..plan.compress_limit()]).unwrap();
        prop_assert!(size > 0);
        prop_assert!(size <= capacity_for(variant, input.len()));

        let mut output = vec![0u8; plan.decompressed_capacity];
        let produced = codec::decompress(variant, &compressed[..size], &mut output, input.len()).unwrap();
        prop_assert_eq!(produced, input.len());
        prop_assert_eq!(validate(&input, &output, produced), ValidationOutcome::Match);
    }

    #[test]
    fn headroom_is_all_the_decoder_needs(input in run_heavy_input(), single in any::<bool>()) {
        let variant = if single { CodecVariant::ExtremeSingle } else { CodecVariant::ExtremeMulti };
        let plan = BufferPlan::for_variant(variant, input.len());
        prop_assert_eq!(plan.decompressed_capacity, input.len() + decompression_headroom(variant));

        let mut compressed = vec![0u8; plan.compressed_capacity];
        let size = codec::compress(variant, &input, &mut compressed[..plan.compress_limit()]).unwrap();
        let mut output = vec![0u8; plan.decompressed_capacity];
        prop_assert!(codec::decompress(variant, &compressed[..size], &mut output, input.len()).is_ok());
    }

    #[test]
    fn bounds_never_shrink(len in 0usize..(1 << 30), variant in any_variant()) {
        prop_assert!(capacity_for(variant, len) >= len);
        prop_assert!(capacity_for(variant, len + 1) >= capacity_for(variant, len));
    }
}
