//! Mode resolution: raw benchmark flags to a validated configuration and the
//! codec variant it selects.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Flags as received from the command line, not yet validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeFlags {
    pub sub_sections: Option<i64>,
    pub repetitions: Option<i64>,
    pub single_symbol: bool,
    pub ultra: bool,
    pub extreme: bool,
}

/// Validated mode configuration. Immutable once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    sub_sections: u32,
    single_symbol: bool,
    ultra: bool,
    extreme: bool,
    repetitions: NonZeroU32,
}

/// The closed set of codec variants a configuration can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecVariant {
    Standard,
    StandardSingleSymbol,
    Ultra,
    UltraSingleSymbol,
    ExtremeSingle,
    ExtremeMulti,
    MultiSection { sub_sections: NonZeroU32 },
}

fn positive_u32(value: i64, what: &str) -> Result<u32> {
    if value <= 0 {
        return Err(BenchError::InvalidConfiguration(format!(
            "{what} must be positive, got {value}"
        )));
    }
    u32::try_from(value).map_err(|_| {
        BenchError::InvalidConfiguration(format!("{what} {value} is out of range"))
    })
}

impl ModeFlags {
    /// Validates the flag combination. Runs before any buffer is sized.
    pub fn resolve(self) -> Result<ModeConfig> {
        let sub_sections = match self.sub_sections {
            Some(n) => positive_u32(n, "sub section count")?,
            None => 0,
        };
        let repetitions = match self.repetitions {
            Some(n) => positive_u32(n, "run count")?,
            None => 1,
        };

        if sub_sections != 0 {
            if self.single_symbol {
                return Err(BenchError::InvalidConfiguration(
                    "single symbol encoding is only available without sub sections".into(),
                ));
            }
            if self.ultra {
                return Err(BenchError::InvalidConfiguration(
                    "ultra mode encoding is only available without sub sections".into(),
                ));
            }
            if self.extreme {
                return Err(BenchError::InvalidConfiguration(
                    "extreme mode encoding is only available without sub sections".into(),
                ));
            }
        }

        if self.ultra && self.extreme {
            return Err(BenchError::InvalidConfiguration(
                "extreme mode and ultra mode cannot be used at the same time".into(),
            ));
        }

        Ok(ModeConfig {
            sub_sections,
            single_symbol: self.single_symbol,
            ultra: self.ultra,
            extreme: self.extreme,
            repetitions: NonZeroU32::new(repetitions).unwrap_or(NonZeroU32::MIN),
        })
    }
}

impl ModeConfig {
    /// Configuration that selects `variant` directly.
    pub fn for_variant(variant: CodecVariant, repetitions: NonZeroU32) -> Self {
        let (sub_sections, single_symbol, ultra, extreme) = match variant {
            CodecVariant::Standard => (0, false, false, false),
            CodecVariant::StandardSingleSymbol => (0, true, false, false),
            CodecVariant::Ultra => (0, false, true, false),
            CodecVariant::UltraSingleSymbol => (0, true, true, false),
            CodecVariant::ExtremeSingle => (0, true, false, true),
            CodecVariant::ExtremeMulti => (0, false, false, true),
            CodecVariant::MultiSection { sub_sections } => (sub_sections.get(), false, false, false),
        };
        Self {
            sub_sections,
            single_symbol,
            ultra,
            extreme,
            repetitions,
        }
    }

    pub fn repetitions(&self) -> NonZeroU32 {
        self.repetitions
    }

    /// The codec variant this configuration selects.
    pub fn variant(&self) -> CodecVariant {
        if let Some(sub_sections) = NonZeroU32::new(self.sub_sections) {
            return CodecVariant::MultiSection { sub_sections };
        }
        match (self.extreme, self.ultra, self.single_symbol) {
            (true, _, true) => CodecVariant::ExtremeSingle,
            (true, _, false) => CodecVariant::ExtremeMulti,
            (false, true, true) => CodecVariant::UltraSingleSymbol,
            (false, true, false) => CodecVariant::Ultra,
            (false, false, true) => CodecVariant::StandardSingleSymbol,
            (false, false, false) => CodecVariant::Standard,
        }
    }
}

impl CodecVariant {
    /// All seven variants, the multi-section one using `sub_sections`.
    pub fn all(sub_sections: NonZeroU32) -> [CodecVariant; 7] {
        [
            CodecVariant::Standard,
            CodecVariant::StandardSingleSymbol,
            CodecVariant::Ultra,
            CodecVariant::UltraSingleSymbol,
            CodecVariant::ExtremeSingle,
            CodecVariant::ExtremeMulti,
            CodecVariant::MultiSection { sub_sections },
        ]
    }

    /// Whether an accelerator decoder exists for this variant.
    pub fn has_accelerator_path(&self) -> bool {
        matches!(self, CodecVariant::MultiSection { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            CodecVariant::Standard => "rle8",
            CodecVariant::StandardSingleSymbol => "rle8-single",
            CodecVariant::Ultra => "rle8-ultra",
            CodecVariant::UltraSingleSymbol => "rle8-ultra-single",
            CodecVariant::ExtremeSingle => "rle8-extreme-single",
            CodecVariant::ExtremeMulti => "rle8-extreme-multi",
            CodecVariant::MultiSection { .. } => "rle8m",
        }
    }
}

impl fmt::Display for CodecVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecVariant::MultiSection { sub_sections } => {
                write!(f, "{} ({} sub sections)", self.name(), sub_sections)
            }
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn flags(sub_sections: Option<i64>, single: bool, ultra: bool, extreme: bool) -> ModeFlags {
        ModeFlags {
            sub_sections,
            repetitions: None,
            single_symbol: single,
            ultra,
            extreme,
        }
    }

    #[rstest]
    #[case::single_with_sections(flags(Some(4), true, false, false))]
    #[case::ultra_with_sections(flags(Some(4), false, true, false))]
    #[case::extreme_with_sections(flags(Some(4), false, false, true))]
    #[case::ultra_and_extreme(flags(None, false, true, true))]
    #[case::ultra_and_extreme_single(flags(None, true, true, true))]
    #[case::zero_sections(flags(Some(0), false, false, false))]
    #[case::negative_sections(flags(Some(-3), false, false, false))]
    #[case::oversized_sections(flags(Some(i64::from(u32::MAX) + 1), false, false, false))]
    fn conflicting_flags_are_rejected(#[case] raw: ModeFlags) {
        let err = raw.resolve().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)), "{err}");
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn non_positive_repetitions_are_rejected(#[case] runs: i64) {
        let raw = ModeFlags {
            repetitions: Some(runs),
            ..ModeFlags::default()
        };
        assert!(matches!(raw.resolve(), Err(BenchError::InvalidConfiguration(_))));
    }

    #[rstest]
    #[case(flags(None, false, false, false), CodecVariant::Standard)]
    #[case(flags(None, true, false, false), CodecVariant::StandardSingleSymbol)]
    #[case(flags(None, false, true, false), CodecVariant::Ultra)]
    #[case(flags(None, true, true, false), CodecVariant::UltraSingleSymbol)]
    #[case(flags(None, true, false, true), CodecVariant::ExtremeSingle)]
    #[case(flags(None, false, false, true), CodecVariant::ExtremeMulti)]
    #[case(
        flags(Some(4), false, false, false),
        CodecVariant::MultiSection { sub_sections: NonZeroU32::new(4).unwrap() }
    )]
    fn accepted_flags_select_one_variant(#[case] raw: ModeFlags, #[case] expected: CodecVariant) {
        let config = raw.resolve().expect("combination is valid");
        assert_eq!(config.variant(), expected);
        assert_eq!(config.repetitions().get(), 1);
    }

    #[test]
    fn for_variant_round_trips_through_variant() {
        let runs = NonZeroU32::new(3).unwrap();
        for variant in CodecVariant::all(NonZeroU32::new(7).unwrap()) {
            let config = ModeConfig::for_variant(variant, runs);
            assert_eq!(config.variant(), variant);
            assert_eq!(config.repetitions(), runs);
        }
    }

    #[test]
    fn only_multi_section_has_accelerator_path() {
        let with_path: Vec<_> = CodecVariant::all(NonZeroU32::MIN)
            .into_iter()
            .filter(CodecVariant::has_accelerator_path)
            .collect();
        assert_eq!(with_path.len(), 1);
    }
}
