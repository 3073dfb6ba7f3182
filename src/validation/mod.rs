//! Round-trip validation.

use crate::error::{BenchError, Phase, Result};

/// Result of a byte-for-byte comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Match,
    Mismatch {
        offset: usize,
        expected: u8,
        actual: u8,
    },
}

/// Compares exactly `length` bytes of `original` and `reconstructed`.
///
/// Both slices must hold at least `length` bytes.
pub fn validate(original: &[u8], reconstructed: &[u8], length: usize) -> ValidationOutcome {
    let original = &original[..length];
    let reconstructed = &reconstructed[..length];
    if original == reconstructed {
        return ValidationOutcome::Match;
    }
    original
        .iter()
        .zip(reconstructed)
        .enumerate()
        .find(|(_, (a, b))| a != b)
        .map_or(ValidationOutcome::Match, |(offset, (&expected, &actual))| {
            ValidationOutcome::Mismatch {
                offset,
                expected,
                actual,
            }
        })
}

/// Size check followed by the byte comparison. A size mismatch skips the
/// byte scan.
pub fn check_round_trip(phase: Phase, original: &[u8], reconstructed: &[u8], produced: usize) -> Result<()> {
    if produced != original.len() {
        return Err(BenchError::SizeMismatch {
            phase,
            expected: original.len(),
            actual: produced,
        });
    }
    match validate(original, reconstructed, produced) {
        ValidationOutcome::Match => Ok(()),
        ValidationOutcome::Mismatch {
            offset,
            expected,
            actual,
        } => Err(BenchError::ByteMismatch {
            phase,
            offset,
            expected,
            actual,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_match() {
        assert_eq!(validate(b"abc", b"abcdef", 3), ValidationOutcome::Match);
    }

    #[test]
    fn reports_first_differing_offset() {
        assert_eq!(
            validate(b"abcdef", b"abXdeY", 6),
            ValidationOutcome::Mismatch {
                offset: 2,
                expected: b'c',
                actual: b'X'
            }
        );
    }

    #[test]
    fn bytes_past_length_are_ignored() {
        assert_eq!(validate(b"ab\0\0", b"ab\xff\xff", 2), ValidationOutcome::Match);
    }

    #[test]
    fn size_mismatch_skips_the_scan() {
        let err = check_round_trip(Phase::Decompress, b"abcd", b"zz", 2).unwrap_err();
        assert!(matches!(
            err,
            BenchError::SizeMismatch { expected: 4, actual: 2, .. }
        ));
    }

    #[test]
    fn byte_mismatch_is_reported() {
        let err = check_round_trip(Phase::AcceleratorDecompress, b"abcd", b"abce", 4).unwrap_err();
        assert!(matches!(
            err,
            BenchError::ByteMismatch { offset: 3, expected: b'd', actual: b'e', .. }
        ));
    }
}
