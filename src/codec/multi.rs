//! Multi-section RLE.
//!
//! The input is split into `n` sections of `len / n` bytes, the last one
//! taking the remainder, and every section is encoded independently with the
//! standard token stream. Layout: `len:u32, n:u32, n * size:u32, bodies`.
//! Independent sections are what lets the accelerator decode them in
//! parallel.

use super::standard;
use super::stream::{Emitter, Sink, Source};
use super::{read_header, write_header, Codec};
use crate::bounds::{self, SECTION_ENTRY_SIZE};
use crate::error::CodecError;
use std::num::NonZeroU32;
use std::ops::Range;

pub struct MultiSectionCodec {
    sub_sections: NonZeroU32,
}

/// One encoded section and the part of the output it decodes into.
pub(crate) struct Section<'a> {
    pub body: &'a [u8],
    pub output: Range<usize>,
}

/// Decoded length of every section for an input of `input_len` bytes.
pub(crate) fn section_lengths(input_len: usize, sub_sections: usize) -> impl Iterator<Item = usize> {
    let base = input_len / sub_sections;
    let last = input_len - base * (sub_sections - 1);
    (0..sub_sections).map(move |index| if index + 1 == sub_sections { last } else { base })
}

/// Parses header and size table, borrowing every section body.
pub(crate) fn parse_sections(input: &[u8], expected_len: usize) -> Result<Vec<Section<'_>>, CodecError> {
    let mut source = Source::new(input);
    read_header(&mut source, expected_len)?;
    let count = source.u32()? as usize;
    if count == 0 {
        return Err(CodecError::Malformed {
            offset: 4,
            reason: "stream declares zero sub sections",
        });
    }
    let table_len = count.checked_mul(SECTION_ENTRY_SIZE).ok_or(CodecError::Malformed {
        offset: 4,
        reason: "sub section table does not fit in memory",
    })?;
    let table = source.take(table_len)?;

    let mut sections = Vec::with_capacity(count);
    let mut start = 0;
    for (entry, len) in table
        .chunks_exact(SECTION_ENTRY_SIZE)
        .zip(section_lengths(expected_len, count))
    {
        let size = u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]) as usize;
        sections.push(Section {
            body: source.take(size)?,
            output: start..start + len,
        });
        start += len;
    }
    if !source.is_empty() {
        return Err(CodecError::Malformed {
            offset: source.position(),
            reason: "trailing bytes after the last sub section",
        });
    }
    Ok(sections)
}

/// Splits the first `expected_len` bytes of `output` into the disjoint
/// per-section destinations.
pub(crate) fn split_outputs<'o>(
    sections: &[Section<'_>],
    output: &'o mut [u8],
    expected_len: usize,
) -> Result<Vec<&'o mut [u8]>, CodecError> {
    if output.len() < expected_len {
        return Err(CodecError::OutputTooSmall {
            needed: expected_len,
            available: output.len(),
        });
    }
    let mut rest = &mut output[..expected_len];
    let mut parts = Vec::with_capacity(sections.len());
    for section in sections {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(section.output.len());
        parts.push(head);
        rest = tail;
    }
    Ok(parts)
}

/// Decodes one section into its destination, returning the produced length.
pub(crate) fn decode_section(section: &Section<'_>, output: &mut [u8]) -> Result<usize, CodecError> {
    let len = output.len();
    let mut source = Source::new(section.body);
    let mut out = Emitter::new(output, len)?;
    standard::decode_body(&mut source, &mut out)?;
    Ok(out.position())
}

impl MultiSectionCodec {
    pub fn new(sub_sections: NonZeroU32) -> Self {
        Self { sub_sections }
    }
}

impl Codec for MultiSectionCodec {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        let count = self.sub_sections.get() as usize;
        let mut sink = Sink::new(output);
        write_header(&mut sink, input.len())?;
        sink.put_u32(self.sub_sections.get())?;
        let table = sink.position();
        sink.skip(count.saturating_mul(SECTION_ENTRY_SIZE))?;

        let mut offset = 0;
        for (index, len) in section_lengths(input.len(), count).enumerate() {
            let start = sink.position();
            standard::encode_body(&input[offset..offset + len], &mut sink)?;
            let size = sink.position() - start;
            let size = u32::try_from(size).map_err(|_| CodecError::InputTooLarge(size))?;
            sink.patch_u32(table + index * SECTION_ENTRY_SIZE, size);
            offset += len;
        }
        Ok(sink.position())
    }

    fn decompress(&self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError> {
        let sections = parse_sections(input, expected_len)?;
        let parts = split_outputs(&sections, output, expected_len)?;
        let mut produced = 0;
        for (section, part) in sections.iter().zip(parts) {
            produced += decode_section(section, part)?;
        }
        Ok(produced)
    }

    fn compress_bounds(&self, input_len: usize) -> usize {
        bounds::multi_compress_bounds(self.sub_sections.get(), input_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(n: u32) -> MultiSectionCodec {
        MultiSectionCodec::new(NonZeroU32::new(n).unwrap())
    }

    #[test]
    fn last_section_takes_the_remainder() {
        assert_eq!(section_lengths(10, 4).collect::<Vec<_>>(), vec![2, 2, 2, 4]);
        assert_eq!(section_lengths(2, 5).collect::<Vec<_>>(), vec![0, 0, 0, 0, 2]);
        assert_eq!(section_lengths(9, 1).collect::<Vec<_>>(), vec![9]);
    }

    #[test]
    fn more_sections_than_bytes_round_trips() {
        let input = b"abc".to_vec();
        let codec = codec(8);
        let mut compressed = vec![0u8; codec.compress_bounds(input.len())];
        let size = codec.compress(&input, &mut compressed).unwrap();
        let mut out = vec![0u8; 3];
        assert_eq!(codec.decompress(&compressed[..size], &mut out, 3), Ok(3));
        assert_eq!(out, input);
    }

    #[test]
    fn table_records_section_sizes() {
        let input = vec![0u8; 100];
        let codec = codec(2);
        let mut compressed = vec![0u8; codec.compress_bounds(input.len())];
        let size = codec.compress(&input, &mut compressed).unwrap();
        let sections = parse_sections(&compressed[..size], 100).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].output, 0..50);
        assert_eq!(sections[1].output, 50..100);
        // a run of 50 zeroes is one control byte and the symbol
        assert!(sections.iter().all(|s| s.body.len() == 2));
    }

    #[test]
    fn trailing_garbage_is_malformed() {
        let input = vec![1u8; 10];
        let codec = codec(2);
        let mut compressed = vec![0u8; codec.compress_bounds(input.len()) + 1];
        let size = codec.compress(&input, &mut compressed).unwrap();
        let mut out = vec![0u8; 10];
        assert!(matches!(
            codec.decompress(&compressed[..size + 1], &mut out, 10),
            Err(CodecError::Malformed { .. })
        ));
    }
}
