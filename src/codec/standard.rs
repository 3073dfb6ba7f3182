//! Standard RLE and its single-symbol form.
//!
//! Control byte below `0x80`: literal run of `c + 1` bytes. Control byte with
//! the high bit set: a run whose length is the low seven bits plus the
//! minimum run length, where `0x7F` is followed by a LEB128 extension. The
//! standard variant stores the run symbol after the length; the
//! single-symbol variant stores its symbol once after the header.

use super::stream::{Emitter, Sink, Source};
use super::{most_frequent_symbol, read_header, run_length, write_header, Codec};
use crate::bounds;
use crate::error::CodecError;

const MIN_RUN: usize = 3;
const MIN_SINGLE_RUN: usize = 2;
const LITERAL_CHUNK: usize = 128;
const RUN_FLAG: u8 = 0x80;
const EXTENDED: usize = 0x7F;

pub struct StandardCodec;

pub struct StandardSingleCodec;

fn put_literals(sink: &mut Sink<'_>, literals: &[u8]) -> Result<(), CodecError> {
    for chunk in literals.chunks(LITERAL_CHUNK) {
        sink.put((chunk.len() - 1) as u8)?;
        sink.put_slice(chunk)?;
    }
    Ok(())
}

fn put_run_length(sink: &mut Sink<'_>, extra: usize) -> Result<(), CodecError> {
    if extra < EXTENDED {
        sink.put(RUN_FLAG | extra as u8)
    } else {
        sink.put(RUN_FLAG | EXTENDED as u8)?;
        sink.put_varint(extra - EXTENDED)
    }
}

fn read_run_length(source: &mut Source<'_>, control: u8, min_run: usize) -> Result<usize, CodecError> {
    let short = (control & !RUN_FLAG) as usize;
    let extra = if short == EXTENDED {
        EXTENDED.saturating_add(source.varint()?)
    } else {
        short
    };
    Ok(extra.saturating_add(min_run))
}

/// Token stream without header. Also the section body of the multi-section
/// variant.
pub(crate) fn encode_body(input: &[u8], sink: &mut Sink<'_>) -> Result<(), CodecError> {
    let mut literal_start = 0;
    let mut i = 0;
    while i < input.len() {
        let run = run_length(&input[i..]);
        if run >= MIN_RUN {
            put_literals(sink, &input[literal_start..i])?;
            put_run_length(sink, run - MIN_RUN)?;
            sink.put(input[i])?;
            literal_start = i + run;
        }
        i += run;
    }
    put_literals(sink, &input[literal_start..])
}

pub(crate) fn decode_body(source: &mut Source<'_>, out: &mut Emitter<'_>) -> Result<(), CodecError> {
    while !source.is_empty() {
        let at = source.position();
        let control = source.byte()?;
        if control & RUN_FLAG == 0 {
            let literals = source.take(control as usize + 1)?;
            out.literals(literals, at)?;
        } else {
            let len = read_run_length(source, control, MIN_RUN)?;
            let symbol = source.byte()?;
            out.run(symbol, len, at)?;
        }
    }
    Ok(())
}

impl Codec for StandardCodec {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        let mut sink = Sink::new(output);
        write_header(&mut sink, input.len())?;
        encode_body(input, &mut sink)?;
        Ok(sink.position())
    }

    fn decompress(&self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError> {
        let mut source = Source::new(input);
        read_header(&mut source, expected_len)?;
        let mut out = Emitter::new(output, expected_len)?;
        decode_body(&mut source, &mut out)?;
        Ok(out.position())
    }

    fn compress_bounds(&self, input_len: usize) -> usize {
        bounds::compress_bounds(input_len)
    }
}

impl Codec for StandardSingleCodec {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        let symbol = most_frequent_symbol(input);
        let mut sink = Sink::new(output);
        write_header(&mut sink, input.len())?;
        sink.put(symbol)?;

        let mut literal_start = 0;
        let mut i = 0;
        while i < input.len() {
            let run = run_length(&input[i..]);
            if input[i] == symbol && run >= MIN_SINGLE_RUN {
                put_literals(&mut sink, &input[literal_start..i])?;
                put_run_length(&mut sink, run - MIN_SINGLE_RUN)?;
                literal_start = i + run;
            }
            i += run;
        }
        put_literals(&mut sink, &input[literal_start..])?;
        Ok(sink.position())
    }

    fn decompress(&self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError> {
        let mut source = Source::new(input);
        read_header(&mut source, expected_len)?;
        let symbol = source.byte()?;
        let mut out = Emitter::new(output, expected_len)?;
        while !source.is_empty() {
            let at = source.position();
            let control = source.byte()?;
            if control & RUN_FLAG == 0 {
                let literals = source.take(control as usize + 1)?;
                out.literals(literals, at)?;
            } else {
                let len = read_run_length(&mut source, control, MIN_SINGLE_RUN)?;
                out.run(symbol, len, at)?;
            }
        }
        Ok(out.position())
    }

    fn compress_bounds(&self, input_len: usize) -> usize {
        bounds::compress_bounds(input_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress_with(codec: &dyn Codec, input: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; codec.compress_bounds(input.len())];
        let size = codec.compress(input, &mut out).unwrap();
        out.truncate(size);
        out
    }

    #[test]
    fn short_run_is_two_bytes() {
        let compressed = compress_with(&StandardCodec, &[7, 7, 7]);
        assert_eq!(&compressed[4..], &[RUN_FLAG, 7]);
    }

    #[test]
    fn long_run_uses_extension() {
        let compressed = compress_with(&StandardCodec, &vec![1u8; 1_000]);
        // header, extended control, two varint bytes, symbol
        assert_eq!(compressed.len(), 4 + 1 + 2 + 1);
        assert_eq!(compressed[4], 0xFF);
    }

    #[test]
    fn literals_are_chunked_at_128() {
        let input: Vec<u8> = (0..=255u8).collect();
        let compressed = compress_with(&StandardCodec, &input);
        assert_eq!(compressed.len(), 4 + 2 + 256);
        assert_eq!(compressed[4], 127);
        assert_eq!(compressed[4 + 129], 127);
    }

    #[test]
    fn single_symbol_leaves_other_runs_literal() {
        let input = b"aaaaaaaabbbbc".to_vec();
        let compressed = compress_with(&StandardSingleCodec, &input);
        assert_eq!(compressed[4], b'a');
        assert_eq!(compressed[5], RUN_FLAG | 6);
        assert_eq!(&compressed[6..], &[4, b'b', b'b', b'b', b'b', b'c']);

        let mut out = vec![0u8; input.len()];
        let produced = StandardSingleCodec
            .decompress(&compressed, &mut out, input.len())
            .unwrap();
        assert_eq!((produced, out), (input.len(), input));
    }

    #[test]
    fn run_past_expected_length_is_rejected() {
        // header says 2 bytes, body holds a run of 3
        let stream = [2, 0, 0, 0, RUN_FLAG, 5];
        let mut out = [0u8; 8];
        assert!(matches!(
            StandardCodec.decompress(&stream, &mut out, 2),
            Err(CodecError::Malformed { .. })
        ));
    }
}
