//! Extreme RLE: nibble packed tokens for density, decoded in wide strides.
//!
//! Token byte: literal count in the high nibble, run code in the low nibble.
//! A nibble of 15 is followed by a LEB128 extension. Run code 0 means no run,
//! otherwise the run length is `code + min_run - 1`. Layout:
//! `token, [literal extension], literals, [symbol], [run extension]`, where
//! the symbol is only present in the multi-symbol variant.
//!
//! The decoder writes literals and runs in 16 byte strides and may spill up
//! to [`EXTREME_DECOMPRESS_HEADROOM`] bytes past the expected length.

use super::stream::{Emitter, Sink, Source};
use super::{most_frequent_symbol, read_header, run_length, write_header, Codec};
use crate::bounds::{self, EXTREME_DECOMPRESS_HEADROOM};
use crate::error::CodecError;

const MIN_RUN: usize = 3;
const MIN_SINGLE_RUN: usize = 2;
const NIBBLE_EXTENDED: usize = 15;
const STRIDE: usize = EXTREME_DECOMPRESS_HEADROOM;

pub struct ExtremeSingleCodec;

pub struct ExtremeMultiCodec;

fn put_token(
    sink: &mut Sink<'_>,
    literals: &[u8],
    run: usize,
    symbol: Option<u8>,
    min_run: usize,
) -> Result<(), CodecError> {
    let literal_code = literals.len().min(NIBBLE_EXTENDED);
    let run_value = if run == 0 { 0 } else { run - min_run + 1 };
    let run_code = run_value.min(NIBBLE_EXTENDED);

    sink.put(((literal_code << 4) | run_code) as u8)?;
    if literal_code == NIBBLE_EXTENDED {
        sink.put_varint(literals.len() - NIBBLE_EXTENDED)?;
    }
    sink.put_slice(literals)?;
    if run > 0 {
        if let Some(symbol) = symbol {
            sink.put(symbol)?;
        }
        if run_code == NIBBLE_EXTENDED {
            sink.put_varint(run_value - NIBBLE_EXTENDED)?;
        }
    }
    Ok(())
}

fn encode(input: &[u8], sink: &mut Sink<'_>, single: Option<u8>) -> Result<(), CodecError> {
    let min_run = if single.is_some() { MIN_SINGLE_RUN } else { MIN_RUN };
    let mut literal_start = 0;
    let mut i = 0;
    while i < input.len() {
        let run = run_length(&input[i..]);
        let symbol = input[i];
        if run >= min_run && single.map_or(true, |s| s == symbol) {
            let inline = if single.is_some() { None } else { Some(symbol) };
            put_token(sink, &input[literal_start..i], run, inline, min_run)?;
            literal_start = i + run;
        }
        i += run;
    }
    if literal_start < input.len() {
        put_token(sink, &input[literal_start..], 0, None, min_run)?;
    }
    Ok(())
}

fn decode(source: &mut Source<'_>, out: &mut Emitter<'_>, single: Option<u8>) -> Result<(), CodecError> {
    let min_run = if single.is_some() { MIN_SINGLE_RUN } else { MIN_RUN };
    while !source.is_empty() {
        let at = source.position();
        let token = source.byte()?;

        let mut literals = (token >> 4) as usize;
        if literals == NIBBLE_EXTENDED {
            literals = literals.saturating_add(source.varint()?);
        }
        if literals > 0 {
            out.wide_literals(source, literals, STRIDE, at)?;
        }

        let run_code = (token & 0x0F) as usize;
        if run_code > 0 {
            let symbol = match single {
                Some(symbol) => symbol,
                None => source.byte()?,
            };
            let mut run = run_code;
            if run_code == NIBBLE_EXTENDED {
                run = run.saturating_add(source.varint()?);
            }
            out.wide_run(symbol, run.saturating_add(min_run - 1), STRIDE, at)?;
        }
    }
    Ok(())
}

impl Codec for ExtremeSingleCodec {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        let symbol = most_frequent_symbol(input);
        let mut sink = Sink::new(output);
        write_header(&mut sink, input.len())?;
        sink.put(symbol)?;
        encode(input, &mut sink, Some(symbol))?;
        Ok(sink.position())
    }

    fn decompress(&self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError> {
        let mut source = Source::new(input);
        read_header(&mut source, expected_len)?;
        let symbol = source.byte()?;
        let mut out = Emitter::with_headroom(output, expected_len, EXTREME_DECOMPRESS_HEADROOM)?;
        decode(&mut source, &mut out, Some(symbol))?;
        Ok(out.position())
    }

    fn compress_bounds(&self, input_len: usize) -> usize {
        bounds::extreme_compress_bounds(input_len)
    }

    fn decompression_headroom(&self) -> usize {
        EXTREME_DECOMPRESS_HEADROOM
    }
}

impl Codec for ExtremeMultiCodec {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        let mut sink = Sink::new(output);
        write_header(&mut sink, input.len())?;
        encode(input, &mut sink, None)?;
        Ok(sink.position())
    }

    fn decompress(&self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError> {
        let mut source = Source::new(input);
        read_header(&mut source, expected_len)?;
        let mut out = Emitter::with_headroom(output, expected_len, EXTREME_DECOMPRESS_HEADROOM)?;
        decode(&mut source, &mut out, None)?;
        Ok(out.position())
    }

    fn compress_bounds(&self, input_len: usize) -> usize {
        bounds::extreme_compress_bounds(input_len)
    }

    fn decompression_headroom(&self) -> usize {
        EXTREME_DECOMPRESS_HEADROOM
    }
}
