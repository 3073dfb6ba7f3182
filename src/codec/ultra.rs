//! Ultra RLE: every field is a whole byte so the decoder never branches on
//! bit fields.
//!
//! Token layout: `literal_count:u8, literals, run_length:u8` followed by the
//! run symbol when the run is non-empty. The single-symbol form stores its
//! symbol once after the header and omits it from the tokens.

use super::stream::{Emitter, Sink, Source};
use super::{most_frequent_symbol, read_header, run_length, write_header, Codec};
use crate::bounds;
use crate::error::CodecError;

const MIN_RUN: usize = 3;
const MIN_SINGLE_RUN: usize = 2;
const MAX_FIELD: usize = u8::MAX as usize;

pub struct UltraCodec;

pub struct UltraSingleCodec;

fn put_token(sink: &mut Sink<'_>, literals: &[u8], run: usize, symbol: Option<u8>) -> Result<(), CodecError> {
    sink.put(literals.len() as u8)?;
    sink.put_slice(literals)?;
    sink.put(run as u8)?;
    match symbol {
        Some(symbol) if run > 0 => sink.put(symbol),
        _ => Ok(()),
    }
}

/// `single` selects the run symbol of the single-symbol form; `None` encodes
/// runs of any symbol with the symbol inline.
fn encode(input: &[u8], sink: &mut Sink<'_>, single: Option<u8>) -> Result<(), CodecError> {
    let min_run = if single.is_some() { MIN_SINGLE_RUN } else { MIN_RUN };
    let mut literal_start = 0;
    let mut i = 0;
    while i < input.len() {
        let run = run_length(&input[i..]);
        let symbol = input[i];
        if run >= min_run && single.map_or(true, |s| s == symbol) {
            let inline = if single.is_some() { None } else { Some(symbol) };
            let mut chunks = input[literal_start..i].chunks(MAX_FIELD);
            let mut literals = chunks.next_back().unwrap_or(&[]);
            for chunk in chunks {
                put_token(sink, chunk, 0, None)?;
            }
            let mut remaining = run;
            while remaining >= min_run {
                let take = remaining.min(MAX_FIELD);
                put_token(sink, literals, take, inline)?;
                literals = &[];
                remaining -= take;
            }
            literal_start = i + run - remaining;
        }
        i += run;
    }
    for chunk in input[literal_start..].chunks(MAX_FIELD) {
        put_token(sink, chunk, 0, None)?;
    }
    Ok(())
}

fn decode(source: &mut Source<'_>, out: &mut Emitter<'_>, single: Option<u8>) -> Result<(), CodecError> {
    while !source.is_empty() {
        let at = source.position();
        let count = source.byte()? as usize;
        let literals = source.take(count)?;
        out.literals(literals, at)?;
        let run = source.byte()? as usize;
        if run > 0 {
            let symbol = match single {
                Some(symbol) => symbol,
                None => source.byte()?,
            };
            out.run(symbol, run, at)?;
        }
    }
    Ok(())
}

impl Codec for UltraCodec {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        let mut sink = Sink::new(output);
        write_header(&mut sink, input.len())?;
        encode(input, &mut sink, None)?;
        Ok(sink.position())
    }

    fn decompress(&self, input: &[u8], output: &mut [u8], expected_len: usize) -> Result<usize, CodecError> {
        let mut source = Source::new(input);
        read_header(&mut source, expected_len)?;
        let mut out = Emitter::new(output, expected_len)?;
        decode(&mut source, &mut out, None)?;
        Ok(out.position())
    }

    fn compress_bounds(&self, input_len: usize) -> usize {
        bounds::compress_bounds(input_len)
    }
}

impl Codec for UltraSingleCodec {
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
        let mut out = Emitter::new(output, expected_len)?;
        decode(&mut source, &mut out, Some(symbol))?;
        Ok(out.position())
    }

    fn compress_bounds(&self, input_len: usize) -> usize {
        bounds::compress_bounds(input_len)
    }
}
