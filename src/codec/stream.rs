//! Bounds-checked cursors shared by all codec variants.

use crate::error::CodecError;

/// Write cursor over a compression destination.
pub(crate) struct Sink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Sink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn reserve(&self, n: usize) -> Result<(), CodecError> {
        if self.buf.len() - self.pos < n {
            return Err(CodecError::OutputTooSmall {
                needed: self.pos.saturating_add(n),
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn put(&mut self, byte: u8) -> Result<(), CodecError> {
        self.reserve(1)?;
        self.buf[self.pos] = byte;
        self.pos += 1;
        Ok(())
    }

    #[inline]
    pub fn put_slice(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.reserve(bytes.len())?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<(), CodecError> {
        self.put_slice(&value.to_le_bytes())
    }

    /// LEB128.
    pub fn put_varint(&mut self, mut value: usize) -> Result<(), CodecError> {
        while value >= 0x80 {
            self.put((value as u8) | 0x80)?;
            value >>= 7;
        }
        self.put(value as u8)
    }

    /// Reserves `n` zeroed bytes to be patched later.
    pub fn skip(&mut self, n: usize) -> Result<(), CodecError> {
        self.reserve(n)?;
        self.buf[self.pos..self.pos + n].fill(0);
        self.pos += n;
        Ok(())
    }

    /// Overwrites four already written bytes at `at`.
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        debug_assert!(at + 4 <= self.pos);
        self.buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

/// Read cursor over a compressed stream.
pub(crate) struct Source<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Source<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn truncated(&self) -> CodecError {
        CodecError::Truncated {
            offset: self.buf.len(),
        }
    }

    #[inline]
    pub fn byte(&mut self) -> Result<u8, CodecError> {
        let byte = *self.buf.get(self.pos).ok_or_else(|| self.truncated())?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.buf.len() - self.pos < n {
            return Err(self.truncated());
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Up to `wide` bytes starting at the cursor, provided at least `n` are
    /// available. Does not advance.
    pub fn peek_wide(&self, n: usize, wide: usize) -> Result<&'a [u8], CodecError> {
        let available = self.buf.len() - self.pos;
        if available < n {
            return Err(self.truncated());
        }
        Ok(&self.buf[self.pos..self.pos + wide.min(available)])
    }

    pub fn u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn varint(&mut self) -> Result<usize, CodecError> {
        let start = self.pos;
        let mut value: u64 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.byte()?;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return usize::try_from(value).map_err(|_| CodecError::Malformed {
                    offset: start,
                    reason: "length does not fit in memory",
                });
            }
        }
        Err(CodecError::Malformed {
            offset: start,
            reason: "length field longer than five bytes",
        })
    }
}

/// Write cursor over a decompression destination whose logical end is the
/// expected original length.
pub(crate) struct Emitter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    end: usize,
}

impl<'a> Emitter<'a> {
    pub fn new(buf: &'a mut [u8], end: usize) -> Result<Self, CodecError> {
        Self::with_headroom(buf, end, 0)
    }

    /// Requires `headroom` writable bytes past `end`.
    pub fn with_headroom(buf: &'a mut [u8], end: usize, headroom: usize) -> Result<Self, CodecError> {
        let needed = end.saturating_add(headroom);
        if buf.len() < needed {
            return Err(CodecError::OutputTooSmall {
                needed,
                available: buf.len(),
            });
        }
        Ok(Self { buf, pos: 0, end })
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn claim(&self, len: usize, at: usize) -> Result<(), CodecError> {
        if len > self.end - self.pos {
            return Err(CodecError::Malformed {
                offset: at,
                reason: "token overruns the expected length",
            });
        }
        Ok(())
    }

    #[inline]
    pub fn literals(&mut self, bytes: &[u8], at: usize) -> Result<(), CodecError> {
        self.claim(bytes.len(), at)?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    #[inline]
    pub fn run(&mut self, symbol: u8, len: usize, at: usize) -> Result<(), CodecError> {
        self.claim(len, at)?;
        self.buf[self.pos..self.pos + len].fill(symbol);
        self.pos += len;
        Ok(())
    }

    /// Copies `len` literals in `stride` sized steps. Bytes past the literal
    /// run are scratch and get overwritten by the following token.
    #[inline]
    pub fn wide_literals(&mut self, source: &mut Source<'_>, len: usize, stride: usize, at: usize) -> Result<(), CodecError> {
        let wide = round_up(len, stride);
        let bytes = source.peek_wide(len, wide)?;
        self.claim(len, at)?;
        let n = if bytes.len() == wide && self.pos + wide <= self.buf.len() {
            wide
        } else {
            len
        };
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        source.take(len)?;
        self.pos += len;
        Ok(())
    }

    /// Fills a run in `stride` sized steps, spilling into the headroom.
    #[inline]
    pub fn wide_run(&mut self, symbol: u8, len: usize, stride: usize, at: usize) -> Result<(), CodecError> {
        self.claim(len, at)?;
        let stop = (self.pos + round_up(len, stride)).min(self.buf.len());
        self.buf[self.pos..stop].fill(symbol);
        self.pos += len;
        Ok(())
    }
}

#[inline]
fn round_up(n: usize, stride: usize) -> usize {
    n.div_ceil(stride) * stride
}
