use std::io::{self, Read};

use bytemuck::{Pod, Zeroable};

use crate::{
    bitfield::{self, bytes_for, high_mask},
    error::{Error, Result},
    store::{Source, stream},
};

/// Sequential MSB-first bit reader.
///
/// Over a [`Source::Fixed`] buffer every read is checked against the buffer
/// length before anything is consumed, so a failed read leaves the cursor
/// where it was. Over a [`Source::Stream`] bytes are pulled one at a time and
/// the unconsumed bits of the last one are kept in a pending byte.
pub struct Reader<'a> {
    source: Source<'a>,
    pos: usize,
    /// Unconsumed bits of the last pulled byte, left-justified.
    pending: u8,
    pending_bits: u8,
}

impl<'a> Reader<'a> {
    pub fn new(source: Source<'a>) -> Self {
        Reader { source, pos: 0, pending: 0, pending_bits: 0 }
    }

    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self::new(Source::Fixed(buf))
    }

    pub fn from_stream<R: Read>(src: &'a mut R) -> Self {
        Self::new(Source::Stream(src))
    }

    /// Resumes reading `buf` at bit `pos`.
    pub fn with_position(buf: &'a [u8], pos: usize) -> Self {
        Reader { pos, ..Self::from_slice(buf) }
    }

    /// Bits consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bits left in a fixed buffer. Streams don't know.
    pub fn remaining_bits(&self) -> Option<usize> {
        match self.source {
            Source::Fixed(buf) => Some((buf.len() * 8).saturating_sub(self.pos)),
            Source::Stream(_) => None,
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.pos & 7 == 0
    }

    /// Reads the next `nbits` (1..=8) bits into the top of a byte.
    ///
    /// Nothing is consumed when fewer than `nbits` bits are left.
    pub fn read_bit_into_byte(&mut self, nbits: u8) -> Result<u8> {
        assert!((1..=8).contains(&nbits), "expected 1..=8 bits, got {nbits}");
        let byte = match &mut self.source {
            Source::Fixed(buf) => {
                if !fits(buf, self.pos, nbits as usize) {
                    return Err(Error::UnexpectedEof { read: 0 });
                }
                take(buf, self.pos, nbits)
            }
            Source::Stream(src) if self.pending_bits < nbits => {
                let Some(next) = stream::pull(&mut **src)? else {
                    return Err(Error::UnexpectedEof { read: 0 });
                };
                let mut window =
                    u16::from(self.pending) << 8 | u16::from(next) << (8 - self.pending_bits);
                let byte = (window >> 8) as u8 & high_mask(nbits);
                window <<= nbits;
                self.pending = (window >> 8) as u8;
                self.pending_bits = self.pending_bits + 8 - nbits;
                byte
            }
            Source::Stream(_) => {
                let byte = self.pending & high_mask(nbits);
                self.pending <<= nbits;
                self.pending_bits -= nbits;
                byte
            }
        };
        self.pos += nbits as usize;
        Ok(byte)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.read_bit_into_byte(8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_bit_into_byte(1)? != 0)
    }

    /// Reads `nbits` bits into the first `bytes_for(nbits)` bytes of `dst`.
    ///
    /// On a stream that runs dry partway, whatever was obtained is stored,
    /// zero padded, and the error says how many bits that was.
    pub fn read_bits(&mut self, dst: &mut [u8], nbits: usize) -> Result<()> {
        let nbytes = bytes_for(nbits);
        assert!(dst.len() >= nbytes, "{nbits} bits need {nbytes} bytes, buffer has {}", dst.len());
        if let Source::Fixed(buf) = self.source {
            if !fits(buf, self.pos, nbits) {
                return Err(Error::UnexpectedEof { read: 0 });
            }
        }
        let whole = nbits >> 3;
        for i in 0..whole {
            match self.read_bit_into_byte(8) {
                Ok(c) => dst[i] = c,
                Err(e) => return Err(self.cut_short(e, dst, i)),
            }
        }
        let rest = (nbits & 7) as u8;
        if rest != 0 {
            match self.read_bit_into_byte(rest) {
                Ok(c) => dst[whole] = c,
                Err(e) => return Err(self.cut_short(e, dst, whole)),
            }
        }
        Ok(())
    }

    /// Hands out the pending bits after a stream ran dry while filling
    /// `dst[index]`.
    fn cut_short(&mut self, err: Error, dst: &mut [u8], index: usize) -> Error {
        if !matches!(err, Error::UnexpectedEof { .. }) {
            return err.add_done(index * 8);
        }
        let read = index * 8 + self.pending_bits as usize;
        log::debug!("Stream source ran dry after {read} bits");
        dst[index] = self.pending;
        self.pos += self.pending_bits as usize;
        self.pending = 0;
        self.pending_bits = 0;
        Error::UnexpectedEof { read }
    }

    pub fn read_bit_field(&mut self, nbits: usize) -> Result<u64> {
        assert!(
            (1..=bitfield::MAX_WIDTH).contains(&nbits),
            "bit field width must be 1..={}, got {nbits}",
            bitfield::MAX_WIDTH
        );
        let mut scratch = [0u8; 8];
        self.read_bits(&mut scratch[..bytes_for(nbits)], nbits)?;
        Ok(bitfield::bit_field(&scratch, nbits))
    }

    /// Skips to the next byte boundary. On a stream the pending byte is
    /// dropped.
    pub fn align(&mut self) {
        match self.source {
            Source::Fixed(_) => self.pos = (self.pos + 7) & !7,
            Source::Stream(_) => {
                self.pos += self.pending_bits as usize;
                self.pending = 0;
                self.pending_bits = 0;
            }
        }
        log::trace!("Reader aligned to bit {}", self.pos);
    }

    /// Fills `dst` with whole bytes.
    ///
    /// On a fixed buffer this is all-or-nothing. A stream has no way to put
    /// bytes back, so a short stream consumes what it had and reports it.
    pub fn read_exact_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        if let Source::Fixed(buf) = self.source {
            if !fits(buf, self.pos, dst.len() * 8) {
                return Err(Error::UnexpectedEof { read: 0 });
            }
        }
        for (i, byte) in dst.iter_mut().enumerate() {
            *byte = self.read_byte().map_err(|e| e.add_done(i * 8))?;
        }
        Ok(())
    }

    /// Reads a plain-old-data value stored as bytes in memory order.
    pub fn read_pod<T: Pod>(&mut self) -> Result<T> {
        let mut value: T = Zeroable::zeroed();
        self.read_exact_bytes(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }
}

impl Read for Reader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        for (i, byte) in buf.iter_mut().enumerate() {
            match self.read_byte() {
                Ok(c) => *byte = c,
                Err(Error::UnexpectedEof { .. }) => return Ok(i),
                Err(_) if i > 0 => return Ok(i),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(buf.len())
    }
}

fn fits(buf: &[u8], pos: usize, nbits: usize) -> bool {
    pos.checked_add(nbits).is_some_and(|end| bytes_for(end) <= buf.len())
}

fn take(buf: &[u8], pos: usize, nbits: u8) -> u8 {
    let i = pos >> 3;
    let off = (pos & 7) as u8;
    let mut c = buf[i] << off;
    if off + nbits > 8 {
        c |= buf[i + 1] >> (8 - off);
    }
    c & high_mask(nbits)
}
