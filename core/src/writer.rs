use std::io::{self, Write};

use bytemuck::Pod;

use crate::{
    bitfield::{self, bytes_for, high_mask},
    error::{Error, Result},
    store::{FixedBuffer, Grower, Sink, stream},
};

/// Sequential MSB-first bit writer.
///
/// Buffer sinks hold every written bit, including the byte being filled, so
/// writing into them is "grow, then set bits in place". A stream sink only
/// takes whole bytes: up to seven bits wait in a pending byte until the next
/// write completes it, [`align`](Writer::align) or [`flush`](Writer::flush).
/// Dropping the writer does not flush.
pub struct Writer<'a> {
    sink: Sink<'a>,
    pos: usize,
    /// Bits not yet pushed to a stream sink, left-justified.
    pending: u8,
    pending_bits: u8,
}

impl<'a> Writer<'a> {
    pub fn new(sink: Sink<'a>) -> Self {
        Writer { sink, pos: 0, pending: 0, pending_bits: 0 }
    }

    pub fn fixed(buf: &'a mut [u8]) -> Self {
        Self::new(Sink::Fixed(FixedBuffer::new(buf)))
    }

    pub fn growable<G: Grower>(buf: &'a mut G) -> Self {
        Self::new(Sink::Growable(buf))
    }

    pub fn stream<W: Write>(dst: &'a mut W) -> Self {
        Self::new(Sink::Stream(dst))
    }

    /// Continues writing at bit `pos`. Bits already in a buffer before `pos`
    /// are kept. A stream can only be resumed on a byte boundary.
    pub fn with_position(mut sink: Sink<'a>, pos: usize) -> Self {
        assert!(
            !sink.is_stream() || pos & 7 == 0,
            "stream writers resume on a byte boundary, got bit {pos}"
        );
        if let Sink::Fixed(buf) = &mut sink {
            buf.keep(bytes_for(pos));
        }
        Writer { pos, ..Self::new(sink) }
    }

    /// Bits written so far, including any still pending.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_aligned(&self) -> bool {
        self.pos & 7 == 0
    }

    /// The buffer contents, final partial byte zero padded. `None` for
    /// streams.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.sink {
            Sink::Fixed(buf) => Some(buf.bytes()),
            Sink::Growable(g) => Some(g.bytes()),
            Sink::Stream(_) => None,
        }
    }

    /// Makes sure a buffer sink can hold `nbits` more bits. Streams have
    /// nothing to reserve.
    pub fn grow(&mut self, nbits: usize) -> Result<()> {
        match self.sink.grower() {
            Some(g) => reserve(g, end_byte(self.pos, nbits)?),
            None => Ok(()),
        }
    }

    /// Appends the top `nbits` (1..=8) bits of `byte`.
    pub fn write_bit_from_byte(&mut self, byte: u8, nbits: u8) -> Result<()> {
        assert!((1..=8).contains(&nbits), "expected 1..=8 bits, got {nbits}");
        let byte = byte & high_mask(nbits);
        match &mut self.sink {
            Sink::Stream(dst) => {
                let total = self.pending_bits + nbits;
                if total >= 8 {
                    stream::push(&mut **dst, self.pending | byte >> self.pending_bits)?;
                    self.pending = carry(byte, self.pending_bits);
                } else {
                    self.pending |= byte >> self.pending_bits;
                }
                self.pending_bits = total & 7;
            }
            Sink::Fixed(buf) => commit(buf, self.pos, byte, nbits)?,
            Sink::Growable(g) => commit(&mut **g, self.pos, byte, nbits)?,
        }
        self.pos += nbits as usize;
        Ok(())
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_bit_from_byte(byte, 8)
    }

    pub fn write_bool(&mut self, bit: bool) -> Result<()> {
        self.write_bit_from_byte(if bit { 0x80 } else { 0 }, 1)
    }

    /// Appends `nbits` bits taken MSB first from `src`.
    ///
    /// A buffer sink is grown for the whole run first, so the call either
    /// fits or changes nothing. A stream sink can fill up partway: the bytes
    /// pushed before that stay pushed and the error reports how many bits of
    /// `src` they carried.
    pub fn write_bits(&mut self, src: &[u8], nbits: usize) -> Result<()> {
        let nbytes = bytes_for(nbits);
        assert!(src.len() >= nbytes, "{nbits} bits need {nbytes} bytes, buffer has {}", src.len());
        self.grow(nbits).inspect_err(|_| {
            log::warn!("Failed to grow buffer for {nbits} bits at bit {}", self.pos)
        })?;
        let whole = nbits >> 3;
        for (i, &byte) in src[..whole].iter().enumerate() {
            self.write_byte(byte).map_err(|e| e.add_done(i * 8))?;
        }
        let rest = (nbits & 7) as u8;
        if rest != 0 {
            self.write_bit_from_byte(src[whole], rest).map_err(|e| e.add_done(whole * 8))?;
        }
        Ok(())
    }

    pub fn write_bit_field(&mut self, value: u64, nbits: usize) -> Result<()> {
        let mut scratch = [0u8; 8];
        bitfield::put_bit_field(&mut scratch, value, nbits);
        self.write_bits(&scratch[..bytes_for(nbits)], nbits)
    }

    /// Writes a plain-old-data value as its bytes in memory order.
    pub fn write_pod<T: Pod>(&mut self, value: &T) -> Result<()> {
        let bytes = bytemuck::bytes_of(value);
        self.write_bits(bytes, bytes.len() * 8)
    }

    /// Pads to the next byte boundary with zero bits.
    ///
    /// In a buffer the padding is already there, so the cursor moves once the
    /// buffer covers it.
    /// On a stream the pending byte has to be pushed out before a new one can
    /// start.
    pub fn align(&mut self) -> Result<()> {
        if self.sink.is_stream() {
            self.push_pending()
        } else {
            let padding = self.pos.wrapping_neg() & 7;
            self.grow(padding)?;
            self.pos += padding;
            log::trace!("Writer aligned to bit {}", self.pos);
            Ok(())
        }
    }

    /// Pushes a pending partial byte, zero padded, and flushes the stream.
    /// Does nothing for buffers.
    pub fn flush(&mut self) -> Result<()> {
        self.push_pending()?;
        match &mut self.sink {
            Sink::Stream(dst) => stream::flush(&mut **dst),
            _ => Ok(()),
        }
    }

    fn push_pending(&mut self) -> Result<()> {
        let Sink::Stream(dst) = &mut self.sink else {
            return Ok(());
        };
        if self.pending_bits == 0 {
            return Ok(());
        }
        stream::push(&mut **dst, self.pending)?;
        log::debug!("Flushed {} pending bits", self.pending_bits);
        self.pos += (8 - self.pending_bits) as usize;
        self.pending = 0;
        self.pending_bits = 0;
        Ok(())
    }
}

impl Write for Writer<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.write_bits(buf, buf.len() * 8) {
            Ok(()) => Ok(buf.len()),
            Err(e) if e.bits_done() >= 8 => Ok(e.bits_done() / 8),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Writer::flush(self).map_err(Into::into)
    }
}

fn reserve(g: &mut dyn Grower, need: usize) -> Result<()> {
    let have = g.bytes().len();
    if need > have {
        g.grow(need - have)?;
        log::trace!("Grew buffer to {need} bytes");
    }
    Ok(())
}

fn commit(g: &mut dyn Grower, pos: usize, byte: u8, nbits: u8) -> Result<()> {
    reserve(g, end_byte(pos, nbits as usize)?)?;
    put(g.bytes_mut(), pos, byte, nbits);
    Ok(())
}

/// Bytes a buffer needs to hold `nbits` more bits after `pos`.
fn end_byte(pos: usize, nbits: usize) -> Result<usize> {
    pos.checked_add(nbits).map(bytes_for).ok_or(Error::Capacity { written: 0 })
}

/// Sets `nbits` bits at `pos`, clearing whatever followed them in the byte.
fn put(buf: &mut [u8], pos: usize, byte: u8, nbits: u8) {
    let i = pos >> 3;
    let off = (pos & 7) as u8;
    buf[i] = (buf[i] & high_mask(off)) | byte >> off;
    if off + nbits > 8 {
        buf[i + 1] = byte << (8 - off);
    }
}

/// Bits of `byte` left over once `pending_bits` were needed to complete the
/// pending byte.
fn carry(byte: u8, pending_bits: u8) -> u8 {
    if pending_bits == 0 { 0 } else { byte << (8 - pending_bits) }
}
