//! Range decoder for the coded member body.
//!
//! Consumes bytes lazily from an [`io::Read`] source through an internal
//! refill buffer and turns them into model-weighted bits. Only I/O errors
//! surface here; running off the end of the input yields `0xFF` filler
//! bytes so a truncated member keeps decoding until the driver notices
//! the end of the source.

use std::io;
use std::io::Read;

use super::bit_model::{BitModel, BIT_MODEL_MOVE_BITS, BIT_MODEL_TOTAL, BIT_MODEL_TOTAL_BITS};
use super::{LenModel, LEN_LOW_BITS, LEN_LOW_SYMBOLS, LEN_MID_BITS, LEN_MID_SYMBOLS};
use super::{LEN_HIGH_BITS, MIN_MATCH_LEN};

/// Refill buffer size.
const BUFFER_SIZE: usize = 1 << 16;

/// Arithmetic decoder over a byte source.
///
/// One `RangeDecoder` is shared by all members of a stream; call
/// [`reset_member_position`](Self::reset_member_position) at each member
/// boundary so [`member_position`](Self::member_position) counts bytes of
/// the current member only.
pub struct RangeDecoder<R> {
    source: R,
    buffer: Box<[u8]>,
    /// Next unread byte in `buffer`
    pos: usize,
    /// Number of valid bytes in `buffer`
    stream_pos: usize,
    /// Bytes consumed before the current buffer, relative to the member start
    partial_member_pos: u64,
    code: u32,
    range: u32,
    at_stream_end: bool,
}

impl<R: Read> RangeDecoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            buffer: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            stream_pos: 0,
            partial_member_pos: 0,
            code: 0,
            range: 0,
            at_stream_end: false,
        }
    }

    /// Refill the buffer from the source. Returns whether unread bytes
    /// are available afterwards.
    fn read_block(&mut self) -> io::Result<bool> {
        if !self.at_stream_end {
            let mut filled = 0;
            while filled < self.buffer.len() {
                match self.source.read(&mut self.buffer[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
            self.at_stream_end = filled < self.buffer.len();
            self.partial_member_pos = self.partial_member_pos.wrapping_add(self.pos as u64);
            self.stream_pos = filled;
            self.pos = 0;
        }
        Ok(self.pos < self.stream_pos)
    }

    /// True when the source is exhausted and no unread bytes remain.
    pub fn finished(&mut self) -> io::Result<bool> {
        if self.pos < self.stream_pos {
            return Ok(false);
        }
        Ok(!self.read_block()?)
    }

    /// Bytes consumed since the start of the current member.
    #[inline]
    pub fn member_position(&self) -> u64 {
        self.partial_member_pos.wrapping_add(self.pos as u64)
    }

    /// Restart the member byte counter at the current position.
    pub fn reset_member_position(&mut self) {
        self.partial_member_pos = 0u64.wrapping_sub(self.pos as u64);
    }

    /// Next input byte; `0xFF` once the source is exhausted.
    #[inline]
    fn get_byte(&mut self) -> io::Result<u8> {
        if self.finished()? {
            return Ok(0xFF);
        }
        let b = self.buffer[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Copy raw bytes out of the refill buffer, e.g. member headers and
    /// trailers between coded bodies. Returns how many bytes were
    /// actually available.
    pub fn read_data(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut sz = 0;
        while sz < out.len() && !self.finished()? {
            let rd = (out.len() - sz).min(self.stream_pos - self.pos);
            out[sz..sz + rd].copy_from_slice(&self.buffer[self.pos..self.pos + rd]);
            self.pos += rd;
            sz += rd;
        }
        Ok(sz)
    }

    /// Seed `code` from the 5 bytes that start every coded body, also
    /// used to re-seed after a Sync Flush marker.
    ///
    /// Returns `false` if the first byte is non-zero and `ignore_marking`
    /// is disabled.
    pub fn load(&mut self, ignore_marking: bool) -> io::Result<bool> {
        self.code = 0;
        self.range = 0xFFFF_FFFF;
        if self.get_byte()? != 0 && !ignore_marking {
            return Ok(false);
        }
        for _ in 0..4 {
            self.code = (self.code << 8) | u32::from(self.get_byte()?);
        }
        Ok(true)
    }

    #[inline]
    pub fn normalize(&mut self) -> io::Result<()> {
        if self.range <= 0x00FF_FFFF {
            self.range <<= 8;
            self.code = (self.code << 8) | u32::from(self.get_byte()?);
        }
        Ok(())
    }

    /// Decode `num_bits` equiprobable bits, MSB first.
    pub fn decode(&mut self, num_bits: u32) -> io::Result<u32> {
        let mut symbol = 0u32;
        for _ in 0..num_bits {
            self.normalize()?;
            self.range >>= 1;
            let bit = (self.code >= self.range) as u32;
            symbol = (symbol << 1) + bit;
            self.code -= self.range & 0u32.wrapping_sub(bit);
        }
        Ok(symbol)
    }

    /// Decode one bit against an adaptive probability, updating it.
    #[inline]
    pub fn decode_bit(&mut self, bm: &mut BitModel) -> io::Result<u32> {
        self.normalize()?;
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * bm.probability;
        if self.code < bound {
            self.range = bound;
            bm.probability += (BIT_MODEL_TOTAL - bm.probability) >> BIT_MODEL_MOVE_BITS;
            Ok(0)
        } else {
            self.range -= bound;
            self.code -= bound;
            bm.probability -= bm.probability >> BIT_MODEL_MOVE_BITS;
            Ok(1)
        }
    }

    /// Walk a binary tree of `num_bits` levels, accumulating the symbol
    /// MSB first.
    pub fn decode_tree(&mut self, bm: &mut [BitModel], num_bits: u32) -> io::Result<u32> {
        let mut symbol = 1usize;
        for _ in 0..num_bits {
            symbol = (symbol << 1) | self.decode_bit(&mut bm[symbol])? as usize;
        }
        Ok((symbol - (1 << num_bits)) as u32)
    }

    /// Tree walk accumulating the symbol with reversed bit order, as the
    /// low distance bits are stored.
    pub fn decode_tree_reversed(&mut self, bm: &mut [BitModel], num_bits: u32) -> io::Result<u32> {
        let mut model = 1usize;
        let mut symbol = 0u32;
        for i in 0..num_bits {
            let bit = self.decode_bit(&mut bm[model])?;
            model = (model << 1) + bit as usize;
            symbol |= bit << i;
        }
        Ok(symbol)
    }

    /// Decode a literal predicted against `match_byte`, the byte at the
    /// most recent match distance.
    ///
    /// Each bit selects its probability group by the corresponding bit of
    /// `match_byte` until the decoded bit diverges from it; from then on
    /// the byte completes as a plain literal.
    pub fn decode_matched(&mut self, bm: &mut [BitModel], match_byte: u8) -> io::Result<u8> {
        let mut symbol = 1usize;
        let mut match_byte = usize::from(match_byte);
        while symbol < 0x100 {
            match_byte <<= 1;
            let match_bit = match_byte & 0x100;
            let bit = self.decode_bit(&mut bm[0x100 + match_bit + symbol])? as usize;
            symbol = (symbol << 1) | bit;
            if match_bit != bit << 8 {
                while symbol < 0x100 {
                    symbol = (symbol << 1) | self.decode_bit(&mut bm[symbol])? as usize;
                }
                break;
            }
        }
        Ok((symbol & 0xFF) as u8)
    }

    /// Decode a match length in `2..=273`.
    pub fn decode_len(&mut self, lm: &mut LenModel, pos_state: usize) -> io::Result<usize> {
        if self.decode_bit(&mut lm.choice1)? == 0 {
            let low = self.decode_tree(&mut lm.low[pos_state], LEN_LOW_BITS)?;
            return Ok(MIN_MATCH_LEN + low as usize);
        }
        if self.decode_bit(&mut lm.choice2)? == 0 {
            let mid = self.decode_tree(&mut lm.mid[pos_state], LEN_MID_BITS)?;
            return Ok(MIN_MATCH_LEN + LEN_LOW_SYMBOLS + mid as usize);
        }
        let high = self.decode_tree(&mut lm.high, LEN_HIGH_BITS)?;
        Ok(MIN_MATCH_LEN + LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS + high as usize)
    }
}
