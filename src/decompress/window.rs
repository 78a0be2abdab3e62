//! Sliding dictionary window.
//!
//! Reconstructs the plaintext of one member: literals are appended, match
//! copies re-read bytes the window already holds. The buffer has exactly
//! the dictionary size declared in the member header, which need not be a
//! power of two, so wrap-around uses compares instead of masking.

use std::io;
use std::io::Write;

use crate::crc32;

/// Dictionary window and output staging area for one member.
///
/// Invariants: `stream_pos <= pos <= capacity`; bytes in
/// `stream_pos..pos` have been decoded but not yet written to the sink.
/// When `pos` reaches the capacity the window flushes and wraps.
pub struct DictWindow {
    buffer: Box<[u8]>,
    /// Current write position
    pos: usize,
    /// First byte not yet written to the sink
    stream_pos: usize,
    /// Bytes decoded in prior laps of the buffer
    partial_data_pos: u64,
    crc: u32,
    pos_wrapped: bool,
}

impl DictWindow {
    pub fn new(dictionary_size: usize) -> Self {
        // A fresh buffer is zeroed, so peeking behind the first literal
        // reads 0 even on corrupt input.
        Self {
            buffer: vec![0u8; dictionary_size].into_boxed_slice(),
            pos: 0,
            stream_pos: 0,
            partial_data_pos: 0,
            crc: 0xFFFF_FFFF,
            pos_wrapped: false,
        }
    }

    #[inline]
    pub fn dictionary_size(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn wrapped(&self) -> bool {
        self.pos_wrapped
    }

    /// Total bytes decoded so far in this member.
    #[inline]
    pub fn data_position(&self) -> u64 {
        self.partial_data_pos + self.pos as u64
    }

    /// CRC32 of the flushed data, finalised for comparison against the
    /// trailer.
    #[inline]
    pub fn crc(&self) -> u32 {
        self.crc ^ 0xFFFF_FFFF
    }

    /// Byte just before the write position; 0 before the first byte.
    #[inline]
    pub fn peek_prev(&self) -> u8 {
        let i = if self.pos > 0 {
            self.pos
        } else {
            self.buffer.len()
        };
        self.buffer[i - 1]
    }

    /// Byte `distance + 1` positions behind the write position.
    ///
    /// The caller guarantees `distance < dictionary_size` and that the
    /// window holds that many bytes (`distance < pos` or wrapped).
    #[inline]
    pub fn peek(&self, distance: usize) -> u8 {
        let i = if self.pos > distance {
            self.pos - distance - 1
        } else {
            self.buffer.len() + self.pos - distance - 1
        };
        self.buffer[i]
    }

    /// Append one literal byte, flushing if the buffer fills up.
    #[inline]
    pub fn put_byte<W: Write>(&mut self, sink: &mut W, b: u8) -> io::Result<()> {
        self.buffer[self.pos] = b;
        self.pos += 1;
        if self.pos >= self.buffer.len() {
            self.flush(sink)?;
        }
        Ok(())
    }

    /// Copy `len` bytes from `distance + 1` positions back.
    ///
    /// Source and destination may overlap; an overlapping copy repeats
    /// the overlapped bytes, so a distance-0 match of the last byte
    /// produces a run.
    pub fn copy_block<W: Write>(
        &mut self,
        sink: &mut W,
        distance: usize,
        len: usize,
    ) -> io::Result<()> {
        let mut len = len;
        let lpos = self.pos;
        let mut i;
        let fast;
        let fast2;
        if lpos > distance {
            i = lpos - distance - 1;
            fast = len < self.buffer.len() - lpos;
            fast2 = fast && len <= lpos - i;
        } else {
            i = self.buffer.len() + lpos - distance - 1;
            // i == lpos may happen here
            fast = len < self.buffer.len() - i;
            fast2 = fast && len <= i - lpos;
        }
        if fast {
            // no wrap
            self.pos += len;
            if fast2 {
                // no wrap, no overlap
                self.buffer.copy_within(i..i + len, lpos);
            } else {
                let mut lpos = lpos;
                while len > 0 {
                    self.buffer[lpos] = self.buffer[i];
                    lpos += 1;
                    i += 1;
                    len -= 1;
                }
            }
        } else {
            while len > 0 {
                self.buffer[self.pos] = self.buffer[i];
                self.pos += 1;
                if self.pos >= self.buffer.len() {
                    self.flush(sink)?;
                }
                i += 1;
                if i >= self.buffer.len() {
                    i = 0;
                }
                len -= 1;
            }
        }
        Ok(())
    }

    /// Write the pending bytes to the sink, updating the running CRC.
    /// Resets the write position and marks the window wrapped when the
    /// buffer is full.
    pub fn flush<W: Write>(&mut self, sink: &mut W) -> io::Result<()> {
        if self.pos > self.stream_pos {
            let chunk = &self.buffer[self.stream_pos..self.pos];
            self.crc = crc32::update_buf(self.crc, chunk);
            sink.write_all(chunk)?;
            if self.pos >= self.buffer.len() {
                self.partial_data_pos += self.pos as u64;
                self.pos = 0;
                self.pos_wrapped = true;
            }
            self.stream_pos = self.pos;
        }
        Ok(())
    }
}
