//! lzip member decompression.
//!
//! This module implements the decoding half of the LZMA variant wrapped by
//! the lzip container: an adaptive range coder drives a small grammar of
//! literals, matches and repeated matches into a sliding dictionary
//! window.
//!
//! ## Architecture
//!
//! The decompression pipeline:
//!
//! ```text
//! Compressed Data
//!       ↓
//! ┌──────────────┐
//! │ RangeDecoder │ ← Arithmetic coder over the byte stream
//! └──────────────┘
//!       ↓
//! ┌──────────────┐
//! │ Bit models   │ ← Adaptive probabilities, state machine
//! └──────────────┘
//!       ↓
//! ┌──────────────┐
//! │ LzDecoder    │ ← Expand literals and back-references
//! └──────────────┘
//!       ↓
//! ┌──────────────┐
//! │ DictWindow   │ ← Sliding window, CRC, flush to sink
//! └──────────────┘
//!       ↓
//! Decompressed Data
//! ```
//!
//! [`decode_stream`] loops [`LzDecoder::decode_member`] over all members
//! of a file, verifying each trailer on the way.
//!
//! ## Performance Notes
//!
//! - The window allocates the member's declared dictionary size, up to
//!   512 MiB.
//! - All probability models live on the stack of one `decode_member`
//!   call (about 30 KiB) and are reset between members.

mod bit_model;
mod lz_decoder;
mod range_decoder;
mod state;
mod window;

#[cfg(test)]
pub(crate) mod member_builder;

pub use bit_model::{BitModel, LenModel};
pub use lz_decoder::{decode_stream, LzDecoder, StreamStats};
pub use range_decoder::RangeDecoder;
pub use state::State;
pub use window::DictWindow;

use std::fmt;
use std::io;

/// Smallest dictionary size a header may declare (4 KiB).
pub const MIN_DICTIONARY_SIZE: usize = 1 << 12;

/// Largest dictionary size a header may declare (512 MiB).
pub const MAX_DICTIONARY_SIZE: usize = 1 << 29;

/// Smallest possible member: header, empty body, trailer.
pub const MIN_MEMBER_SIZE: usize = 36;

pub(crate) const LITERAL_CONTEXT_BITS: u32 = 3;
pub(crate) const POS_STATE_BITS: u32 = 2;
pub(crate) const POS_STATES: usize = 1 << POS_STATE_BITS;
pub(crate) const POS_STATE_MASK: usize = POS_STATES - 1;

pub(crate) const LEN_STATES: usize = 4;
pub(crate) const DIS_SLOT_BITS: u32 = 6;
pub(crate) const START_DIS_MODEL: u32 = 4;
pub(crate) const END_DIS_MODEL: u32 = 14;
pub(crate) const MODELED_DISTANCES: usize = 1 << (END_DIS_MODEL / 2); // 128
pub(crate) const DIS_ALIGN_BITS: u32 = 4;
pub(crate) const DIS_ALIGN_SIZE: usize = 1 << DIS_ALIGN_BITS;

pub(crate) const LEN_LOW_BITS: u32 = 3;
pub(crate) const LEN_MID_BITS: u32 = 3;
pub(crate) const LEN_HIGH_BITS: u32 = 8;
pub(crate) const LEN_LOW_SYMBOLS: usize = 1 << LEN_LOW_BITS;
pub(crate) const LEN_MID_SYMBOLS: usize = 1 << LEN_MID_BITS;
pub(crate) const LEN_HIGH_SYMBOLS: usize = 1 << LEN_HIGH_BITS;

/// Shortest coded match length.
pub(crate) const MIN_MATCH_LEN: usize = 2;

#[inline]
pub(crate) fn get_len_state(len: usize) -> usize {
    (len - MIN_MATCH_LEN).min(LEN_STATES - 1)
}

#[inline]
pub(crate) fn get_lit_state(prev_byte: u8) -> usize {
    usize::from(prev_byte >> (8 - LITERAL_CONTEXT_BITS))
}

/// Options controlling how strictly streams are decoded and indexed.
///
/// The defaults match what archives in the wild need: empty members and
/// trailing data are tolerated, a non-zero first body byte ("marking
/// data") is tolerated, and trailing bytes that look like a corrupt
/// header are rejected.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Accept members whose uncompressed size is zero.
    pub ignore_empty: bool,
    /// Accept a non-zero first byte in the coded body.
    pub ignore_marking: bool,
    /// Accept bytes after the last member.
    pub ignore_trailing: bool,
    /// Accept trailing bytes even when they look like a corrupt header.
    pub loose_trailing: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            ignore_empty: true,
            ignore_marking: true,
            ignore_trailing: true,
            loose_trailing: false,
        }
    }
}

/// Detailed disagreement between a member trailer and the decoded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailerMismatch {
    /// The input ended before the full 20 trailer bytes; missing bytes
    /// were taken as zero.
    pub truncated: bool,
    pub stored_crc: u32,
    pub computed_crc: u32,
    pub stored_data_size: u64,
    pub computed_data_size: u64,
    pub stored_member_size: u64,
    pub computed_member_size: u64,
}

/// Outcome of decoding a single member.
#[derive(Debug)]
pub enum MemberError {
    /// The coded stream reached an impossible distance or state.
    Decoder {
        /// Bytes of the member consumed when the error was detected.
        position: u64,
    },
    /// The input ended before the End-Of-Stream marker.
    UnexpectedEof {
        /// Bytes of the member consumed when the end was hit.
        position: u64,
    },
    /// The trailer disagrees with the decoded data.
    Trailer(TrailerMismatch),
    /// A marker match with a length other than 2 (EOS) or 3 (Sync Flush).
    UnknownMarker(u32),
    /// The member decoded to zero bytes and empty members are rejected.
    Empty,
    /// The first byte of the coded body is non-zero and marking data is
    /// rejected.
    Marked,
    /// An I/O error from the source or the sink.
    Io(io::Error),
}

impl fmt::Display for MemberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decoder { position } => write!(f, "decoder error at pos {}", position),
            Self::UnexpectedEof { position } => {
                write!(f, "file ends unexpectedly at pos {}", position)
            }
            Self::Trailer(m) => {
                if m.truncated {
                    write!(f, "trailer truncated")?;
                } else {
                    write!(f, "trailer mismatch")?;
                }
                if m.stored_crc != m.computed_crc {
                    write!(
                        f,
                        "; CRC stored {:08X}, computed {:08X}",
                        m.stored_crc, m.computed_crc
                    )?;
                }
                if m.stored_data_size != m.computed_data_size {
                    write!(
                        f,
                        "; data size stored {}, computed {}",
                        m.stored_data_size, m.computed_data_size
                    )?;
                }
                if m.stored_member_size != m.computed_member_size {
                    write!(
                        f,
                        "; member size stored {}, computed {}",
                        m.stored_member_size, m.computed_member_size
                    )?;
                }
                Ok(())
            }
            Self::UnknownMarker(len) => write!(f, "unsupported marker code '{}'", len),
            Self::Empty => write!(f, "empty member not allowed"),
            Self::Marked => write!(f, "marking data not allowed"),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for MemberError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MemberError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, MemberError>;
