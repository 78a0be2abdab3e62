//! Error types for lzip parsing, decoding and indexing.
//!
//! This module provides the [`LzipError`] type which covers all possible
//! errors that can occur when decoding an lzip stream or building a member
//! index over a multimember file.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Format | [`BadMagic`], [`BadVersion`], [`BadDictSize`] | File is not a valid lzip file |
//! | Data | [`Member`] | A member body failed to decode or verify |
//! | Trailing | [`TrailingData`], [`CorruptMultimemberHeader`] | Bytes after the last member |
//! | Index | [`BadTrailer`], [`BadHeader`], [`CannotIndex`] | The reverse member walk failed |
//! | I/O | [`Io`] | Read/write/seek errors |
//!
//! Errors are split in two layers, mirroring the decode pipeline: a
//! [`MemberError`] describes the outcome of decoding one member, while
//! `LzipError` is the whole-file surface that also covers header parsing,
//! trailing-data classification and index construction.
//!
//! [`BadMagic`]: LzipError::BadMagic
//! [`BadVersion`]: LzipError::BadVersion
//! [`BadDictSize`]: LzipError::BadDictSize
//! [`Member`]: LzipError::Member
//! [`TrailingData`]: LzipError::TrailingData
//! [`CorruptMultimemberHeader`]: LzipError::CorruptMultimemberHeader
//! [`BadTrailer`]: LzipError::BadTrailer
//! [`BadHeader`]: LzipError::BadHeader
//! [`CannotIndex`]: LzipError::CannotIndex
//! [`Io`]: LzipError::Io

use std::fmt;
use std::io;

use crate::decompress::MemberError;

/// Error type for lzip operations.
///
/// Covers whole-file failures: bad headers, decode errors inside a member,
/// unexpected bytes between or after members, and index construction
/// failures. Implements [`std::error::Error`] for integration with the
/// Rust error handling ecosystem.
#[derive(Debug)]
pub enum LzipError {
    /// The file does not start with the magic bytes `4C 5A 49 50` ("LZIP").
    BadMagic,

    /// The header version is not 1.
    ///
    /// The `u8` value is the version byte found in the header.
    BadVersion(u8),

    /// The coded dictionary size decodes outside `[4 KiB, 512 MiB]`.
    BadDictSize,

    /// The input is shorter than the minimum member size (36 bytes).
    InputTooShort,

    /// The input is 2^63 bytes or longer.
    InputTooLong,

    /// Accumulated decompressed offsets exceed 2^63 - 1 bytes.
    DataTooLong,

    /// The input ends in the middle of a member header.
    ///
    /// For the first member this means the file cannot contain a whole
    /// member; for later members it means trailing bytes that start like a
    /// header but stop short.
    TruncatedHeader {
        /// Whether a complete member was already decoded before the
        /// truncated header was found.
        multimember: bool,
    },

    /// Bytes follow the last member and `ignore_trailing` is disabled.
    TrailingData,

    /// Trailing bytes match 2 or 3 of the 4 magic bytes.
    ///
    /// Such bytes most likely are a corrupt header of a further member
    /// rather than unrelated trailing data, so they are rejected unless
    /// `loose_trailing` is enabled.
    CorruptMultimemberHeader,

    /// The last member in the input is truncated or corrupt.
    ///
    /// Reported when the member search finds a valid member followed by
    /// bytes that form a (possibly partial) header prefix.
    TruncatedLastMember,

    /// No consistent trailer was found ending at the given file position.
    BadTrailer {
        /// File offset of the first byte of the offending trailer.
        pos: u64,
    },

    /// The 6 bytes at the given file position are not a valid header.
    BadHeader {
        /// File offset of the first byte of the offending header.
        pos: u64,
    },

    /// The reverse walk did not cover the whole file.
    CannotIndex,

    /// A member body failed to decode or verify.
    Member(MemberError),

    /// An I/O error occurred.
    ///
    /// Wraps [`std::io::Error`] for read, write and seek operations.
    Io(io::Error),
}

impl LzipError {
    /// Conventional exit class for this error: 1 for I/O errors, 2 for
    /// anything wrong with the data itself.
    pub fn exit_class(&self) -> i32 {
        match self {
            Self::Io(_) | Self::Member(MemberError::Io(_)) => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for LzipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "bad magic number (file not in lzip format)"),
            Self::BadVersion(v) => write!(f, "version {} member format not supported", v),
            Self::BadDictSize => write!(f, "invalid dictionary size in member header"),
            Self::InputTooShort => write!(f, "input file is too short"),
            Self::InputTooLong => write!(f, "input file is too long (2^63 bytes or more)"),
            Self::DataTooLong => write!(f, "data in input file is too long (2^63 bytes or more)"),
            Self::TruncatedHeader { multimember: true } => {
                write!(f, "truncated header in multimember file")
            }
            Self::TruncatedHeader { multimember: false } => {
                write!(f, "file ends unexpectedly at member header")
            }
            Self::TrailingData => write!(f, "trailing data not allowed"),
            Self::CorruptMultimemberHeader => write!(f, "corrupt header in multimember file"),
            Self::TruncatedLastMember => {
                write!(f, "last member in input file is truncated or corrupt")
            }
            Self::BadTrailer { pos } => write!(f, "bad trailer at pos {}", pos),
            Self::BadHeader { pos } => write!(f, "bad header at pos {}", pos),
            Self::CannotIndex => write!(f, "can't create file index"),
            Self::Member(e) => write!(f, "{}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for LzipError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Member(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LzipError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<MemberError> for LzipError {
    fn from(e: MemberError) -> Self {
        match e {
            MemberError::Io(e) => Self::Io(e),
            _ => Self::Member(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, LzipError>;
