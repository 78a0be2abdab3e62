//! Streaming lzip decoder library.
//!
//! Decodes the lzip container format: one or more concatenated members,
//! each wrapping an LZMA-coded body between a 6-byte header and a 20-byte
//! trailer that stores CRC32, data size and member size for three-factor
//! integrity checking.
//!
//! ## Features
//! - Core library has **zero dependencies**
//! - Streaming decode from any [`std::io::Read`] into any [`std::io::Write`]
//! - Multimember index construction by reverse scan, tolerating trailing
//!   data, for listing and random access across members
//!
//! ## Example
//!
//! ```rust,ignore
//! use lzip_stream::{decode_stream, DecodeOptions};
//!
//! let input = std::fs::File::open("archive.lz")?;
//! let output = std::fs::File::create("archive")?;
//! let stats = decode_stream(input, output, &DecodeOptions::default())?;
//! println!("{} members, {} bytes", stats.members, stats.uncompressed_size);
//! ```

pub mod crc32;
pub mod decompress;
pub mod error;
mod file_media;
pub mod index;
pub mod list;
pub mod parsing;

pub use error::{LzipError, Result};
pub use file_media::{FileMedia, LocalFileMedia, MemoryMedia, ReadInterval};

// Re-export the decode surface
pub use decompress::{
    decode_stream, DecodeOptions, LzDecoder, MemberError, RangeDecoder, StreamStats,
    TrailerMismatch,
};

// Re-export index and listing types
pub use index::LzipIndex;
pub use list::{format_ds, write_listing};
pub use parsing::{MemberHeader, MemberTrailer};
