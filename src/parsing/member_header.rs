//! Member header parser.
//!
//! Every member starts with a fixed 6-byte header:
//! bytes 0-3 magic `4C 5A 49 50` ("LZIP"), byte 4 version (always 1),
//! byte 5 the coded dictionary size.

use crate::decompress::{MAX_DICTIONARY_SIZE, MIN_DICTIONARY_SIZE};
use crate::error::LzipError;

/// lzip magic signature.
pub const LZIP_MAGIC: [u8; 4] = [0x4C, 0x5A, 0x49, 0x50];

/// Supported member format version.
pub const LZIP_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberHeader {
    pub version: u8,
    pub dictionary_size: u32,
}

impl MemberHeader {
    pub const SIZE: usize = 6;

    /// Parse and validate a member header.
    ///
    /// Checks run in order magic, version, dictionary size, so the caller
    /// can distinguish "not an lzip header at all" from a header of an
    /// unsupported version or with a bad dictionary size.
    pub fn parse(buffer: &[u8; Self::SIZE]) -> Result<Self, LzipError> {
        if buffer[..4] != LZIP_MAGIC {
            return Err(LzipError::BadMagic);
        }
        let version = buffer[4];
        if version != LZIP_VERSION {
            return Err(LzipError::BadVersion(version));
        }
        let dictionary_size = decode_dict_size(buffer[5]).ok_or(LzipError::BadDictSize)?;
        Ok(Self {
            version,
            dictionary_size,
        })
    }

    /// Encode a header for the given dictionary size.
    ///
    /// Returns `None` if the size is outside `[4 KiB, 512 MiB]`.
    pub fn encode(dictionary_size: u32) -> Option<[u8; Self::SIZE]> {
        let coded = encode_dict_size(dictionary_size)?;
        Some([
            LZIP_MAGIC[0],
            LZIP_MAGIC[1],
            LZIP_MAGIC[2],
            LZIP_MAGIC[3],
            LZIP_VERSION,
            coded,
        ])
    }
}

/// Whether `bytes` could be the start of a member header.
///
/// True iff at least one byte is present and every provided byte (up to
/// the 4 magic bytes) matches the magic. Used to detect a truncated
/// header at the end of a multimember file.
pub fn is_header_prefix(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    bytes
        .iter()
        .take(4)
        .zip(LZIP_MAGIC.iter())
        .all(|(b, m)| b == m)
}

/// Whether `bytes` look like a corrupt member header.
///
/// A corrupt header matches 2 or 3 of the 4 magic byte positions. Such
/// bytes are far more likely a damaged member than unrelated trailing
/// data, so by default they are reported instead of skipped.
pub fn looks_corrupt(bytes: &[u8]) -> bool {
    let matches = bytes
        .iter()
        .take(4)
        .zip(LZIP_MAGIC.iter())
        .filter(|(b, m)| b == m)
        .count();
    matches > 1 && matches < 4
}

/// Decode the coded dictionary size byte.
///
/// The low 5 bits give a power-of-two base size; the high 3 bits subtract
/// that many sixteenths from the base. For example `0xD3` decodes to
/// `2^19 - 6 * 2^15` = 320 KiB. Returns `None` if the result falls
/// outside `[4 KiB, 512 MiB]`.
pub fn decode_dict_size(coded: u8) -> Option<u32> {
    let base_log2 = u32::from(coded & 0x1F);
    if !(12..=29).contains(&base_log2) {
        return None;
    }
    let mut size = 1u32 << base_log2;
    if size > MIN_DICTIONARY_SIZE as u32 {
        size -= (size / 16) * u32::from(coded >> 5);
    }
    if size < MIN_DICTIONARY_SIZE as u32 || size > MAX_DICTIONARY_SIZE as u32 {
        return None;
    }
    Some(size)
}

/// Encode a dictionary size into its coded byte.
///
/// Picks the smallest power-of-two base covering `size`, then the largest
/// fraction that still leaves at least `size` bytes.
pub fn encode_dict_size(size: u32) -> Option<u8> {
    if size < MIN_DICTIONARY_SIZE as u32 || size > MAX_DICTIONARY_SIZE as u32 {
        return None;
    }
    let mut coded = (32 - (size - 1).leading_zeros()) as u8;
    if size > MIN_DICTIONARY_SIZE as u32 {
        let base_size = 1u32 << coded;
        let fraction = base_size / 16;
        for i in (1..=7u8).rev() {
            if base_size - u32::from(i) * fraction >= size {
                coded |= i << 5;
                break;
            }
        }
    }
    Some(coded)
}
