//! Multimember index builder.
//!
//! Walks a seekable compressed file from tail to head, recognising
//! members by their trailers, and produces a table mapping decompressed
//! offsets to member locations. Listing and random access across members
//! both start here. Nothing is decompressed: member boundaries follow
//! from the sizes stored in each trailer, filtered by the trailer
//! self-consistency check.

use crate::decompress::{DecodeOptions, MIN_MEMBER_SIZE};
use crate::error::{LzipError, Result};
use crate::file_media::{FileMedia, ReadInterval};
use crate::parsing::member_header::{is_header_prefix, looks_corrupt};
use crate::parsing::{MemberHeader, MemberTrailer};

/// A contiguous byte range, either in the compressed file or in the
/// decompressed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub pos: u64,
    pub size: u64,
}

impl Block {
    pub fn end(&self) -> u64 {
        self.pos + self.size
    }
}

/// One member of the file: where it lives, what it decompresses to, and
/// the dictionary it needs.
#[derive(Debug, Clone, Copy)]
pub struct Member {
    pub data_block: Block,
    pub member_block: Block,
    pub dictionary_size: u32,
}

/// Ordered member table of a multimember file.
pub struct LzipIndex {
    members: Vec<Member>,
    insize: u64,
    dictionary_size: u32,
}

fn read_exact_at(media: &dyn FileMedia, pos: u64, buf: &mut [u8]) -> Result<()> {
    let data = media.read_range(ReadInterval {
        start: pos,
        end: pos + buf.len() as u64 - 1,
    })?;
    if data.len() != buf.len() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "short read from media",
        )
        .into());
    }
    buf.copy_from_slice(&data);
    Ok(())
}

/// Backward scan window. The overlap keeps trailers and headers that
/// straddle a window boundary visible in one piece.
const SCAN_BLOCK_SIZE: usize = 16384;
const SCAN_BUFFER_SIZE: usize = SCAN_BLOCK_SIZE + MemberTrailer::SIZE - 1 + MemberHeader::SIZE;

/// Search backwards from `pos` for the real end of the last member,
/// classifying whatever follows it.
///
/// Candidate positions are pre-filtered on the most significant byte of
/// the would-be member size: it cannot exceed `(ipos + search_size) >>
/// 56`. The heuristic assumes member sizes fit in 56 bits, which is
/// implied by the 2^63 - 1 cap on file sizes for any file below 2^56
/// bytes, i.e. all of them in practice. Runs of zero bytes are skipped
/// wholesale as trailing padding.
///
/// On success, `pos` is moved to the member's header offset and the
/// member is returned.
fn skip_trailing_data(
    media: &dyn FileMedia,
    pos: &mut u64,
    options: &DecodeOptions,
) -> Result<Member> {
    if *pos < MIN_MEMBER_SIZE as u64 {
        return Err(LzipError::BadTrailer {
            pos: pos.saturating_sub(MemberTrailer::SIZE as u64),
        });
    }
    let mut bsize = (*pos % SCAN_BLOCK_SIZE as u64) as usize; // total bytes in buffer
    if bsize <= SCAN_BUFFER_SIZE - SCAN_BLOCK_SIZE {
        bsize += SCAN_BLOCK_SIZE;
    }
    let mut search_size = bsize; // bytes to search for trailer
    let mut rd_size = bsize; // bytes to read from file
    let mut ipos = *pos - rd_size as u64; // aligned to SCAN_BLOCK_SIZE
    let mut buffer = vec![0u8; SCAN_BUFFER_SIZE];

    loop {
        read_exact_at(media, ipos, &mut buffer[..rd_size])?;
        let max_msb = ((ipos + search_size as u64) >> 56) as u8;
        let mut i = search_size;
        while i >= MemberTrailer::SIZE {
            // most significant byte of the candidate member size
            if buffer[i - 1] > max_msb {
                i -= 1;
                continue;
            }
            let mut tbuf = [0u8; MemberTrailer::SIZE];
            tbuf.copy_from_slice(&buffer[i - MemberTrailer::SIZE..i]);
            let trailer = MemberTrailer::parse(&tbuf);
            let member_size = trailer.member_size;
            if member_size == 0 {
                // skip trailing zeros
                while i > MemberTrailer::SIZE && buffer[i - 9] == 0 {
                    i -= 1;
                }
                i -= 1;
                continue;
            }
            if member_size > ipos + i as u64 || !trailer.check_consistency() {
                i -= 1;
                continue;
            }
            let header_pos = ipos + i as u64 - member_size;
            let mut hbuf = [0u8; MemberHeader::SIZE];
            read_exact_at(media, header_pos, &mut hbuf)?;
            let header = match MemberHeader::parse(&hbuf) {
                Ok(header) => header,
                Err(_) => {
                    i -= 1;
                    continue;
                }
            };
            let after = &buffer[i..bsize.min(i + MemberHeader::SIZE)];
            if is_header_prefix(after) {
                return Err(LzipError::TruncatedLastMember);
            }
            if !options.loose_trailing && looks_corrupt(after) {
                return Err(LzipError::CorruptMultimemberHeader);
            }
            if !options.ignore_trailing {
                return Err(LzipError::TrailingData);
            }
            *pos = header_pos;
            return Ok(Member {
                data_block: Block {
                    pos: 0,
                    size: trailer.data_size,
                },
                member_block: Block {
                    pos: header_pos,
                    size: member_size,
                },
                dictionary_size: header.dictionary_size,
            });
        }
        if ipos == 0 {
            return Err(LzipError::BadTrailer {
                pos: pos.saturating_sub(MemberTrailer::SIZE as u64),
            });
        }
        bsize = SCAN_BUFFER_SIZE;
        search_size = bsize - MemberHeader::SIZE;
        rd_size = SCAN_BLOCK_SIZE;
        ipos -= rd_size as u64;
        // carry the head of the old window into the overlap region
        buffer.copy_within(0..SCAN_BUFFER_SIZE - rd_size, rd_size);
    }
}

impl LzipIndex {
    /// Build the member table of a seekable compressed file.
    pub fn new(media: &dyn FileMedia, options: &DecodeOptions) -> Result<Self> {
        let insize = media.length();
        if insize < MIN_MEMBER_SIZE as u64 {
            return Err(LzipError::InputTooShort);
        }
        if insize > i64::MAX as u64 {
            return Err(LzipError::InputTooLong);
        }

        // The first header must be valid whatever the rest contains
        let mut hbuf = [0u8; MemberHeader::SIZE];
        read_exact_at(media, 0, &mut hbuf)?;
        MemberHeader::parse(&hbuf)?;

        let mut members: Vec<Member> = Vec::new();
        let mut pos = insize; // always points to a header or to EOF
        while pos >= MIN_MEMBER_SIZE as u64 {
            let mut tbuf = [0u8; MemberTrailer::SIZE];
            read_exact_at(media, pos - MemberTrailer::SIZE as u64, &mut tbuf)?;
            let trailer = MemberTrailer::parse(&tbuf);
            let member_size = trailer.member_size;
            if member_size > pos || !trailer.check_consistency() {
                if members.is_empty() {
                    members.push(skip_trailing_data(media, &mut pos, options)?);
                    continue;
                }
                return Err(LzipError::BadTrailer {
                    pos: pos - MemberTrailer::SIZE as u64,
                });
            }
            read_exact_at(media, pos - member_size, &mut hbuf)?;
            match MemberHeader::parse(&hbuf) {
                Ok(header) => {
                    pos -= member_size;
                    members.push(Member {
                        data_block: Block {
                            pos: 0,
                            size: trailer.data_size,
                        },
                        member_block: Block {
                            pos,
                            size: member_size,
                        },
                        dictionary_size: header.dictionary_size,
                    });
                }
                Err(_) => {
                    if members.is_empty() {
                        members.push(skip_trailing_data(media, &mut pos, options)?);
                        continue;
                    }
                    return Err(LzipError::BadHeader {
                        pos: pos - member_size,
                    });
                }
            }
        }
        if pos != 0 || members.is_empty() {
            return Err(LzipError::CannotIndex);
        }

        members.reverse();
        for i in 0..members.len() {
            let end = members[i]
                .data_block
                .pos
                .checked_add(members[i].data_block.size)
                .filter(|&end| end <= i64::MAX as u64)
                .ok_or(LzipError::DataTooLong)?;
            if i + 1 < members.len() {
                members[i + 1].data_block.pos = end;
            }
        }
        let dictionary_size = members.iter().map(|m| m.dictionary_size).max().unwrap_or(0);

        Ok(Self {
            members,
            insize,
            dictionary_size,
        })
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Total decompressed size of all members.
    pub fn udata_size(&self) -> u64 {
        match self.members.last() {
            Some(m) => m.data_block.end(),
            None => 0,
        }
    }

    /// Compressed size of all members, excluding trailing data.
    pub fn cdata_size(&self) -> u64 {
        match self.members.last() {
            Some(m) => m.member_block.end(),
            None => 0,
        }
    }

    /// Total file size including trailing data (if any).
    pub fn file_size(&self) -> u64 {
        self.insize
    }

    /// Largest dictionary size used by any member.
    pub fn dictionary_size(&self) -> u32 {
        self.dictionary_size
    }
}
