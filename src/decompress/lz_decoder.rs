//! LZ decoder driver.
//!
//! Drives the range decoder through the coder grammar into the dictionary
//! window, one member at a time, and verifies the member trailer against
//! what was decoded. [`decode_stream`] loops the driver over all members
//! of a file and classifies whatever follows the last one.

use std::io::{Read, Write};

use super::bit_model::{BitModel, LenModel};
use super::range_decoder::RangeDecoder;
use super::state::{State, STATES};
use super::window::DictWindow;
use super::{
    get_len_state, get_lit_state, DecodeOptions, MemberError, TrailerMismatch, DIS_ALIGN_BITS,
    DIS_ALIGN_SIZE, DIS_SLOT_BITS, END_DIS_MODEL, LEN_STATES, LITERAL_CONTEXT_BITS,
    MIN_MATCH_LEN, MODELED_DISTANCES, POS_STATES, POS_STATE_MASK, START_DIS_MODEL,
};
use crate::error::LzipError;
use crate::parsing::member_header::{is_header_prefix, looks_corrupt, MemberHeader};
use crate::parsing::MemberTrailer;

/// Decoder for one member body.
///
/// Owns the dictionary window for the member and writes the plaintext to
/// `sink`; borrows the stream's range decoder so consecutive members share
/// its refill buffer.
pub struct LzDecoder<'a, R, W> {
    rdec: &'a mut RangeDecoder<R>,
    window: DictWindow,
    sink: W,
}

impl<'a, R: Read, W: Write> LzDecoder<'a, R, W> {
    pub fn new(rdec: &'a mut RangeDecoder<R>, dictionary_size: u32, sink: W) -> Self {
        Self {
            rdec,
            window: DictWindow::new(dictionary_size as usize),
            sink,
        }
    }

    /// Total bytes decoded so far in this member.
    pub fn data_position(&self) -> u64 {
        self.window.data_position()
    }

    /// CRC32 of the decoded data.
    pub fn crc(&self) -> u32 {
        self.window.crc()
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Read the 20 trailer bytes through the range decoder and compare
    /// them with what was decoded.
    fn check_trailer(&mut self, ignore_empty: bool) -> Result<(), MemberError> {
        let mut buf = [0u8; MemberTrailer::SIZE];
        let size = self.rdec.read_data(&mut buf)?;
        // Missing bytes stay zero, guaranteeing a mismatch below
        let truncated = size < MemberTrailer::SIZE;

        let trailer = MemberTrailer::parse(&buf);
        let computed_crc = self.window.crc();
        let computed_data_size = self.window.data_position();
        let computed_member_size = self.rdec.member_position();

        if truncated
            || trailer.data_crc != computed_crc
            || trailer.data_size != computed_data_size
            || trailer.member_size != computed_member_size
        {
            return Err(MemberError::Trailer(TrailerMismatch {
                truncated,
                stored_crc: trailer.data_crc,
                computed_crc,
                stored_data_size: trailer.data_size,
                computed_data_size,
                stored_member_size: trailer.member_size,
                computed_member_size,
            }));
        }
        if !ignore_empty && computed_data_size == 0 {
            return Err(MemberError::Empty);
        }
        Ok(())
    }

    /// Decode one member body up to and including its trailer.
    ///
    /// Expects the range decoder to stand right after the member header.
    pub fn decode_member(&mut self, options: &DecodeOptions) -> Result<(), MemberError> {
        let mut bm_literal = [[BitModel::new(); 0x300]; 1 << LITERAL_CONTEXT_BITS];
        let mut bm_match = [[BitModel::new(); POS_STATES]; STATES];
        let mut bm_rep = [BitModel::new(); STATES];
        let mut bm_rep0 = [BitModel::new(); STATES];
        let mut bm_rep1 = [BitModel::new(); STATES];
        let mut bm_rep2 = [BitModel::new(); STATES];
        let mut bm_len = [[BitModel::new(); POS_STATES]; STATES];
        let mut bm_dis_slot = [[BitModel::new(); 1 << DIS_SLOT_BITS]; LEN_STATES];
        let mut bm_dis =
            [BitModel::new(); MODELED_DISTANCES - END_DIS_MODEL as usize + 1];
        let mut bm_align = [BitModel::new(); DIS_ALIGN_SIZE];
        let mut match_len_model = LenModel::new();
        let mut rep_len_model = LenModel::new();

        // Latest four match distances, for cheap coding of repeats
        let mut rep0 = 0u32;
        let mut rep1 = 0u32;
        let mut rep2 = 0u32;
        let mut rep3 = 0u32;
        let mut state = State::new();

        if !self.rdec.load(options.ignore_marking)? {
            return Err(MemberError::Marked);
        }
        while !self.rdec.finished()? {
            let pos_state = self.window.data_position() as usize & POS_STATE_MASK;
            if self.rdec.decode_bit(&mut bm_match[state.index()][pos_state])? == 0 {
                // literal byte
                let bm = &mut bm_literal[get_lit_state(self.window.peek_prev())];
                let was_char = state.is_char();
                state.set_char();
                let b = if was_char {
                    self.rdec.decode_tree(bm, 8)? as u8
                } else {
                    let match_byte = self.window.peek(rep0 as usize);
                    self.rdec.decode_matched(bm, match_byte)?
                };
                self.window.put_byte(&mut self.sink, b)?;
                continue;
            }
            // match or repeated match
            let len;
            if self.rdec.decode_bit(&mut bm_rep[state.index()])? != 0 {
                if self.rdec.decode_bit(&mut bm_rep0[state.index()])? == 0 {
                    if self.rdec.decode_bit(&mut bm_len[state.index()][pos_state])? == 0 {
                        state.set_short_rep();
                        let b = self.window.peek(rep0 as usize);
                        self.window.put_byte(&mut self.sink, b)?;
                        continue;
                    }
                } else {
                    let distance;
                    if self.rdec.decode_bit(&mut bm_rep1[state.index()])? == 0 {
                        distance = rep1;
                    } else {
                        if self.rdec.decode_bit(&mut bm_rep2[state.index()])? == 0 {
                            distance = rep2;
                        } else {
                            distance = rep3;
                            rep3 = rep2;
                        }
                        rep2 = rep1;
                    }
                    rep1 = rep0;
                    rep0 = distance;
                }
                state.set_rep();
                len = self.rdec.decode_len(&mut rep_len_model, pos_state)?;
            } else {
                len = self.rdec.decode_len(&mut match_len_model, pos_state)?;
                let mut distance = self
                    .rdec
                    .decode_tree(&mut bm_dis_slot[get_len_state(len)], DIS_SLOT_BITS)?;
                if distance >= START_DIS_MODEL {
                    let dis_slot = distance;
                    let direct_bits = (dis_slot >> 1) - 1;
                    distance = (2 | (dis_slot & 1)) << direct_bits;
                    if dis_slot < END_DIS_MODEL {
                        let base = (distance - dis_slot) as usize;
                        distance += self
                            .rdec
                            .decode_tree_reversed(&mut bm_dis[base..], direct_bits)?;
                    } else {
                        distance +=
                            self.rdec.decode(direct_bits - DIS_ALIGN_BITS)? << DIS_ALIGN_BITS;
                        distance += self.rdec.decode_tree_reversed(&mut bm_align, 4)?;
                        if distance == 0xFFFF_FFFF {
                            // marker found
                            self.rdec.normalize()?;
                            self.window.flush(&mut self.sink)?;
                            if len == MIN_MATCH_LEN {
                                // End Of Stream marker
                                return self.check_trailer(options.ignore_empty);
                            }
                            if len == MIN_MATCH_LEN + 1 {
                                // Sync Flush marker; the reset byte is
                                // part of the marker, so never reject it
                                self.rdec.load(true)?;
                                continue;
                            }
                            return Err(MemberError::UnknownMarker(len as u32));
                        }
                    }
                }
                rep3 = rep2;
                rep2 = rep1;
                rep1 = rep0;
                rep0 = distance;
                state.set_match();
                if rep0 as usize >= self.window.dictionary_size()
                    || (rep0 as usize >= self.window.position() && !self.window.wrapped())
                {
                    self.window.flush(&mut self.sink)?;
                    return Err(MemberError::Decoder {
                        position: self.rdec.member_position(),
                    });
                }
            }
            self.window.copy_block(&mut self.sink, rep0 as usize, len)?;
        }
        self.window.flush(&mut self.sink)?;
        Err(MemberError::UnexpectedEof {
            position: self.rdec.member_position(),
        })
    }
}

/// Aggregate figures for one decoded file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub members: u64,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
}

/// Decode every member of an lzip stream, writing the plaintext to
/// `sink`.
///
/// Stops at the first failure. Bytes after the last member are accepted,
/// rejected, or rejected-if-corrupt-looking per `options`.
pub fn decode_stream<R: Read, W: Write>(
    source: R,
    mut sink: W,
    options: &DecodeOptions,
) -> Result<StreamStats, LzipError> {
    let mut rdec = RangeDecoder::new(source);
    let mut stats = StreamStats::default();
    let mut first_member = true;

    loop {
        rdec.reset_member_position();
        let mut header_buf = [0u8; MemberHeader::SIZE];
        let size = rdec.read_data(&mut header_buf)?;
        if rdec.finished()? {
            // End of file: nothing, a truncated header, or trailing data
            if first_member {
                return Err(LzipError::TruncatedHeader { multimember: false });
            }
            if is_header_prefix(&header_buf[..size]) {
                return Err(LzipError::TruncatedHeader { multimember: true });
            }
            if size > 0 && !options.loose_trailing && looks_corrupt(&header_buf[..size]) {
                return Err(LzipError::CorruptMultimemberHeader);
            }
            if size > 0 && !options.ignore_trailing {
                return Err(LzipError::TrailingData);
            }
            return Ok(stats);
        }
        let header = match MemberHeader::parse(&header_buf) {
            Ok(header) => header,
            Err(LzipError::BadMagic) if !first_member => {
                if !options.loose_trailing && looks_corrupt(&header_buf) {
                    return Err(LzipError::CorruptMultimemberHeader);
                }
                if !options.ignore_trailing {
                    return Err(LzipError::TrailingData);
                }
                return Ok(stats);
            }
            Err(e) => return Err(e),
        };

        let mut decoder = LzDecoder::new(&mut rdec, header.dictionary_size, &mut sink);
        let result = decoder.decode_member(options);
        let data_size = decoder.data_position();
        drop(decoder);
        result?;

        stats.members += 1;
        stats.uncompressed_size += data_size;
        stats.compressed_size += rdec.member_position();
        first_member = false;
    }
}
