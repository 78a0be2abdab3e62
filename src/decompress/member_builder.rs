//! Test-only builder for valid members.
//!
//! A minimal mirror image of the decoder: everything is coded as a
//! literal, followed by the End-Of-Stream marker and a matching trailer.
//! Enough to exercise the whole decode and index path without fixtures.

use super::bit_model::{BitModel, LenModel, BIT_MODEL_MOVE_BITS, BIT_MODEL_TOTAL, BIT_MODEL_TOTAL_BITS};
use super::state::{State, STATES};
use super::{
    get_len_state, get_lit_state, DIS_SLOT_BITS, LEN_LOW_BITS, LEN_LOW_SYMBOLS, LEN_MID_BITS,
    LEN_MID_SYMBOLS, LEN_HIGH_BITS, LITERAL_CONTEXT_BITS, MIN_MATCH_LEN, POS_STATES,
};
use crate::crc32;
use crate::parsing::{MemberHeader, MemberTrailer};

struct RangeEncoder {
    low: u64,
    range: u32,
    cache: u8,
    ff_count: usize,
    out: Vec<u8>,
}

impl RangeEncoder {
    fn new() -> Self {
        Self {
            low: 0,
            range: 0xFFFF_FFFF,
            cache: 0,
            ff_count: 0,
            out: Vec::new(),
        }
    }

    fn shift_low(&mut self) {
        if self.low >> 24 != 0xFF {
            let carry = (self.low > 0xFFFF_FFFF) as u8;
            self.out.push(self.cache.wrapping_add(carry));
            for _ in 0..self.ff_count {
                self.out.push(0xFFu8.wrapping_add(carry));
            }
            self.ff_count = 0;
            self.cache = (self.low >> 24) as u8;
        } else {
            self.ff_count += 1;
        }
        self.low = (self.low & 0x00FF_FFFF) << 8;
    }

    fn encode_bit(&mut self, bm: &mut BitModel, bit: u32) {
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * bm.probability;
        if bit == 0 {
            self.range = bound;
            bm.probability += (BIT_MODEL_TOTAL - bm.probability) >> BIT_MODEL_MOVE_BITS;
        } else {
            self.low += u64::from(bound);
            self.range -= bound;
            bm.probability -= bm.probability >> BIT_MODEL_MOVE_BITS;
        }
        if self.range <= 0x00FF_FFFF {
            self.range <<= 8;
            self.shift_low();
        }
    }

    fn encode(&mut self, symbol: u32, num_bits: u32) {
        for i in (0..num_bits).rev() {
            self.range >>= 1;
            if (symbol >> i) & 1 != 0 {
                self.low += u64::from(self.range);
            }
            if self.range <= 0x00FF_FFFF {
                self.range <<= 8;
                self.shift_low();
            }
        }
    }

    fn encode_tree(&mut self, bm: &mut [BitModel], symbol: u32, num_bits: u32) {
        let mut model = 1usize;
        for i in (0..num_bits).rev() {
            let bit = (symbol >> i) & 1;
            self.encode_bit(&mut bm[model], bit);
            model = (model << 1) | bit as usize;
        }
    }

    fn encode_tree_reversed(&mut self, bm: &mut [BitModel], symbol: u32, num_bits: u32) {
        let mut model = 1usize;
        for i in 0..num_bits {
            let bit = (symbol >> i) & 1;
            self.encode_bit(&mut bm[model], bit);
            model = (model << 1) + bit as usize;
        }
    }

    fn encode_len(&mut self, lm: &mut LenModel, len: usize, pos_state: usize) {
        let symbol = len - MIN_MATCH_LEN;
        if symbol < LEN_LOW_SYMBOLS {
            self.encode_bit(&mut lm.choice1, 0);
            self.encode_tree(&mut lm.low[pos_state], symbol as u32, LEN_LOW_BITS);
        } else if symbol < LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS {
            self.encode_bit(&mut lm.choice1, 1);
            self.encode_bit(&mut lm.choice2, 0);
            self.encode_tree(
                &mut lm.mid[pos_state],
                (symbol - LEN_LOW_SYMBOLS) as u32,
                LEN_MID_BITS,
            );
        } else {
            self.encode_bit(&mut lm.choice1, 1);
            self.encode_bit(&mut lm.choice2, 1);
            self.encode_tree(
                &mut lm.high,
                (symbol - LEN_LOW_SYMBOLS - LEN_MID_SYMBOLS) as u32,
                LEN_HIGH_BITS,
            );
        }
    }

    /// Push out the pending bytes of `low`. A Sync Flush restarts the
    /// coder from scratch afterwards.
    fn flush(&mut self) {
        for _ in 0..5 {
            self.shift_low();
        }
    }

    fn reset(&mut self) {
        self.low = 0;
        self.range = 0xFFFF_FFFF;
        self.cache = 0;
        self.ff_count = 0;
    }
}

struct MemberBuilder {
    renc: RangeEncoder,
    bm_literal: [[BitModel; 0x300]; 1 << LITERAL_CONTEXT_BITS],
    bm_match: [[BitModel; POS_STATES]; STATES],
    bm_rep: [BitModel; STATES],
    bm_dis_slot: [[BitModel; 1 << DIS_SLOT_BITS]; super::LEN_STATES],
    bm_align: [BitModel; super::DIS_ALIGN_SIZE],
    match_len_model: LenModel,
    state: State,
    prev_byte: u8,
    data_pos: u64,
    crc: u32,
}

impl MemberBuilder {
    fn new() -> Self {
        Self {
            renc: RangeEncoder::new(),
            bm_literal: [[BitModel::new(); 0x300]; 1 << LITERAL_CONTEXT_BITS],
            bm_match: [[BitModel::new(); POS_STATES]; STATES],
            bm_rep: [BitModel::new(); STATES],
            bm_dis_slot: [[BitModel::new(); 1 << DIS_SLOT_BITS]; super::LEN_STATES],
            bm_align: [BitModel::new(); super::DIS_ALIGN_SIZE],
            match_len_model: LenModel::new(),
            state: State::new(),
            prev_byte: 0,
            data_pos: 0,
            crc: 0xFFFF_FFFF,
        }
    }

    fn put_literal(&mut self, b: u8) {
        let pos_state = (self.data_pos & 3) as usize;
        self.renc
            .encode_bit(&mut self.bm_match[self.state.index()][pos_state], 0);
        // A literal-only stream never leaves the literal states, so the
        // plain 8-bit tree is always the right path
        debug_assert!(self.state.is_char());
        let bm = &mut self.bm_literal[get_lit_state(self.prev_byte)];
        self.renc.encode_tree(bm, u32::from(b), 8);
        self.state.set_char();
        self.prev_byte = b;
        self.data_pos += 1;
        self.crc = crc32::update_buf(self.crc, &[b]);
    }

    /// Plain match with distance `0xFFFF_FFFF`: length 2 ends the
    /// member, length 3 restarts the range coder.
    fn put_marker(&mut self, len: usize) {
        let pos_state = (self.data_pos & 3) as usize;
        self.renc
            .encode_bit(&mut self.bm_match[self.state.index()][pos_state], 1);
        self.renc
            .encode_bit(&mut self.bm_rep[self.state.index()], 0);
        let match_len_model = &mut self.match_len_model;
        self.renc.encode_len(match_len_model, len, pos_state);
        self.renc.encode_tree(
            &mut self.bm_dis_slot[get_len_state(len)],
            63,
            DIS_SLOT_BITS,
        );
        self.renc.encode(0x3FF_FFFF, 26);
        self.renc.encode_tree_reversed(&mut self.bm_align, 0xF, 4);
        self.renc.flush();
    }
}

/// Build one complete member coding `parts` as literals, with a Sync
/// Flush marker between consecutive parts.
pub fn build_member_parts(parts: &[&[u8]], dictionary_size: u32) -> Vec<u8> {
    let mut builder = MemberBuilder::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            builder.put_marker(MIN_MATCH_LEN + 1);
            builder.renc.reset();
        }
        for &b in *part {
            builder.put_literal(b);
        }
    }
    builder.put_marker(MIN_MATCH_LEN);

    let header = MemberHeader::encode(dictionary_size).expect("valid dictionary size");
    let body = builder.renc.out;
    let trailer = MemberTrailer {
        data_crc: builder.crc ^ 0xFFFF_FFFF,
        data_size: builder.data_pos,
        member_size: (header.len() + body.len() + MemberTrailer::SIZE) as u64,
    };

    let mut member = Vec::with_capacity(trailer.member_size as usize);
    member.extend_from_slice(&header);
    member.extend_from_slice(&body);
    member.extend_from_slice(&trailer.to_bytes());
    member
}

/// Build one complete member coding `data` as literals.
pub fn build_member(data: &[u8], dictionary_size: u32) -> Vec<u8> {
    build_member_parts(&[data], dictionary_size)
}

/// Build a member ending in a marker of the given length instead of the
/// End-Of-Stream marker, to exercise the unknown-marker path.
pub fn build_member_with_marker(data: &[u8], dictionary_size: u32, marker_len: usize) -> Vec<u8> {
    let mut builder = MemberBuilder::new();
    for &b in data {
        builder.put_literal(b);
    }
    builder.put_marker(marker_len);

    let header = MemberHeader::encode(dictionary_size).expect("valid dictionary size");
    let body = builder.renc.out;
    let trailer = MemberTrailer {
        data_crc: builder.crc ^ 0xFFFF_FFFF,
        data_size: builder.data_pos,
        member_size: (header.len() + body.len() + MemberTrailer::SIZE) as u64,
    };

    let mut member = Vec::with_capacity(trailer.member_size as usize);
    member.extend_from_slice(&header);
    member.extend_from_slice(&body);
    member.extend_from_slice(&trailer.to_bytes());
    member
}

/// Deterministic pseudo-random bytes for round-trip tests.
pub fn lcg_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        out.push((state >> 33) as u8);
    }
    out
}
