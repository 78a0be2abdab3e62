//! Member trailer parser.
//!
//! The last 20 bytes of a member, all little-endian: CRC32 of the
//! uncompressed data (4 bytes), uncompressed data size (8 bytes), member
//! size including header and trailer (8 bytes).

use crate::decompress::MIN_MEMBER_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberTrailer {
    pub data_crc: u32,
    pub data_size: u64,
    pub member_size: u64,
}

impl MemberTrailer {
    pub const SIZE: usize = 20;

    pub fn parse(buffer: &[u8; Self::SIZE]) -> Self {
        Self {
            data_crc: u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]),
            data_size: u64::from_le_bytes([
                buffer[4], buffer[5], buffer[6], buffer[7], buffer[8], buffer[9], buffer[10],
                buffer[11],
            ]),
            member_size: u64::from_le_bytes([
                buffer[12], buffer[13], buffer[14], buffer[15], buffer[16], buffer[17],
                buffer[18], buffer[19],
            ]),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        buffer[0..4].copy_from_slice(&self.data_crc.to_le_bytes());
        buffer[4..12].copy_from_slice(&self.data_size.to_le_bytes());
        buffer[12..20].copy_from_slice(&self.member_size.to_le_bytes());
        buffer
    }

    /// Check internal consistency of the three stored values.
    ///
    /// A necessary-but-not-sufficient filter used when scanning for member
    /// boundaries: it rejects almost all garbage while never rejecting a
    /// trailer written by a real encoder.
    ///
    /// 1. The CRC is zero iff the data size is zero.
    /// 2. The member size covers at least header and trailer plus a
    ///    minimal body.
    /// 3. The member cannot expand the data by more than 1/8 plus the
    ///    container overhead.
    /// 4. The member cannot compress the data by more than 7090:1 (the
    ///    limit of the coder at the largest match length).
    ///
    /// Bounds 3 and 4 are computed in wrapping arithmetic; an overflowed
    /// bound disables that check, matching the unsigned arithmetic of the
    /// on-disk format definition.
    pub fn check_consistency(&self) -> bool {
        if (self.data_crc == 0) != (self.data_size == 0) {
            return false;
        }
        if self.member_size < MIN_MEMBER_SIZE as u64 {
            return false;
        }
        let mlimit = self
            .data_size
            .wrapping_mul(9)
            .wrapping_add(7)
            / 8
            + MIN_MEMBER_SIZE as u64;
        if mlimit > self.data_size && self.member_size > mlimit {
            return false;
        }
        let dlimit = 7090u64
            .wrapping_mul(self.member_size - 26)
            .wrapping_sub(1);
        if dlimit > self.member_size && self.data_size > dlimit {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let trailer = MemberTrailer {
            data_crc: 0xDEADBEEF,
            data_size: 14,
            member_size: 78,
        };
        assert_eq!(MemberTrailer::parse(&trailer.to_bytes()), trailer);
    }

    #[test]
    fn test_consistency_accepts_plausible() {
        // Empty member: zero CRC, zero data, minimal size
        assert!(MemberTrailer {
            data_crc: 0,
            data_size: 0,
            member_size: 36,
        }
        .check_consistency());
        // Ordinary small member
        assert!(MemberTrailer {
            data_crc: 0x12345678,
            data_size: 14,
            member_size: 50,
        }
        .check_consistency());
    }

    #[test]
    fn test_consistency_rejects_garbage() {
        // CRC zero but data present
        assert!(!MemberTrailer {
            data_crc: 0,
            data_size: 1,
            member_size: 40,
        }
        .check_consistency());
        // Data zero but CRC present
        assert!(!MemberTrailer {
            data_crc: 1,
            data_size: 0,
            member_size: 36,
        }
        .check_consistency());
        // Member smaller than the container overhead
        assert!(!MemberTrailer {
            data_crc: 1,
            data_size: 1,
            member_size: 35,
        }
        .check_consistency());
        // Expansion beyond the 9/8 bound
        assert!(!MemberTrailer {
            data_crc: 1,
            data_size: 8,
            member_size: 100,
        }
        .check_consistency());
        // Compression beyond the 7090:1 bound
        assert!(!MemberTrailer {
            data_crc: 1,
            data_size: 7090 * 10,
            member_size: 36,
        }
        .check_consistency());
    }
}
