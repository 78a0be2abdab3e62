//! Adaptive probability models for the range decoder.

use super::{LEN_HIGH_SYMBOLS, LEN_LOW_SYMBOLS, LEN_MID_SYMBOLS, POS_STATES};

/// Probability resolution: 11 bits.
pub const BIT_MODEL_TOTAL_BITS: u32 = 11;
pub const BIT_MODEL_TOTAL: u32 = 1 << BIT_MODEL_TOTAL_BITS;
/// Adaptation speed: each observed bit moves the probability by 1/32 of
/// the remaining distance.
pub const BIT_MODEL_MOVE_BITS: u32 = 5;

/// A single adaptive bit probability.
///
/// `probability` estimates how likely the next bit is to be zero, scaled
/// to [`BIT_MODEL_TOTAL`]. Fresh models start at even odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitModel {
    pub probability: u32,
}

impl BitModel {
    pub const fn new() -> Self {
        Self {
            probability: BIT_MODEL_TOTAL / 2,
        }
    }
}

impl Default for BitModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Composite model for match lengths.
///
/// Lengths 2..=9 go through `choice1` and a 3-bit tree per position
/// state, 10..=17 through `choice2` and a second 3-bit tree, everything
/// up to 273 through the shared 8-bit `high` tree.
#[derive(Debug, Clone)]
pub struct LenModel {
    pub choice1: BitModel,
    pub choice2: BitModel,
    pub low: [[BitModel; LEN_LOW_SYMBOLS]; POS_STATES],
    pub mid: [[BitModel; LEN_MID_SYMBOLS]; POS_STATES],
    pub high: [BitModel; LEN_HIGH_SYMBOLS],
}

impl LenModel {
    pub fn new() -> Self {
        Self {
            choice1: BitModel::new(),
            choice2: BitModel::new(),
            low: [[BitModel::new(); LEN_LOW_SYMBOLS]; POS_STATES],
            mid: [[BitModel::new(); LEN_MID_SYMBOLS]; POS_STATES],
            high: [BitModel::new(); LEN_HIGH_SYMBOLS],
        }
    }
}

impl Default for LenModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_models_start_at_even_odds() {
        assert_eq!(BitModel::new().probability, 1024);
        let lm = LenModel::new();
        assert_eq!(lm.choice1.probability, 1024);
        assert_eq!(lm.low[3][7].probability, 1024);
        assert_eq!(lm.high[255].probability, 1024);
    }
}
