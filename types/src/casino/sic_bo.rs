//! Sic Bo payloads.
//!
//! Payload format:
//! - `[0, bet_type, number, amount:u64]` place a single bet
//! - `[1]` roll the dice and resolve all bets
//! - `[2]` clear pending bets (with refund)
//! - `[3, bet_count, (bet_type, number, amount:u64) × count]` atomic batch: place every bet and
//!   roll in one transaction (all-or-nothing)
//! - `[4, rules]` set table rules
//!
//! State blob format:
//! `[bet_count:u8] [bets:(bet_type, number, amount:u64)×count] [die1:u8]? [die2:u8]? [die3:u8]? [rules:u8]?`
//!
//! Bet types and the meaning of `number`:
//! - 0 Small, 1 Big, 2 Odd, 3 Even, 5 Any triple: unused (0)
//! - 4 Specific triple, 6 Specific double, 8 Single: face 1-6
//! - 7 Total: 3-18
//! - 9 Domino: `(min << 4) | max`, faces 1-6 with min < max
//! - 10 Three-number easy hop: 6-bit mask of faces, exactly 3 bits set
//! - 11 Three-number hard hop: `(double << 4) | single`, faces 1-6 and distinct
//! - 12 Four-number easy hop: 6-bit mask of faces, exactly 4 bits set

use super::{encode_batch, decode_batch, encode_targeted_place, target_in, BatchLayout, BetKind, BetRecord, CodecError};

pub const LAYOUT: BatchLayout = BatchLayout::Targeted;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Move {
    Place = 0,
    Roll = 1,
    Clear = 2,
    AtomicBatch = 3,
    SetRules = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BetType {
    Small = 0,
    Big = 1,
    Odd = 2,
    Even = 3,
    SpecificTriple = 4,
    AnyTriple = 5,
    SpecificDouble = 6,
    Total = 7,
    Single = 8,
    Domino = 9,
    ThreeNumberEasyHop = 10,
    ThreeNumberHardHop = 11,
    FourNumberEasyHop = 12,
}

impl BetType {
    pub const ALL: [Self; 13] = [
        Self::Small,
        Self::Big,
        Self::Odd,
        Self::Even,
        Self::SpecificTriple,
        Self::AnyTriple,
        Self::SpecificDouble,
        Self::Total,
        Self::Single,
        Self::Domino,
        Self::ThreeNumberEasyHop,
        Self::ThreeNumberHardHop,
        Self::FourNumberEasyHop,
    ];
}

fn face(value: u8) -> bool {
    (1..=6).contains(&value)
}

fn face_mask(bet: &'static str, target: Option<u8>, bits: u32) -> Result<u8, CodecError> {
    let mask = target.ok_or(CodecError::MissingTarget { bet })?;
    if mask >= 1 << 6 || mask.count_ones() != bits {
        return Err(CodecError::InvalidTarget { bet, target: mask });
    }
    Ok(mask)
}

impl BetKind for BetType {
    const GAME: &'static str = "sic bo";

    fn lookup(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "SMALL" => Self::Small,
            "BIG" => Self::Big,
            "ODD" => Self::Odd,
            "EVEN" => Self::Even,
            "SPECIFIC_TRIPLE" | "TRIPLE" => Self::SpecificTriple,
            "ANY_TRIPLE" => Self::AnyTriple,
            "SPECIFIC_DOUBLE" | "DOUBLE" => Self::SpecificDouble,
            "TOTAL" | "SUM" => Self::Total,
            "SINGLE" | "SINGLE_DIE" => Self::Single,
            "DOMINO" | "COMBO" => Self::Domino,
            "THREE_NUMBER_EASY_HOP" | "HOP3_EASY" => Self::ThreeNumberEasyHop,
            "THREE_NUMBER_HARD_HOP" | "HOP3_HARD" => Self::ThreeNumberHardHop,
            "FOUR_NUMBER_EASY_HOP" | "HOP4_EASY" => Self::FourNumberEasyHop,
            _ => return None,
        })
    }

    fn code(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Self::Small => "SMALL",
            Self::Big => "BIG",
            Self::Odd => "ODD",
            Self::Even => "EVEN",
            Self::SpecificTriple => "SPECIFIC_TRIPLE",
            Self::AnyTriple => "ANY_TRIPLE",
            Self::SpecificDouble => "SPECIFIC_DOUBLE",
            Self::Total => "TOTAL",
            Self::Single => "SINGLE",
            Self::Domino => "DOMINO",
            Self::ThreeNumberEasyHop => "THREE_NUMBER_EASY_HOP",
            Self::ThreeNumberHardHop => "THREE_NUMBER_HARD_HOP",
            Self::FourNumberEasyHop => "FOUR_NUMBER_EASY_HOP",
        }
    }

    fn target(self, target: Option<u8>) -> Result<u8, CodecError> {
        let bet = self.name();
        match self {
            Self::Small | Self::Big | Self::Odd | Self::Even | Self::AnyTriple => Ok(0),
            Self::SpecificTriple | Self::SpecificDouble | Self::Single => {
                target_in(bet, target, 1..=6)
            }
            Self::Total => target_in(bet, target, 3..=18),
            Self::Domino => {
                let value = target.ok_or(CodecError::MissingTarget { bet })?;
                let (min, max) = (value >> 4, value & 0x0F);
                if face(min) && face(max) && min < max {
                    Ok(value)
                } else {
                    Err(CodecError::InvalidTarget { bet, target: value })
                }
            }
            Self::ThreeNumberEasyHop => face_mask(bet, target, 3),
            Self::FourNumberEasyHop => face_mask(bet, target, 4),
            Self::ThreeNumberHardHop => {
                let value = target.ok_or(CodecError::MissingTarget { bet })?;
                let (double, single) = (value >> 4, value & 0x0F);
                if face(double) && face(single) && double != single {
                    Ok(value)
                } else {
                    Err(CodecError::InvalidTarget { bet, target: value })
                }
            }
        }
    }
}

pub fn place(bet: &BetRecord) -> Result<Vec<u8>, CodecError> {
    encode_targeted_place(Move::Place as u8, bet)
}

pub fn roll() -> Vec<u8> {
    vec![Move::Roll as u8]
}

pub fn clear() -> Vec<u8> {
    vec![Move::Clear as u8]
}

pub fn atomic_batch(bets: &[BetRecord]) -> Result<Vec<u8>, CodecError> {
    encode_batch(Move::AtomicBatch as u8, LAYOUT, bets)
}

pub fn decode_atomic_batch(payload: &[u8]) -> Result<Vec<BetRecord>, CodecError> {
    decode_batch(Move::AtomicBatch as u8, LAYOUT, payload)
}

pub fn set_rules(rules: u8) -> Vec<u8> {
    vec![Move::SetRules as u8, rules]
}

/// Dice of the last roll, if the state carries a complete roll.
pub fn dice(state: &[u8]) -> Option<[u8; 3]> {
    let count = *state.first()? as usize;
    let rest = state.get(1 + count * LAYOUT.width()..)?;
    let dice = [*rest.first()?, *rest.get(1)?, *rest.get(2)?];
    dice.iter().all(|die| face(*die)).then_some(dice)
}
