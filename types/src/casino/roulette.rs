//! Roulette payloads.
//!
//! Payload format:
//! - `[0, bet_type, number, amount:u64]` place a bet
//! - `[1]` spin
//! - `[2]` clear pending bets
//! - `[3, zero_rule]` choose the wheel / zero rule
//! - `[4, bet_count, (bet_type, number, amount:u64) × count]` atomic batch (place + spin)
//!
//! State blob: `[bet_count][zero_rule][phase][total_wagered:u64][pending_return:u64][bets × 10][result]?`

use super::{
    decode_batch, encode_batch, encode_targeted_place, target_in, BatchLayout, BetKind, BetRecord,
    CodecError,
};
use bytes::Buf;
use serde::Serialize;

pub const LAYOUT: BatchLayout = BatchLayout::Targeted;

/// Wire value used for the `00` pocket on an American wheel.
pub const DOUBLE_ZERO: u8 = 37;

const STATE_HEADER_LEN: usize = 19;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Move {
    Place = 0,
    Spin = 1,
    Clear = 2,
    SetZeroRule = 3,
    AtomicBatch = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ZeroRule {
    Standard = 0,
    LaPartage = 1,
    EnPrison = 2,
    EnPrisonDouble = 3,
    American = 4,
}

impl ZeroRule {
    pub fn from_symbol(symbol: &str) -> Result<Self, CodecError> {
        match super::normalize_symbol(symbol).as_str() {
            "STANDARD" | "EUROPEAN" => Ok(Self::Standard),
            "LA_PARTAGE" => Ok(Self::LaPartage),
            "EN_PRISON" => Ok(Self::EnPrison),
            "EN_PRISON_DOUBLE" => Ok(Self::EnPrisonDouble),
            "AMERICAN" => Ok(Self::American),
            _ => Err(CodecError::InvalidOption {
                field: "zeroRule",
                value: symbol.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for ZeroRule {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Standard),
            1 => Ok(Self::LaPartage),
            2 => Ok(Self::EnPrison),
            3 => Ok(Self::EnPrisonDouble),
            4 => Ok(Self::American),
            v => Err(CodecError::InvalidOption {
                field: "zeroRule",
                value: v.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BetType {
    Straight = 0,
    Red = 1,
    Black = 2,
    Even = 3,
    Odd = 4,
    Low = 5,
    High = 6,
    Dozen = 7,
    Column = 8,
    SplitH = 9,
    SplitV = 10,
    Street = 11,
    Corner = 12,
    SixLine = 13,
}

impl BetKind for BetType {
    const GAME: &'static str = "roulette";

    fn lookup(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "STRAIGHT" | "NUMBER" | "STRAIGHT_UP" => Self::Straight,
            "RED" => Self::Red,
            "BLACK" => Self::Black,
            "EVEN" => Self::Even,
            "ODD" => Self::Odd,
            "LOW" | "1_18" => Self::Low,
            "HIGH" | "19_36" => Self::High,
            "DOZEN" => Self::Dozen,
            "COLUMN" => Self::Column,
            "SPLIT_H" | "SPLIT" => Self::SplitH,
            "SPLIT_V" => Self::SplitV,
            "STREET" => Self::Street,
            "CORNER" => Self::Corner,
            "SIX_LINE" | "LINE" => Self::SixLine,
            _ => return None,
        })
    }

    fn code(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Self::Straight => "STRAIGHT",
            Self::Red => "RED",
            Self::Black => "BLACK",
            Self::Even => "EVEN",
            Self::Odd => "ODD",
            Self::Low => "LOW",
            Self::High => "HIGH",
            Self::Dozen => "DOZEN",
            Self::Column => "COLUMN",
            Self::SplitH => "SPLIT_H",
            Self::SplitV => "SPLIT_V",
            Self::Street => "STREET",
            Self::Corner => "CORNER",
            Self::SixLine => "SIX_LINE",
        }
    }

    fn target(self, target: Option<u8>) -> Result<u8, CodecError> {
        let bet = self.name();
        let checked = |ok: fn(u8) -> bool| {
            let value = target.ok_or(CodecError::MissingTarget { bet })?;
            if ok(value) {
                Ok(value)
            } else {
                Err(CodecError::InvalidTarget { bet, target: value })
            }
        };
        match self {
            Self::Red | Self::Black | Self::Even | Self::Odd | Self::Low | Self::High => Ok(0),
            Self::Straight => target_in(bet, target, 0..=DOUBLE_ZERO),
            Self::Dozen | Self::Column => target_in(bet, target, 0..=2),
            Self::SplitH => checked(|n| (1..=35).contains(&n) && n % 3 != 0),
            Self::SplitV => target_in(bet, target, 1..=33),
            Self::Street => checked(|n| (1..=34).contains(&n) && n % 3 == 1),
            Self::Corner => checked(|n| (1..=32).contains(&n) && n % 3 != 0),
            Self::SixLine => checked(|n| (1..=31).contains(&n) && n % 3 == 1),
        }
    }
}

pub fn place(bet: &BetRecord) -> Result<Vec<u8>, CodecError> {
    encode_targeted_place(Move::Place as u8, bet)
}

pub fn spin() -> Vec<u8> {
    vec![Move::Spin as u8]
}

pub fn clear() -> Vec<u8> {
    vec![Move::Clear as u8]
}

pub fn set_zero_rule(rule: ZeroRule) -> Vec<u8> {
    vec![Move::SetZeroRule as u8, rule as u8]
}

pub fn atomic_batch(bets: &[BetRecord]) -> Result<Vec<u8>, CodecError> {
    encode_batch(Move::AtomicBatch as u8, LAYOUT, bets)
}

pub fn decode_atomic_batch(payload: &[u8]) -> Result<Vec<BetRecord>, CodecError> {
    decode_batch(Move::AtomicBatch as u8, LAYOUT, payload)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouletteView {
    pub zero_rule: ZeroRule,
    pub in_prison: bool,
    pub total_wagered: u64,
    pub bet_count: u8,
    /// Winning pocket of the last spin (`37` is `00`).
    pub result: Option<u8>,
}

pub fn parse_state(state: &[u8]) -> Option<RouletteView> {
    if state.len() < STATE_HEADER_LEN {
        return None;
    }
    let mut reader = state;
    let bet_count = reader.get_u8();
    let zero_rule = ZeroRule::try_from(reader.get_u8()).ok()?;
    let in_prison = reader.get_u8() == 1;
    let total_wagered = reader.get_u64();
    let _pending_return = reader.get_u64();
    let bets_len = bet_count as usize * LAYOUT.width();
    if reader.len() < bets_len {
        return None;
    }
    reader.advance(bets_len);
    Some(RouletteView {
        zero_rule,
        in_prison,
        total_wagered,
        bet_count,
        result: reader.first().copied(),
    })
}
