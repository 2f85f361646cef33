//! Craps payloads.
//!
//! Payload format:
//! - `[0, bet_type, target, amount:u64]` place a bet
//! - `[1, amount:u64]` add odds to the last contract bet
//! - `[2]` roll
//! - `[3]` clear bets (before the first roll only)
//! - `[4, bet_count, (bet_type, target, amount:u64) × count]` atomic batch (place + roll)
//!
//! State blob (v2):
//! `[version=2][phase][main_point][d1][d2][made_points_mask][epoch_point_established][bet_count][bets × 19]`

use super::{
    decode_batch, encode_amount, encode_batch, encode_targeted_place, target_in, BatchLayout,
    BetKind, BetRecord, CodecError,
};
use serde::Serialize;

pub const LAYOUT: BatchLayout = BatchLayout::Targeted;

/// Point numbers accepted by YES, NO and BUY bets.
pub const POINT_NUMBERS: [u8; 6] = [4, 5, 6, 8, 9, 10];

const STATE_VERSION: u8 = 2;
const STATE_HEADER_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Move {
    Place = 0,
    AddOdds = 1,
    Roll = 2,
    Clear = 3,
    AtomicBatch = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BetType {
    Pass = 0,
    DontPass = 1,
    Come = 2,
    DontCome = 3,
    Field = 4,
    Yes = 5,
    No = 6,
    Next = 7,
    Hardway4 = 8,
    Hardway6 = 9,
    Hardway8 = 10,
    Hardway10 = 11,
    Fire = 12,
    Buy = 13,
    AtsSmall = 15,
    AtsTall = 16,
    AtsAll = 17,
}

impl BetKind for BetType {
    const GAME: &'static str = "craps";

    fn lookup(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "PASS" | "PASS_LINE" => Self::Pass,
            "DONT_PASS" => Self::DontPass,
            "COME" => Self::Come,
            "DONT_COME" => Self::DontCome,
            "FIELD" => Self::Field,
            "YES" | "PLACE" => Self::Yes,
            "NO" | "LAY" => Self::No,
            "NEXT" | "HOP" => Self::Next,
            "HARDWAY_4" | "HARD_4" => Self::Hardway4,
            "HARDWAY_6" | "HARD_6" => Self::Hardway6,
            "HARDWAY_8" | "HARD_8" => Self::Hardway8,
            "HARDWAY_10" | "HARD_10" => Self::Hardway10,
            "FIRE" => Self::Fire,
            "BUY" => Self::Buy,
            "ATS_SMALL" => Self::AtsSmall,
            "ATS_TALL" => Self::AtsTall,
            "ATS_ALL" => Self::AtsAll,
            _ => return None,
        })
    }

    fn code(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::DontPass => "DONT_PASS",
            Self::Come => "COME",
            Self::DontCome => "DONT_COME",
            Self::Field => "FIELD",
            Self::Yes => "YES",
            Self::No => "NO",
            Self::Next => "NEXT",
            Self::Hardway4 => "HARDWAY_4",
            Self::Hardway6 => "HARDWAY_6",
            Self::Hardway8 => "HARDWAY_8",
            Self::Hardway10 => "HARDWAY_10",
            Self::Fire => "FIRE",
            Self::Buy => "BUY",
            Self::AtsSmall => "ATS_SMALL",
            Self::AtsTall => "ATS_TALL",
            Self::AtsAll => "ATS_ALL",
        }
    }

    fn target(self, target: Option<u8>) -> Result<u8, CodecError> {
        let bet = self.name();
        match self {
            Self::Yes | Self::No | Self::Buy => {
                let point = target.ok_or(CodecError::MissingTarget { bet })?;
                if POINT_NUMBERS.contains(&point) {
                    Ok(point)
                } else {
                    Err(CodecError::InvalidTarget { bet, target: point })
                }
            }
            Self::Next => target_in(bet, target, 2..=12),
            _ => Ok(0),
        }
    }
}

pub fn place(bet: &BetRecord) -> Result<Vec<u8>, CodecError> {
    encode_targeted_place(Move::Place as u8, bet)
}

pub fn add_odds(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Move::AddOdds as u8, amount)
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

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrapsView {
    pub point_phase: bool,
    pub point: Option<u8>,
    pub dice: Option<[u8; 2]>,
    pub made_points_mask: u8,
    pub bet_count: u8,
}

pub fn parse_state(state: &[u8]) -> Option<CrapsView> {
    if state.len() < STATE_HEADER_LEN || state[0] != STATE_VERSION {
        return None;
    }
    let die = |d: u8| (1..=6).contains(&d).then_some(d);
    Some(CrapsView {
        point_phase: state[1] == 1,
        point: POINT_NUMBERS.contains(&state[2]).then_some(state[2]),
        dice: die(state[3]).zip(die(state[4])).map(|(a, b)| [a, b]),
        made_points_mask: state[5],
        bet_count: state[7],
    })
}
