//! HiLo payloads.
//!
//! Each move is a single byte: 0 Higher, 1 Lower, 2 Cashout, 3 Same.
//!
//! State blob: `[current_card][accumulator:i64 (basis points)][rules]?`

use super::{cards::Card, normalize_symbol, CodecError};
use serde::Serialize;

/// Multiplier denominator of the accumulator (1.0x = 10_000).
pub const BASIS_POINTS: i64 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Move {
    Higher = 0,
    Lower = 1,
    Cashout = 2,
    Same = 3,
}

impl Move {
    pub fn payload(self) -> Vec<u8> {
        vec![self as u8]
    }

    /// Guess named by a client `choice` field.
    pub fn from_choice(choice: &str) -> Result<Self, CodecError> {
        match normalize_symbol(choice).as_str() {
            "HIGHER" | "HI" => Ok(Self::Higher),
            "LOWER" | "LO" => Ok(Self::Lower),
            "SAME" | "EQUAL" => Ok(Self::Same),
            _ => Err(CodecError::InvalidOption {
                field: "choice",
                value: choice.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiLoView {
    pub card: Option<Card>,
    pub multiplier_bps: i64,
    pub multiplier: f64,
}

pub fn parse_state(state: &[u8]) -> Option<HiLoView> {
    if state.len() < 9 {
        return None;
    }
    let multiplier_bps = i64::from_be_bytes(state[1..9].try_into().ok()?);
    Some(HiLoView {
        card: Card::from_byte(state[0]),
        multiplier_bps,
        multiplier: multiplier_bps as f64 / BASIS_POINTS as f64,
    })
}
