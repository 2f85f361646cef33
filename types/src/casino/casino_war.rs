//! Casino War payloads.
//!
//! State blob: `[version=1][stage][player_card][dealer_card][tie_bet:u64][rules]?`

use super::{cards::Card, encode_amount, CodecError};
use serde::Serialize;

const STATE_VERSION: u8 = 1;
const STATE_LEN: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Move {
    Play = 0,
    War = 1,
    Surrender = 2,
    SetTieBet = 3,
    SetRules = 5,
}

impl Move {
    pub fn payload(self) -> Vec<u8> {
        vec![self as u8]
    }
}

pub fn set_tie_bet(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Move::SetTieBet as u8, amount)
}

pub fn set_rules(rules: u8) -> Vec<u8> {
    vec![Move::SetRules as u8, rules]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Betting,
    War,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CasinoWarView {
    pub stage: Stage,
    pub player_card: Option<Card>,
    pub dealer_card: Option<Card>,
    pub tie_bet: u64,
}

pub fn parse_state(state: &[u8]) -> Option<CasinoWarView> {
    if state.len() < STATE_LEN || state[0] != STATE_VERSION {
        return None;
    }
    let stage = match state[1] {
        0 => Stage::Betting,
        1 => Stage::War,
        2 => Stage::Complete,
        _ => return None,
    };
    Some(CasinoWarView {
        stage,
        player_card: Card::from_byte(state[2]),
        dealer_card: Card::from_byte(state[3]),
        tie_bet: u64::from_be_bytes(state[4..12].try_into().ok()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payloads() {
        assert_eq!(Move::Play.payload(), vec![0]);
        assert_eq!(Move::Surrender.payload(), vec![2]);
        assert_eq!(set_tie_bet(2).unwrap(), vec![3, 0, 0, 0, 0, 0, 0, 0, 2]);
        assert_eq!(set_rules(1), vec![5, 1]);
    }

    #[test]
    fn test_war_state() {
        let mut state = vec![1, 1, 9, 22];
        state.extend_from_slice(&0u64.to_be_bytes());
        let view = parse_state(&state).unwrap();
        assert_eq!(view.stage, Stage::War);
        assert_eq!(view.player_card.map(|c| c.rank), Some(10));
        assert_eq!(view.dealer_card.map(|c| c.rank), Some(10));
        assert_eq!(parse_state(&state[..4]), None);
    }
}
