//! Ultimate Texas Hold'em payloads.
//!
//! Payload format: `[action:u8] [optional amount:u64]`
//!
//! | action | opcode | operand |
//! |--------|--------|---------|
//! | Check | 0 | |
//! | Bet 4x | 1 | |
//! | Bet 2x | 2 | |
//! | Bet 1x | 3 | |
//! | Fold | 4 | |
//! | Deal | 5 | |
//! | Set Trips | 6 | amount |
//! | Reveal | 7 | |
//! | Bet 3x | 8 | |
//! | Set 6-card bonus | 9 | amount |
//! | Set progressive | 10 | amount |
//!
//! A play bet or a river fold parks the hand in [Stage::AwaitingReveal]; the dealer's cards are
//! only drawn by a Reveal.
//!
//! State blob: `[version][stage][p1 p2][community × 5][d1 d2][play_multiplier]...`

use super::{
    cards::{cards, Card},
    encode_amount, CodecError,
};
use serde::Serialize;

const STATE_HEADER_LEN: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Action {
    Check = 0,
    Bet4x = 1,
    Bet2x = 2,
    Bet1x = 3,
    Fold = 4,
    Deal = 5,
    SetTrips = 6,
    Reveal = 7,
    Bet3x = 8,
    SetSixCard = 9,
    SetProgressive = 10,
}

impl Action {
    pub fn payload(self) -> Vec<u8> {
        vec![self as u8]
    }

    /// Play bet for a multiple of the ante.
    pub fn bet(multiplier: u64) -> Result<Self, CodecError> {
        match multiplier {
            4 => Ok(Self::Bet4x),
            3 => Ok(Self::Bet3x),
            2 => Ok(Self::Bet2x),
            1 => Ok(Self::Bet1x),
            m => Err(CodecError::InvalidOption {
                field: "multiplier",
                value: m.to_string(),
            }),
        }
    }
}

pub fn set_trips(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Action::SetTrips as u8, amount)
}

pub fn set_six_card(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Action::SetSixCard as u8, amount)
}

pub fn set_progressive(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Action::SetProgressive as u8, amount)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Betting,
    Preflop,
    Flop,
    River,
    AwaitingReveal,
    Showdown,
}

pub fn stage(state: &[u8]) -> Option<Stage> {
    Some(match state.get(1)? {
        0 => Stage::Betting,
        1 => Stage::Preflop,
        2 => Stage::Flop,
        3 => Stage::River,
        4 => Stage::AwaitingReveal,
        5 => Stage::Showdown,
        _ => return None,
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UltimateHoldemView {
    pub stage: Stage,
    pub player_cards: Vec<Option<Card>>,
    pub community_cards: Vec<Option<Card>>,
    pub dealer_cards: Vec<Option<Card>>,
    pub play_multiplier: u8,
}

pub fn parse_state(state: &[u8]) -> Option<UltimateHoldemView> {
    if state.len() < STATE_HEADER_LEN {
        return None;
    }
    Some(UltimateHoldemView {
        stage: stage(state)?,
        player_cards: cards(&state[2..4]),
        community_cards: cards(&state[4..9]),
        dealer_cards: cards(&state[9..11]),
        play_multiplier: state[11],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bet_multipliers() {
        assert_eq!(Action::bet(4).unwrap().payload(), vec![1]);
        assert_eq!(Action::bet(3).unwrap().payload(), vec![8]);
        assert_eq!(Action::bet(2).unwrap().payload(), vec![2]);
        assert_eq!(Action::bet(1).unwrap().payload(), vec![3]);
        assert!(Action::bet(5).is_err());
        assert!(Action::bet(0).is_err());
    }

    #[test]
    fn test_side_bets() {
        assert_eq!(set_trips(5).unwrap(), vec![6, 0, 0, 0, 0, 0, 0, 0, 5]);
        assert_eq!(set_six_card(5).unwrap()[0], 9);
        assert_eq!(set_progressive(5).unwrap()[0], 10);
    }

    #[test]
    fn test_parse_state() {
        let state = [1, 2, 0, 13, 1, 2, 3, 0xFF, 0xFF, 0xFF, 0xFF, 0];
        let view = parse_state(&state).unwrap();
        assert_eq!(view.stage, Stage::Flop);
        assert_eq!(view.community_cards.iter().flatten().count(), 3);
        assert!(view.dealer_cards.iter().all(Option::is_none));
        assert_eq!(stage(&[1, 4]), Some(Stage::AwaitingReveal));
        assert_eq!(parse_state(&state[..6]), None);
    }
}
