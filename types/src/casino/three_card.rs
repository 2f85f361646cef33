//! Three Card Poker payloads.
//!
//! Payload format: `[move:u8] [optional amount:u64]`
//! - 0 Play, 1 Fold
//! - 2 Deal, optionally carrying the Pairplus amount
//! - 3 Set Pairplus, 5 Set 6-card bonus, 6 Set progressive (each `[op, amount:u64]`)
//! - 4 Reveal
//! - 8 Set rules `[8, rules:u8]`
//!
//! A Play leaves the session in [Stage::AwaitingReveal]; the hand is resolved by a Reveal.
//!
//! State blob: `[version=3][stage][p1 p2 p3][d1 d2 d3][pairplus:u64][six_card:u64][progressive:u64][rules]?`

use super::{
    cards::{cards, Card},
    encode_amount, CodecError,
};
use commonware_codec::Write;
use serde::Serialize;

const STATE_VERSION: u8 = 3;
const STATE_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Move {
    Play = 0,
    Fold = 1,
    Deal = 2,
    SetPairplus = 3,
    Reveal = 4,
    SetSixCard = 5,
    SetProgressive = 6,
    SetRules = 8,
}

impl Move {
    pub fn payload(self) -> Vec<u8> {
        vec![self as u8]
    }
}

/// Deal, folding an optional Pairplus wager into the same move.
pub fn deal(pairplus: Option<u64>) -> Vec<u8> {
    let mut payload = vec![Move::Deal as u8];
    if let Some(amount) = pairplus.filter(|amount| *amount > 0) {
        amount.write(&mut payload);
    }
    payload
}

pub fn set_pairplus(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Move::SetPairplus as u8, amount)
}

pub fn set_six_card(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Move::SetSixCard as u8, amount)
}

pub fn set_progressive(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Move::SetProgressive as u8, amount)
}

pub fn set_rules(rules: u8) -> Vec<u8> {
    vec![Move::SetRules as u8, rules]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Betting,
    Decision,
    AwaitingReveal,
    Complete,
}

pub fn stage(state: &[u8]) -> Option<Stage> {
    match state {
        [STATE_VERSION, 0, ..] => Some(Stage::Betting),
        [STATE_VERSION, 1, ..] => Some(Stage::Decision),
        [STATE_VERSION, 2, ..] => Some(Stage::AwaitingReveal),
        [STATE_VERSION, 3, ..] => Some(Stage::Complete),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeCardView {
    pub stage: Stage,
    pub player_cards: Vec<Option<Card>>,
    pub dealer_cards: Vec<Option<Card>>,
    pub pairplus: u64,
    pub six_card: u64,
    pub progressive: u64,
}

pub fn parse_state(state: &[u8]) -> Option<ThreeCardView> {
    if state.len() < STATE_LEN {
        return None;
    }
    let amount = |offset: usize| -> Option<u64> {
        Some(u64::from_be_bytes(state[offset..offset + 8].try_into().ok()?))
    };
    Some(ThreeCardView {
        stage: stage(state)?,
        player_cards: cards(&state[2..5]),
        dealer_cards: cards(&state[5..8]),
        pairplus: amount(8)?,
        six_card: amount(16)?,
        progressive: amount(24)?,
    })
}
