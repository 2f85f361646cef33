//! Blackjack payloads and state view.
//!
//! Payload format: `[move:u8] [optional operand]`
//! - 0 Hit
//! - 1 Stand
//! - 2 Double down
//! - 3 Split
//! - 4 Deal
//! - 5 Set 21+3 side bet `[5, amount:u64]`
//! - 6 Reveal (dealer hole card, resolves the hand)
//! - 7 Surrender
//! - 8 Set rules `[8, flags:u8, decks:u8]`
//!
//! The ledger only resolves a hand after an explicit Reveal: a Stand or Double that finishes the
//! player's turn leaves the session in [Stage::AwaitingReveal].
//!
//! State blob format (v4):
//! ```text
//! [version=4] [stage]
//! [side bets: 21+3, lucky ladies, perfect pairs, bust it, royal match : u64 × 5]
//! [initial player cards: u8 × 2] [active hand] [hand count]
//! per hand: [bet_mult] [status] [was_split] [card_count] [cards...]
//! [dealer_count] [dealer cards...]
//! [rules_flags] [rules_decks] (optional)
//! ```

use super::{cards::{cards, Card}, encode_amount, CodecError};
use serde::Serialize;

const STATE_VERSION: u8 = 4;
const STATE_HEADER_LEN: usize = 46;
const MAX_HANDS: usize = 4;
const MAX_HAND_SIZE: usize = 11;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Move {
    Hit = 0,
    Stand = 1,
    Double = 2,
    Split = 3,
    Deal = 4,
    Set21Plus3 = 5,
    Reveal = 6,
    Surrender = 7,
    SetRules = 8,
}

impl Move {
    /// Single-byte payload for moves without an operand.
    pub fn payload(self) -> Vec<u8> {
        vec![self as u8]
    }
}

pub fn set_21_plus_3(amount: u64) -> Result<Vec<u8>, CodecError> {
    encode_amount(Move::Set21Plus3 as u8, amount)
}

pub fn set_rules(flags: u8, decks: u8) -> Vec<u8> {
    vec![Move::SetRules as u8, flags, decks]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Betting,
    PlayerTurn,
    AwaitingReveal,
    Complete,
}

impl Stage {
    fn from_byte(stage: u8) -> Option<Self> {
        Some(match stage {
            0 => Self::Betting,
            1 => Self::PlayerTurn,
            2 => Self::AwaitingReveal,
            3 => Self::Complete,
            _ => return None,
        })
    }
}

/// Stage byte of a state blob, if it is a v4 blackjack state.
pub fn stage(state: &[u8]) -> Option<Stage> {
    match state {
        [STATE_VERSION, stage, ..] => Stage::from_byte(*stage),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandStatus {
    Playing,
    Stand,
    Bust,
    Blackjack,
    Surrendered,
}

impl HandStatus {
    fn from_byte(status: u8) -> Option<Self> {
        Some(match status {
            0 => Self::Playing,
            1 => Self::Stand,
            2 => Self::Bust,
            3 => Self::Blackjack,
            4 => Self::Surrendered,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandView {
    pub cards: Vec<Option<Card>>,
    pub total: u8,
    pub soft: bool,
    pub status: HandStatus,
    pub doubled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackjackView {
    pub stage: Stage,
    pub side_bet_21_plus_3: u64,
    pub active_hand: u8,
    pub hands: Vec<HandView>,
    pub dealer_cards: Vec<Option<Card>>,
    pub dealer_total: u8,
}

/// Best total of a hand, counting one ace as 11 when it does not bust. Returns `(total, soft)`.
pub fn hand_value(hand: &[Option<Card>]) -> (u8, bool) {
    let mut total: u8 = 0;
    let mut aces = false;
    for card in hand.iter().flatten() {
        total = total.saturating_add(card.rank.min(10));
        aces |= card.rank == 1;
    }
    if aces && total <= 11 {
        (total + 10, true)
    } else {
        (total, false)
    }
}

struct Cursor<'a>(&'a [u8]);

impl<'a> Cursor<'a> {
    fn u8(&mut self) -> Option<u8> {
        let (&byte, rest) = self.0.split_first()?;
        self.0 = rest;
        Some(byte)
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.0.len() < len {
            return None;
        }
        let (head, rest) = self.0.split_at(len);
        self.0 = rest;
        Some(head)
    }
}

pub fn parse_state(state: &[u8]) -> Option<BlackjackView> {
    if state.len() < STATE_HEADER_LEN || state[0] != STATE_VERSION {
        return None;
    }
    let stage = Stage::from_byte(state[1])?;
    let side_bet_21_plus_3 = u64::from_be_bytes(state[2..10].try_into().ok()?);
    let active_hand = state[44];
    let hand_count = state[45] as usize;
    if hand_count > MAX_HANDS {
        return None;
    }

    let mut cursor = Cursor(&state[STATE_HEADER_LEN..]);
    let mut hands = Vec::with_capacity(hand_count);
    for _ in 0..hand_count {
        let bet_mult = cursor.u8()?;
        let status = HandStatus::from_byte(cursor.u8()?)?;
        let _was_split = cursor.u8()?;
        let count = cursor.u8()? as usize;
        if count > MAX_HAND_SIZE {
            return None;
        }
        let hand = cards(cursor.take(count)?);
        let (total, soft) = hand_value(&hand);
        hands.push(HandView {
            cards: hand,
            total,
            soft,
            status,
            doubled: bet_mult == 2,
        });
    }
    let dealer_count = cursor.u8()? as usize;
    if dealer_count > MAX_HAND_SIZE {
        return None;
    }
    let dealer_cards = cards(cursor.take(dealer_count)?);
    let (dealer_total, _) = hand_value(&dealer_cards);

    Some(BlackjackView {
        stage,
        side_bet_21_plus_3,
        active_hand,
        hands,
        dealer_cards,
        dealer_total,
    })
}
