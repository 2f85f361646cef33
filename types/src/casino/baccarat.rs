//! Baccarat payloads.
//!
//! Payload format:
//! - `[0, bet_type, amount:u64]` place a bet
//! - `[1]` deal and resolve
//! - `[2]` clear pending bets
//! - `[3, bet_count, (bet_type, amount:u64) × count]` atomic batch (place + deal), 9 bytes per bet
//!
//! State blob: `[bet_count] [bets × 9] [player_len] [player cards] [banker_len] [banker cards]`

use super::{
    cards::{cards, Card},
    decode_batch, encode_batch, ensure_positive, BatchLayout, BetKind, BetRecord, CodecError,
};
use commonware_codec::Write;
use serde::Serialize;

pub const LAYOUT: BatchLayout = BatchLayout::Untargeted;

const MAX_HAND_SIZE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Move {
    Place = 0,
    Deal = 1,
    Clear = 2,
    AtomicBatch = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BetType {
    Player = 0,
    Banker = 1,
    Tie = 2,
    PlayerPair = 3,
    BankerPair = 4,
    Lucky6 = 5,
    PlayerDragon = 6,
    BankerDragon = 7,
    Panda8 = 8,
    PerfectPair = 9,
}

impl BetKind for BetType {
    const GAME: &'static str = "baccarat";

    fn lookup(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "PLAYER" => Self::Player,
            "BANKER" => Self::Banker,
            "TIE" => Self::Tie,
            "PLAYER_PAIR" | "P_PAIR" => Self::PlayerPair,
            "BANKER_PAIR" | "B_PAIR" => Self::BankerPair,
            "LUCKY_6" | "LUCKY6" => Self::Lucky6,
            "PLAYER_DRAGON" | "P_DRAGON" => Self::PlayerDragon,
            "BANKER_DRAGON" | "B_DRAGON" => Self::BankerDragon,
            "PANDA_8" | "PANDA8" => Self::Panda8,
            "PERFECT_PAIR" => Self::PerfectPair,
            _ => return None,
        })
    }

    fn code(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Self::Player => "PLAYER",
            Self::Banker => "BANKER",
            Self::Tie => "TIE",
            Self::PlayerPair => "PLAYER_PAIR",
            Self::BankerPair => "BANKER_PAIR",
            Self::Lucky6 => "LUCKY_6",
            Self::PlayerDragon => "PLAYER_DRAGON",
            Self::BankerDragon => "BANKER_DRAGON",
            Self::Panda8 => "PANDA_8",
            Self::PerfectPair => "PERFECT_PAIR",
        }
    }

    fn target(self, _target: Option<u8>) -> Result<u8, CodecError> {
        Ok(0)
    }
}

pub fn place(bet: &BetRecord) -> Result<Vec<u8>, CodecError> {
    let mut payload = Vec::with_capacity(1 + LAYOUT.width());
    (Move::Place as u8).write(&mut payload);
    bet.bet_type.write(&mut payload);
    ensure_positive(bet.amount)?.write(&mut payload);
    Ok(payload)
}

pub fn deal() -> Vec<u8> {
    vec![Move::Deal as u8]
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

/// Baccarat point value of a hand: face cards and tens count zero, total modulo 10.
pub fn hand_total(hand: &[Option<Card>]) -> u8 {
    hand.iter()
        .flatten()
        .map(|card| if card.rank >= 10 { 0 } else { card.rank })
        .sum::<u8>()
        % 10
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaccaratView {
    pub bet_count: u8,
    pub player_cards: Vec<Option<Card>>,
    pub banker_cards: Vec<Option<Card>>,
    pub player_total: u8,
    pub banker_total: u8,
}

pub fn parse_state(state: &[u8]) -> Option<BaccaratView> {
    let bet_count = *state.first()?;
    let mut rest = state.get(1 + bet_count as usize * LAYOUT.width()..)?;
    let mut hand = || -> Option<Vec<Option<Card>>> {
        let Some((&len, tail)) = rest.split_first() else {
            return Some(Vec::new());
        };
        let len = len as usize;
        if len > MAX_HAND_SIZE || tail.len() < len {
            return None;
        }
        let hand = cards(&tail[..len]);
        rest = &tail[len..];
        Some(hand)
    };
    let player_cards = hand()?;
    let banker_cards = hand()?;
    Some(BaccaratView {
        bet_count,
        player_total: hand_total(&player_cards),
        banker_total: hand_total(&banker_cards),
        player_cards,
        banker_cards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_batch_layout() {
        let bets = [BetRecord::parse::<BetType>("PLAYER", None, 25).unwrap()];
        let payload = atomic_batch(&bets).unwrap();
        assert_eq!(payload, vec![3, 1, 0, 0, 0, 0, 0, 0, 0, 0, 25]);
        assert_eq!(decode_atomic_batch(&payload).unwrap(), bets);
    }

    #[test]
    fn test_batch_roundtrip_over_table() {
        let bets: Vec<_> = [
            BetType::Player,
            BetType::Banker,
            BetType::Tie,
            BetType::PlayerPair,
            BetType::BankerPair,
            BetType::Lucky6,
            BetType::PlayerDragon,
            BetType::BankerDragon,
            BetType::Panda8,
            BetType::PerfectPair,
        ]
        .into_iter()
        .zip(1..)
        .map(|(kind, amount)| BetRecord::new(kind, None, amount).unwrap())
        .collect();
        let payload = atomic_batch(&bets).unwrap();
        assert_eq!(payload.len(), 2 + bets.len() * LAYOUT.width());
        assert_eq!(decode_atomic_batch(&payload).unwrap(), bets);
    }

    #[test]
    fn test_place_layout() {
        let bet = BetRecord::parse::<BetType>("tie", None, 1).unwrap();
        assert_eq!(place(&bet).unwrap(), vec![0, 2, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_unknown_symbol() {
        assert!(matches!(
            BetType::from_symbol("DRAGON"),
            Err(CodecError::UnknownBetType { game: "baccarat", .. })
        ));
    }

    #[test]
    fn test_parse_state_totals() {
        // One PLAYER bet, player holds 7 + K, banker holds 4 + 5 + hidden.
        let mut state = vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 10];
        state.extend_from_slice(&[2, 6, 12, 3, 16, 4, 0xFF]);
        let view = parse_state(&state).unwrap();
        assert_eq!(view.player_total, 7);
        assert_eq!(view.banker_total, 9);
        assert_eq!(view.banker_cards[2], None);

        let betting = parse_state(&state[..10]).unwrap();
        assert!(betting.player_cards.is_empty());
        assert_eq!(parse_state(&[1, 0]), None);
    }
}
