//! Video Poker (Jacks or Better) payloads.
//!
//! A draw is a single hold-mask byte: bit `i` holds card `i + 1`. `[0xFF, rules]` sets the
//! paytable before the draw.
//!
//! State blob: `[stage][c1..c5][rules]?` where stage 0 is Deal and 1 is Draw.

use super::{
    cards::{cards, Card},
    CodecError, VIDEO_POKER_HAND_SIZE,
};
use serde::Serialize;

pub const SET_RULES: u8 = 0xFF;

/// Encodes the hold mask from one flag per card.
pub fn hold(held: &[bool]) -> Result<Vec<u8>, CodecError> {
    if held.len() != VIDEO_POKER_HAND_SIZE {
        return Err(CodecError::InvalidOption {
            field: "held",
            value: format!("{} cards", held.len()),
        });
    }
    let mask = held
        .iter()
        .enumerate()
        .filter(|(_, hold)| **hold)
        .fold(0u8, |mask, (i, _)| mask | (1 << i));
    Ok(vec![mask])
}

/// Parses a hold string such as `"10100"`, where `1` holds the card at that position.
pub fn parse_held(held: &str) -> Result<Vec<bool>, CodecError> {
    held.chars()
        .map(|c| match c {
            '1' => Ok(true),
            '0' => Ok(false),
            _ => Err(CodecError::InvalidOption {
                field: "held",
                value: held.to_string(),
            }),
        })
        .collect()
}

pub fn set_rules(rules: u8) -> Vec<u8> {
    vec![SET_RULES, rules]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPokerView {
    pub drawn: bool,
    pub cards: Vec<Option<Card>>,
}

pub fn parse_state(state: &[u8]) -> Option<VideoPokerView> {
    let hand = state.get(1..=VIDEO_POKER_HAND_SIZE)?;
    Some(VideoPokerView {
        drawn: match state[0] {
            0 => false,
            1 => true,
            _ => return None,
        },
        cards: cards(hand),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_mask() {
        let held = parse_held("10100").unwrap();
        assert_eq!(hold(&held).unwrap(), vec![0b00101]);
        assert_eq!(hold(&[true; 5]).unwrap(), vec![0b11111]);
        assert!(hold(&[true; 4]).is_err());
        assert!(parse_held("1x100").is_err());
    }

    #[test]
    fn test_parse_state() {
        let view = parse_state(&[0, 0, 13, 26, 39, 12, 0]).unwrap();
        assert!(!view.drawn);
        assert_eq!(view.cards.len(), VIDEO_POKER_HAND_SIZE);
        assert_eq!(view.cards[3], Some(Card { rank: 1, suit: 3 }));
        assert_eq!(parse_state(&[2, 0, 0, 0, 0, 0]), None);
        assert_eq!(parse_state(&[0, 1]), None);
    }
}
