//! Shared playing-card helpers.
//!
//! Cards are encoded as `0..=51`, where:
//! - suit = card / 13 (0..=3)
//! - rank = card % 13 (0..=12), 0 is Ace
//!
//! [super::CARD_HIDDEN] marks a slot that is not dealt or not revealed yet.

use super::CARD_HIDDEN;
use serde::Serialize;

/// Total cards in a standard deck.
pub const CARDS_PER_DECK: u8 = 52;

/// Ranks per suit.
pub const RANKS_PER_SUIT: u8 = 13;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Card {
    /// 1-based rank (1..=13), where 1 is Ace and 13 is King.
    pub rank: u8,
    /// Suit index (0..=3).
    pub suit: u8,
}

impl Card {
    /// Decodes a wire card, returning `None` for hidden or invalid slots.
    pub fn from_byte(card: u8) -> Option<Self> {
        if card == CARD_HIDDEN || card >= CARDS_PER_DECK {
            return None;
        }
        Some(Self {
            rank: card % RANKS_PER_SUIT + 1,
            suit: card / RANKS_PER_SUIT,
        })
    }
}

/// Decodes a run of card slots, keeping hidden slots as `None`.
pub fn cards(bytes: &[u8]) -> Vec<Option<Card>> {
    bytes.iter().copied().map(Card::from_byte).collect()
}
