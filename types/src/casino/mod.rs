//! Casino game payload codecs.
//!
//! Every game move is carried inside an [crate::execution::Instruction::CasinoGameMove] as an
//! opaque payload whose first byte is a game-specific opcode. The submodules define those opcodes,
//! the bet-type tables shared with the casino program, and encoders for each move shape. All
//! integers are big-endian.
//!
//! Bet-type symbols are resolved through [BetKind::from_symbol], which fails closed: a symbol
//! missing from the table is an error, never a guess.

pub mod baccarat;
pub mod blackjack;
pub mod cards;
pub mod casino_war;
pub mod constants;
pub mod craps;
pub mod hilo;
pub mod roulette;
pub mod sic_bo;
pub mod three_card;
pub mod ultimate_holdem;
pub mod video_poker;

pub use constants::*;

use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Casino game types matching frontend GameType enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GameType {
    Baccarat = 0,
    Blackjack = 1,
    CasinoWar = 2,
    Craps = 3,
    VideoPoker = 4,
    HiLo = 5,
    Roulette = 6,
    SicBo = 7,
    ThreeCard = 8,
    UltimateHoldem = 9,
}

impl GameType {
    pub const ALL: [Self; 10] = [
        Self::Baccarat,
        Self::Blackjack,
        Self::CasinoWar,
        Self::Craps,
        Self::VideoPoker,
        Self::HiLo,
        Self::Roulette,
        Self::SicBo,
        Self::ThreeCard,
        Self::UltimateHoldem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baccarat => "baccarat",
            Self::Blackjack => "blackjack",
            Self::CasinoWar => "casino_war",
            Self::Craps => "craps",
            Self::VideoPoker => "video_poker",
            Self::HiLo => "hilo",
            Self::Roulette => "roulette",
            Self::SicBo => "sic_bo",
            Self::ThreeCard => "three_card",
            Self::UltimateHoldem => "ultimate_holdem",
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for GameType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(Error::InvalidEnum(value))
    }
}

impl Write for GameType {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for GameType {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Self::try_from(u8::read(reader)?)
    }
}

impl FixedSize for GameType {
    const SIZE: usize = 1;
}

/// Errors raised while turning a semantic bet or move into a payload.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown {game} bet type: {symbol}")]
    UnknownBetType { game: &'static str, symbol: String },
    #[error("bet amount must be a positive integer")]
    InvalidAmount,
    #[error("{bet} requires a target")]
    MissingTarget { bet: &'static str },
    #[error("invalid target {target} for {bet}")]
    InvalidTarget { bet: &'static str, target: u8 },
    #[error("at least one bet is required")]
    EmptyBatch,
    #[error("too many bets: {count} (max {max})")]
    BatchTooLarge { count: usize, max: usize },
    #[error("invalid option {value} for {field}")]
    InvalidOption { field: &'static str, value: String },
    #[error("payload truncated")]
    Truncated,
    #[error("unexpected opcode {got} (expected {expected})")]
    UnexpectedOpcode { expected: u8, got: u8 },
    #[error("payload has {0} trailing bytes")]
    TrailingBytes(usize),
}

/// Upper bound on records in a single atomic batch, matching the ledger limit.
pub const MAX_BATCH_BETS: usize = 20;

/// Rejects zero amounts before anything is encoded.
pub fn ensure_positive(amount: u64) -> Result<u64, CodecError> {
    if amount == 0 {
        return Err(CodecError::InvalidAmount);
    }
    Ok(amount)
}

/// Canonical form of a client-provided symbol: trimmed, upper-case, with `-` and spaces
/// folded into `_` so `"dont pass"`, `"DONT-PASS"` and `"dont_pass"` agree.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// A bet-type table shared with the casino program.
pub trait BetKind: Copy + std::fmt::Debug {
    /// Game the table belongs to, used in error messages.
    const GAME: &'static str;

    /// Looks up a normalized symbol. Unknown symbols return `None`.
    fn lookup(symbol: &str) -> Option<Self>;

    /// Wire code of the bet type.
    fn code(self) -> u8;

    /// Table name of the bet type.
    fn name(self) -> &'static str;

    /// Validates the target for this bet type, returning the byte to encode.
    fn target(self, target: Option<u8>) -> Result<u8, CodecError>;

    fn from_symbol(symbol: &str) -> Result<Self, CodecError> {
        Self::lookup(&normalize_symbol(symbol)).ok_or_else(|| CodecError::UnknownBetType {
            game: Self::GAME,
            symbol: symbol.to_string(),
        })
    }
}

/// Requires a target inside `range`.
pub(crate) fn target_in(
    bet: &'static str,
    target: Option<u8>,
    range: std::ops::RangeInclusive<u8>,
) -> Result<u8, CodecError> {
    let target = target.ok_or(CodecError::MissingTarget { bet })?;
    if !range.contains(&target) {
        return Err(CodecError::InvalidTarget { bet, target });
    }
    Ok(target)
}

/// A single validated bet in wire form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetRecord {
    pub bet_type: u8,
    pub target: u8,
    pub amount: u64,
}

impl BetRecord {
    /// Resolves and validates a bet against `B`'s table.
    pub fn parse<B: BetKind>(
        symbol: &str,
        target: Option<u8>,
        amount: u64,
    ) -> Result<Self, CodecError> {
        let kind = B::from_symbol(symbol)?;
        Self::new(kind, target, amount)
    }

    pub fn new<B: BetKind>(kind: B, target: Option<u8>, amount: u64) -> Result<Self, CodecError> {
        Ok(Self {
            bet_type: kind.code(),
            target: kind.target(target)?,
            amount: ensure_positive(amount)?,
        })
    }
}

/// Record layout of an atomic batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchLayout {
    /// `[bet_type:u8][target:u8][amount:u64]`
    Targeted,
    /// `[bet_type:u8][amount:u64]`
    Untargeted,
}

impl BatchLayout {
    pub const fn width(&self) -> usize {
        match self {
            Self::Targeted => 1 + 1 + 8,
            Self::Untargeted => 1 + 8,
        }
    }
}

/// Encodes `[opcode][count][record × count]`.
pub fn encode_batch(
    opcode: u8,
    layout: BatchLayout,
    bets: &[BetRecord],
) -> Result<Vec<u8>, CodecError> {
    if bets.is_empty() {
        return Err(CodecError::EmptyBatch);
    }
    if bets.len() > MAX_BATCH_BETS {
        return Err(CodecError::BatchTooLarge {
            count: bets.len(),
            max: MAX_BATCH_BETS,
        });
    }
    let mut payload = Vec::with_capacity(2 + bets.len() * layout.width());
    opcode.write(&mut payload);
    (bets.len() as u8).write(&mut payload);
    for bet in bets {
        ensure_positive(bet.amount)?;
        bet.bet_type.write(&mut payload);
        if layout == BatchLayout::Targeted {
            bet.target.write(&mut payload);
        }
        bet.amount.write(&mut payload);
    }
    Ok(payload)
}

/// Decodes a payload produced by [encode_batch].
pub fn decode_batch(
    opcode: u8,
    layout: BatchLayout,
    payload: &[u8],
) -> Result<Vec<BetRecord>, CodecError> {
    let mut reader = payload;
    let got = u8::read(&mut reader).map_err(|_| CodecError::Truncated)?;
    if got != opcode {
        return Err(CodecError::UnexpectedOpcode {
            expected: opcode,
            got,
        });
    }
    let count = u8::read(&mut reader).map_err(|_| CodecError::Truncated)? as usize;
    if count > MAX_BATCH_BETS {
        return Err(CodecError::BatchTooLarge {
            count,
            max: MAX_BATCH_BETS,
        });
    }
    if reader.len() < count * layout.width() {
        return Err(CodecError::Truncated);
    }
    let mut bets = Vec::with_capacity(count);
    for _ in 0..count {
        let bet_type = reader.get_u8();
        let target = match layout {
            BatchLayout::Targeted => reader.get_u8(),
            BatchLayout::Untargeted => 0,
        };
        let amount = reader.get_u64();
        bets.push(BetRecord {
            bet_type,
            target,
            amount,
        });
    }
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes(reader.len()));
    }
    Ok(bets)
}

/// Encodes `[opcode][bet_type][target][amount]` (single targeted placement).
pub fn encode_targeted_place(opcode: u8, bet: &BetRecord) -> Result<Vec<u8>, CodecError> {
    ensure_positive(bet.amount)?;
    let mut payload = Vec::with_capacity(1 + BatchLayout::Targeted.width());
    opcode.write(&mut payload);
    bet.bet_type.write(&mut payload);
    bet.target.write(&mut payload);
    bet.amount.write(&mut payload);
    Ok(payload)
}

/// Encodes `[opcode][amount:u64]`.
pub fn encode_amount(opcode: u8, amount: u64) -> Result<Vec<u8>, CodecError> {
    ensure_positive(amount)?;
    let mut payload = Vec::with_capacity(1 + u64::SIZE);
    opcode.write(&mut payload);
    amount.write(&mut payload);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};

    #[test]
    fn test_game_type_roundtrip() {
        for game_type in GameType::ALL {
            let encoded = game_type.encode();
            assert_eq!(encoded.len(), GameType::SIZE);
            assert_eq!(GameType::decode(encoded.as_ref()).unwrap(), game_type);
        }
        assert!(matches!(
            GameType::try_from(10),
            Err(Error::InvalidEnum(10))
        ));
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" dont pass "), "DONT_PASS");
        assert_eq!(normalize_symbol("Split-H"), "SPLIT_H");
        assert_eq!(normalize_symbol("red"), "RED");
    }

    #[test]
    fn test_batch_length_and_decode() {
        let bets = [
            BetRecord {
                bet_type: 1,
                target: 0,
                amount: 5,
            },
            BetRecord {
                bet_type: 7,
                target: 2,
                amount: u64::MAX,
            },
        ];
        for layout in [BatchLayout::Targeted, BatchLayout::Untargeted] {
            let payload = encode_batch(9, layout, &bets).unwrap();
            assert_eq!(payload.len(), 2 + bets.len() * layout.width());
            let decoded = decode_batch(9, layout, &payload).unwrap();
            for (bet, expected) in decoded.iter().zip(bets.iter()) {
                assert_eq!(bet.bet_type, expected.bet_type);
                assert_eq!(bet.amount, expected.amount);
            }
        }
    }

    #[test]
    fn test_batch_rejects_empty_oversized_and_zero() {
        assert_eq!(
            encode_batch(3, BatchLayout::Targeted, &[]),
            Err(CodecError::EmptyBatch)
        );
        let bet = BetRecord {
            bet_type: 0,
            target: 0,
            amount: 1,
        };
        let many = vec![bet; MAX_BATCH_BETS + 1];
        assert!(matches!(
            encode_batch(3, BatchLayout::Targeted, &many),
            Err(CodecError::BatchTooLarge { .. })
        ));
        let zero = BetRecord { amount: 0, ..bet };
        assert_eq!(
            encode_batch(3, BatchLayout::Targeted, &[zero]),
            Err(CodecError::InvalidAmount)
        );
    }

    #[test]
    fn test_decode_batch_rejects_malformed() {
        let payload = encode_batch(4, BatchLayout::Targeted, &[BetRecord {
            bet_type: 0,
            target: 0,
            amount: 10,
        }])
        .unwrap();
        assert_eq!(
            decode_batch(4, BatchLayout::Targeted, &payload[..payload.len() - 1]),
            Err(CodecError::Truncated)
        );
        assert!(matches!(
            decode_batch(3, BatchLayout::Targeted, &payload),
            Err(CodecError::UnexpectedOpcode { expected: 3, got: 4 })
        ));
        let mut padded = payload.clone();
        padded.push(0);
        assert_eq!(
            decode_batch(4, BatchLayout::Targeted, &padded),
            Err(CodecError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_encode_amount_layout() {
        assert_eq!(
            encode_amount(5, 258).unwrap(),
            vec![5, 0, 0, 0, 0, 0, 0, 1, 2]
        );
        assert_eq!(encode_amount(5, 0), Err(CodecError::InvalidAmount));
    }
}
