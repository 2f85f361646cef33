/// Error codes for CasinoError events
pub const ERROR_PLAYER_ALREADY_REGISTERED: u8 = 1;
pub const ERROR_PLAYER_NOT_FOUND: u8 = 2;
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 3;
pub const ERROR_INVALID_BET: u8 = 4;
pub const ERROR_SESSION_EXISTS: u8 = 5;
pub const ERROR_SESSION_NOT_FOUND: u8 = 6;
pub const ERROR_SESSION_NOT_OWNED: u8 = 7;
pub const ERROR_SESSION_COMPLETE: u8 = 8;
pub const ERROR_INVALID_MOVE: u8 = 9;
pub const ERROR_RATE_LIMITED: u8 = 10;
/// Error for unauthorized admin instructions.
pub const ERROR_UNAUTHORIZED: u8 = 15;

/// Marker for a card slot that has not been dealt or revealed.
pub const CARD_HIDDEN: u8 = 0xFF;

/// Number of cards in a video poker hand.
pub const VIDEO_POKER_HAND_SIZE: usize = 5;
