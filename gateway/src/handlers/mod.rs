//! Per-game command handlers and the types they share.

use crate::{ledger::Ledger, nonce::NonceManager, session::Session};
use commonware_utils::hex;
use nullspace_types::{
    casino::{self, CodecError},
    GameType,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{future::Future, time::Duration};
use thiserror::Error;
use url::Url;

pub mod base;
pub mod bets;

mod baccarat;
mod blackjack;
mod casino_war;
mod craps;
mod hilo;
mod roulette;
mod sic_bo;
mod three_card;
mod ultimate_holdem;
mod video_poker;

pub use baccarat::BaccaratHandler;
pub use blackjack::BlackjackHandler;
pub use casino_war::CasinoWarHandler;
pub use craps::CrapsHandler;
pub use hilo::HiLoHandler;
pub use roulette::RouletteHandler;
pub use sic_bo::SicBoHandler;
pub use three_card::ThreeCardHandler;
pub use ultimate_holdem::UltimateHoldemHandler;
pub use video_poker::VideoPokerHandler;

/// Stable error codes returned to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidMessage,
    InvalidBet,
    NoActiveGame,
    SubmitRejected,
    NonceMismatch,
    Timeout,
    LedgerUnavailable,
    PlayerNotFound,
    InsufficientFunds,
    SessionExists,
    SessionNotFound,
    SessionComplete,
    InvalidMove,
    RateLimited,
    Unauthorized,
    GameError,
}

impl ErrorCode {
    /// Maps an error code reported by the casino program.
    pub fn from_chain(code: u8) -> Self {
        match code {
            casino::ERROR_PLAYER_NOT_FOUND => Self::PlayerNotFound,
            casino::ERROR_INSUFFICIENT_FUNDS => Self::InsufficientFunds,
            casino::ERROR_INVALID_BET => Self::InvalidBet,
            casino::ERROR_SESSION_EXISTS => Self::SessionExists,
            casino::ERROR_SESSION_NOT_FOUND => Self::SessionNotFound,
            casino::ERROR_SESSION_NOT_OWNED | casino::ERROR_UNAUTHORIZED => Self::Unauthorized,
            casino::ERROR_SESSION_COMPLETE => Self::SessionComplete,
            casino::ERROR_INVALID_MOVE => Self::InvalidMove,
            casino::ERROR_RATE_LIMITED => Self::RateLimited,
            _ => Self::GameError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::InvalidBet => "INVALID_BET",
            Self::NoActiveGame => "NO_ACTIVE_GAME",
            Self::SubmitRejected => "SUBMIT_REJECTED",
            Self::NonceMismatch => "NONCE_MISMATCH",
            Self::Timeout => "TIMEOUT",
            Self::LedgerUnavailable => "LEDGER_UNAVAILABLE",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::SessionExists => "SESSION_EXISTS",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::SessionComplete => "SESSION_COMPLETE",
            Self::InvalidMove => "INVALID_MOVE",
            Self::RateLimited => "RATE_LIMITED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::GameError => "GAME_ERROR",
        }
    }

    /// Whether repeating the same command may succeed.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::LedgerUnavailable | Self::NonceMismatch | Self::RateLimited
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported to the client as `{code, message, retryable}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[error("{code}: {message}")]
pub struct HandlerError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl HandlerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.retryable(),
        }
    }

    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMessage, message)
    }

    pub fn invalid_bet(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidBet, message)
    }

    pub fn unsupported(message_type: &str) -> Self {
        Self::invalid_message(format!("unsupported message type: {message_type}"))
    }

    pub fn no_active_game() -> Self {
        Self::new(ErrorCode::NoActiveGame, "no active game")
    }

    /// A move addressed to one game while `active` is being played.
    pub fn game_in_progress(active: GameType) -> Self {
        Self::new(
            ErrorCode::NoActiveGame,
            format!("no active game of this type ({active} in progress)"),
        )
    }

    pub fn timeout() -> Self {
        Self::new(
            ErrorCode::Timeout,
            "timed out waiting for the ledger; the action may still complete",
        )
    }

    pub fn ledger_unavailable() -> Self {
        Self::new(ErrorCode::LedgerUnavailable, "ledger unavailable")
    }

    pub fn submit_rejected() -> Self {
        Self::new(ErrorCode::SubmitRejected, "submission rejected by the ledger")
    }

    pub fn nonce_mismatch() -> Self {
        Self::new(
            ErrorCode::NonceMismatch,
            "transaction nonce was out of date; resynchronized",
        )
    }

    /// Error reported by the casino program in a `CasinoError` event.
    pub fn chain(error_code: u8, message: &str) -> Self {
        let code = ErrorCode::from_chain(error_code);
        let message = if message.is_empty() {
            code.as_str().to_ascii_lowercase().replace('_', " ")
        } else {
            message.to_string()
        };
        Self::new(code, message)
    }
}

impl From<CodecError> for HandlerError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidOption { .. } => Self::invalid_message(err.to_string()),
            _ => Self::invalid_bet(err.to_string()),
        }
    }
}

/// Result of one client command.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HandleResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<HandlerError>,
}

impl HandleResult {
    pub fn ok(response: Value) -> Self {
        Self {
            success: true,
            response: Some(response),
            error: None,
        }
    }

    pub fn err(error: HandlerError) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error),
        }
    }

    /// Renders the final outcome of a command with `handler`'s state parser.
    pub fn from_outcome<H: GameHandler>(handler: &H, result: Result<Outcome, HandlerError>) -> Self {
        match result {
            Ok(outcome) => Self::ok(outcome.to_response(handler)),
            Err(error) => Self::err(error),
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|error| error.code)
    }
}

/// Everything a handler needs for one message.
pub struct HandlerContext<'a, L: Ledger> {
    pub session: &'a mut Session,
    pub ledger: &'a L,
    pub nonces: &'a NonceManager,
    pub ledger_url: &'a Url,
    pub event_timeout: Duration,
}

/// A confirmed ledger outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Started {
        session_id: u64,
        game_type: GameType,
        bet: u64,
        state: Vec<u8>,
    },
    Moved {
        session_id: u64,
        move_number: u32,
        state: Vec<u8>,
    },
    Completed {
        session_id: u64,
        game_type: GameType,
        payout: i64,
        final_chips: u64,
        was_shielded: bool,
        was_doubled: bool,
    },
}

impl Outcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// State blob carried by the outcome, if any.
    pub fn state(&self) -> Option<&[u8]> {
        match self {
            Self::Started { state, .. } | Self::Moved { state, .. } => Some(state),
            Self::Completed { .. } => None,
        }
    }

    pub fn to_response<H: GameHandler>(&self, handler: &H) -> Value {
        match self {
            Self::Started {
                session_id,
                game_type,
                bet,
                state,
            } => json!({
                "type": "game_started",
                "gameType": game_type,
                "sessionId": session_id.to_string(),
                "bet": bet,
                "state": handler.parse_state(state),
                "stateHex": hex(state),
            }),
            Self::Moved {
                session_id,
                move_number,
                state,
            } => json!({
                "type": "game_move",
                "sessionId": session_id.to_string(),
                "moveNumber": move_number,
                "state": handler.parse_state(state),
                "stateHex": hex(state),
            }),
            Self::Completed {
                session_id,
                game_type,
                payout,
                final_chips,
                was_shielded,
                was_doubled,
            } => json!({
                "type": "game_result",
                "sessionId": session_id.to_string(),
                "gameType": game_type,
                "won": *payout > 0,
                "payout": payout,
                "finalChips": final_chips,
                "wasShielded": was_shielded,
                "wasDoubled": was_doubled,
            }),
        }
    }
}

/// Translates one game's client commands into ledger actions.
pub trait GameHandler: Send + Sync + 'static {
    fn game_type(&self) -> GameType;

    /// Client-facing view of a state blob (`null` when it cannot be parsed).
    fn parse_state(&self, state: &[u8]) -> Value;

    fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> impl Future<Output = HandleResult> + Send;
}

/// Serializes a parsed view, mapping unparseable state to `null`.
pub(crate) fn view<T: Serialize>(view: Option<T>) -> Value {
    view.and_then(|view| serde_json::to_value(view).ok())
        .unwrap_or(Value::Null)
}

/// The `type` discriminator of a client message (empty when missing).
pub fn message_type(msg: &Value) -> &str {
    msg.get("type").and_then(Value::as_str).unwrap_or_default()
}

pub(crate) fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn parse_u8(value: &Value) -> Option<u8> {
    parse_u64(value).and_then(|value| u8::try_from(value).ok())
}

/// A required positive integer amount.
pub(crate) fn required_amount(msg: &Value, key: &str) -> Result<u64, HandlerError> {
    let value = msg
        .get(key)
        .ok_or_else(|| HandlerError::invalid_bet(format!("{key} is required")))?;
    match parse_u64(value) {
        Some(amount) if amount > 0 => Ok(amount),
        _ => Err(HandlerError::invalid_bet(format!(
            "{key} must be a positive integer"
        ))),
    }
}

/// An optional side-bet amount. Missing, `null` and `0` all mean no wager.
pub(crate) fn optional_amount(msg: &Value, key: &str) -> Result<Option<u64>, HandlerError> {
    match msg.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match parse_u64(value) {
            Some(0) => Ok(None),
            Some(amount) => Ok(Some(amount)),
            None => Err(HandlerError::invalid_bet(format!(
                "{key} must be a non-negative integer"
            ))),
        },
    }
}
