//! Normalizes the bet shapes clients send into one canonical list.
//!
//! Three shapes are accepted:
//! - `bets: [{type, amount, target?}, ...]` where any invalid entry rejects the command,
//! - legacy `bets: {SYMBOL: amount, ...}` where unrecognized or non-positive entries are skipped,
//! - a single `betType` + `amount` (+ `target`) on the message itself.

use super::{parse_u64, parse_u8, HandlerError};
use nullspace_types::casino::{BetKind, BetRecord, CodecError};
use serde_json::{Map, Value};
use tracing::debug;

const SYMBOL_KEYS: [&str; 3] = ["type", "betType", "bet"];
const MESSAGE_SYMBOL_KEYS: [&str; 1] = ["betType"];
const TARGET_KEYS: [&str; 3] = ["target", "number", "value"];

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn target(object: &Map<String, Value>) -> Result<Option<u8>, HandlerError> {
    match field(object, &TARGET_KEYS) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_u8(value)
            .map(Some)
            .ok_or_else(|| HandlerError::invalid_bet(format!("invalid bet target: {value}"))),
    }
}

fn amount(object: &Map<String, Value>) -> Result<u64, HandlerError> {
    match object.get("amount").and_then(parse_u64) {
        Some(amount) if amount > 0 => Ok(amount),
        _ => Err(CodecError::InvalidAmount.into()),
    }
}

fn strict<B: BetKind>(
    object: &Map<String, Value>,
    symbol_keys: &[&str],
) -> Result<BetRecord, HandlerError> {
    let symbol = field(object, symbol_keys)
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::invalid_bet("bet type is required"))?;
    let kind = B::from_symbol(symbol)?;
    let target = target(object)?;
    let amount = amount(object)?;
    Ok(BetRecord::new(kind, target, amount)?)
}

fn legacy<B: BetKind>(map: &Map<String, Value>) -> Vec<BetRecord> {
    map.iter()
        .filter_map(|(symbol, value)| {
            let (amount, target) = match value {
                Value::Object(object) => {
                    (object.get("amount").and_then(parse_u64), target(object).ok()?)
                }
                value => (parse_u64(value), None),
            };
            let record = amount
                .ok_or(CodecError::InvalidAmount)
                .and_then(|amount| BetRecord::parse::<B>(symbol, target, amount));
            match record {
                Ok(record) => Some(record),
                Err(err) => {
                    debug!(game = B::GAME, symbol, error = %err, "skipping legacy bet entry");
                    None
                }
            }
        })
        .collect()
}

/// Canonical bet list of a message, validated against `B`'s table.
pub fn normalize<B: BetKind>(msg: &Value) -> Result<Vec<BetRecord>, HandlerError> {
    let bets = match msg.get("bets") {
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| match entry {
                Value::Object(object) => strict::<B>(object, &SYMBOL_KEYS),
                _ => Err(HandlerError::invalid_bet("each bet must be an object")),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(Value::Object(map)) => legacy::<B>(map),
        Some(Value::Null) | None => match msg.as_object() {
            Some(object) if object.contains_key("betType") => {
                vec![strict::<B>(object, &MESSAGE_SYMBOL_KEYS)?]
            }
            _ => Vec::new(),
        },
        Some(_) => return Err(HandlerError::invalid_bet("bets must be a list")),
    };
    if bets.is_empty() {
        return Err(CodecError::EmptyBatch.into());
    }
    Ok(bets)
}
