use super::{
    base, bets, message_type, parse_u8, view, GameHandler, HandleResult, HandlerContext,
    HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{
    casino::roulette::{self, ZeroRule},
    GameType,
};
use serde_json::Value;

pub struct RouletteHandler;

fn zero_rule(msg: &Value) -> Result<Option<ZeroRule>, HandlerError> {
    match msg.get("zeroRule") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(symbol)) => Ok(Some(ZeroRule::from_symbol(symbol)?)),
        Some(value) => {
            let code = parse_u8(value)
                .ok_or_else(|| HandlerError::invalid_message(format!("invalid zeroRule: {value}")))?;
            Ok(Some(ZeroRule::try_from(code)?))
        }
    }
}

impl RouletteHandler {
    async fn spin<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let bets = bets::normalize::<roulette::BetType>(msg)?;
        let batch = roulette::atomic_batch(&bets)?;
        let mut moves = Vec::with_capacity(2);
        if let Some(rule) = zero_rule(msg)? {
            moves.push(roulette::set_zero_rule(rule));
        }
        moves.push(batch);
        base::start_with_moves(ctx, GameType::Roulette, 0, moves).await
    }
}

impl GameHandler for RouletteHandler {
    fn game_type(&self) -> GameType {
        GameType::Roulette
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(roulette::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "roulette_spin" | "roulette_bet" => self.spin(ctx, msg).await,
            other => Err(HandlerError::unsupported(other)),
        };
        HandleResult::from_outcome(self, result)
    }
}
