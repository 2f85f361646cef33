use super::{
    base, message_type, required_amount, view, GameHandler, HandleResult, HandlerContext,
    HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{
    casino::hilo::{self, Move},
    GameType,
};
use serde_json::Value;

pub struct HiLoHandler;

fn choice(msg: &Value) -> Result<Option<Move>, HandlerError> {
    match msg.get("choice") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(choice)) => Ok(Some(Move::from_choice(choice)?)),
        Some(other) => Err(HandlerError::invalid_message(format!(
            "choice must be a string, got {other}"
        ))),
    }
}

impl HiLoHandler {
    async fn deal<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let amount = required_amount(msg, "amount")?;
        let moves = choice(msg)?.map(Move::payload).into_iter().collect();
        base::start_with_moves(ctx, GameType::HiLo, amount, moves).await
    }

    async fn guess<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let guess = choice(msg)?.ok_or_else(|| HandlerError::invalid_message("choice is required"))?;
        self.play(ctx, guess).await
    }

    async fn play<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        action: Move,
    ) -> Result<Outcome, HandlerError> {
        base::make_move(ctx, GameType::HiLo, action.payload()).await
    }
}

impl GameHandler for HiLoHandler {
    fn game_type(&self) -> GameType {
        GameType::HiLo
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(hilo::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "hilo_bet" | "hilo_deal" => self.deal(ctx, msg).await,
            "hilo_guess" => self.guess(ctx, msg).await,
            "hilo_higher" => self.play(ctx, Move::Higher).await,
            "hilo_lower" => self.play(ctx, Move::Lower).await,
            "hilo_same" => self.play(ctx, Move::Same).await,
            "hilo_cashout" => self.play(ctx, Move::Cashout).await,
            other => Err(HandlerError::unsupported(other)),
        };
        HandleResult::from_outcome(self, result)
    }
}
