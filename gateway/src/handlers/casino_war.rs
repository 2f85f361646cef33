use super::{
    base, message_type, optional_amount, required_amount, view, GameHandler, HandleResult,
    HandlerContext, HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{
    casino::casino_war::{self, Move},
    GameType,
};
use serde_json::Value;

pub struct CasinoWarHandler;

impl CasinoWarHandler {
    async fn deal<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let amount = required_amount(msg, "amount")?;
        let mut moves = Vec::with_capacity(2);
        if let Some(tie_bet) = optional_amount(msg, "tieBet")? {
            moves.push(casino_war::set_tie_bet(tie_bet)?);
        }
        moves.push(Move::Play.payload());
        base::start_with_moves(ctx, GameType::CasinoWar, amount, moves).await
    }
}

impl GameHandler for CasinoWarHandler {
    fn game_type(&self) -> GameType {
        GameType::CasinoWar
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(casino_war::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "casinowar_deal" | "casino_war_deal" => self.deal(ctx, msg).await,
            "casinowar_war" | "casino_war_war" => {
                base::make_move(ctx, GameType::CasinoWar, Move::War.payload()).await
            }
            "casinowar_surrender" | "casino_war_surrender" => {
                base::make_move(ctx, GameType::CasinoWar, Move::Surrender.payload()).await
            }
            other => Err(HandlerError::unsupported(other)),
        };
        HandleResult::from_outcome(self, result)
    }
}
