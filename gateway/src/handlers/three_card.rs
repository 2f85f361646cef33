use super::{
    base, message_type, optional_amount, required_amount, view, GameHandler, HandleResult,
    HandlerContext, HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{
    casino::three_card::{self, Move},
    GameType,
};
use serde_json::Value;

pub struct ThreeCardHandler;

impl ThreeCardHandler {
    /// Side bets other than Pairplus are set before the deal; Pairplus rides on the deal itself.
    async fn deal<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let amount = required_amount(msg, "amount")?;
        let pairplus = optional_amount(msg, "pairPlus")?;
        let mut moves = Vec::with_capacity(3);
        if let Some(six_card) = optional_amount(msg, "sixCard")? {
            moves.push(three_card::set_six_card(six_card)?);
        }
        if let Some(progressive) = optional_amount(msg, "progressive")? {
            moves.push(three_card::set_progressive(progressive)?);
        }
        moves.push(three_card::deal(pairplus));
        base::start_with_moves(ctx, GameType::ThreeCard, amount, moves).await
    }
}

fn reveal_when_moved(outcome: &Outcome) -> Option<Vec<u8>> {
    outcome.is_moved().then(|| Move::Reveal.payload())
}

impl GameHandler for ThreeCardHandler {
    fn game_type(&self) -> GameType {
        GameType::ThreeCard
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(three_card::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "three_card_deal" | "threecard_deal" => self.deal(ctx, msg).await,
            "three_card_play" | "threecard_play" => {
                let play = Move::Play.payload();
                base::move_then(ctx, GameType::ThreeCard, play, reveal_when_moved).await
            }
            "three_card_fold" | "threecard_fold" => {
                base::make_move(ctx, GameType::ThreeCard, Move::Fold.payload()).await
            }
            other => Err(HandlerError::unsupported(other)),
        };
        HandleResult::from_outcome(self, result)
    }
}
