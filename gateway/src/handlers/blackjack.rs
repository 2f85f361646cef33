use super::{
    base, message_type, optional_amount, required_amount, view, GameHandler, HandleResult,
    HandlerContext, HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{
    casino::blackjack::{self, Move, Stage},
    GameType,
};
use serde_json::Value;

/// Blackjack. The ledger only resolves a finished hand on an explicit reveal, which this
/// handler sends whenever a deal or action leaves the dealer hole card pending.
pub struct BlackjackHandler;

fn reveal_if_pending(outcome: &Outcome) -> Option<Vec<u8>> {
    let pending = outcome.is_moved()
        && outcome.state().and_then(blackjack::stage) == Some(Stage::AwaitingReveal);
    pending.then(|| Move::Reveal.payload())
}

impl BlackjackHandler {
    async fn deal<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let amount = required_amount(msg, "amount")?;
        let mut moves = Vec::with_capacity(2);
        if let Some(side_bet) = optional_amount(msg, "sideBet21p3")? {
            moves.push(blackjack::set_21_plus_3(side_bet)?);
        }
        moves.push(Move::Deal.payload());

        let outcome = base::start_with_moves(ctx, GameType::Blackjack, amount, moves).await?;
        match reveal_if_pending(&outcome) {
            Some(reveal) => base::make_move(ctx, GameType::Blackjack, reveal).await,
            None => Ok(outcome),
        }
    }

    /// Any player action can finish the last hand (21, bust, auto-stand after a split, surrender).
    async fn play<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        action: Move,
    ) -> Result<Outcome, HandlerError> {
        base::move_then(ctx, GameType::Blackjack, action.payload(), reveal_if_pending).await
    }
}

impl GameHandler for BlackjackHandler {
    fn game_type(&self) -> GameType {
        GameType::Blackjack
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(blackjack::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "blackjack_deal" => self.deal(ctx, msg).await,
            "blackjack_hit" => self.play(ctx, Move::Hit).await,
            "blackjack_stand" => self.play(ctx, Move::Stand).await,
            "blackjack_double" => self.play(ctx, Move::Double).await,
            "blackjack_split" => self.play(ctx, Move::Split).await,
            "blackjack_surrender" => self.play(ctx, Move::Surrender).await,
            other => Err(HandlerError::unsupported(other)),
        };
        HandleResult::from_outcome(self, result)
    }
}
