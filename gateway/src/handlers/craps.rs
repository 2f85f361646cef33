use super::{
    base, bets, message_type, required_amount, view, GameHandler, HandleResult, HandlerContext,
    HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{casino::craps, GameType};
use serde_json::Value;
use tracing::debug;

/// Craps keeps one game open across rolls, so bets join the active game when there is one.
pub struct CrapsHandler;

impl CrapsHandler {
    /// Opens a zero-bet game unless a craps game is already active.
    async fn ensure_game<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
    ) -> Result<Option<Outcome>, HandlerError> {
        if ctx.session.active_game_id().is_some()
            && ctx.session.game_type() == Some(GameType::Craps)
        {
            return Ok(None);
        }
        debug!("no active craps game, starting one");
        base::start_game(ctx, GameType::Craps, 0).await.map(Some)
    }

    async fn bet<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let payloads = bets::normalize::<craps::BetType>(msg)?
            .iter()
            .map(craps::place)
            .collect::<Result<Vec<_>, _>>()?;
        let mut outcome = self.ensure_game(ctx).await?;
        for payload in payloads {
            outcome = Some(base::make_move(ctx, GameType::Craps, payload).await?);
        }
        outcome.ok_or_else(|| HandlerError::invalid_bet("no bets to place"))
    }

    async fn roll<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        if !matches!(msg.get("bets"), Some(Value::Array(_))) {
            return base::make_move(ctx, GameType::Craps, craps::roll()).await;
        }
        let batch = craps::atomic_batch(&bets::normalize::<craps::BetType>(msg)?)?;
        self.ensure_game(ctx).await?;
        base::make_move(ctx, GameType::Craps, batch).await
    }

    async fn odds<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let payload = craps::add_odds(required_amount(msg, "amount")?)?;
        base::make_move(ctx, GameType::Craps, payload).await
    }
}

impl GameHandler for CrapsHandler {
    fn game_type(&self) -> GameType {
        GameType::Craps
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(craps::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "craps_bet" => self.bet(ctx, msg).await,
            "craps_roll" => self.roll(ctx, msg).await,
            "craps_odds" => self.odds(ctx, msg).await,
            "craps_clear" => base::make_move(ctx, GameType::Craps, craps::clear()).await,
            other => Err(HandlerError::unsupported(other)),
        };
        HandleResult::from_outcome(self, result)
    }
}
