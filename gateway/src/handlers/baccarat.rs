use super::{
    base, bets, message_type, view, GameHandler, HandleResult, HandlerContext, HandlerError,
    Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{casino::baccarat, GameType};
use serde_json::Value;

pub struct BaccaratHandler;

impl BaccaratHandler {
    async fn deal<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let bets = bets::normalize::<baccarat::BetType>(msg)?;
        let batch = baccarat::atomic_batch(&bets)?;
        base::start_with_moves(ctx, GameType::Baccarat, 0, vec![batch]).await
    }
}

impl GameHandler for BaccaratHandler {
    fn game_type(&self) -> GameType {
        GameType::Baccarat
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(baccarat::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "baccarat_deal" | "baccarat_bet" => self.deal(ctx, msg).await,
            other => Err(HandlerError::unsupported(other)),
        };
        HandleResult::from_outcome(self, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        handlers::{testing::Harness, ErrorCode},
        ledger::{fixtures, Reply},
    };
    use serde_json::json;

    fn script_round(harness: &Harness, payout: i64) {
        harness
            .ledger
            .respond(|tx| Reply::Accept(vec![fixtures::started(tx, vec![])]));
        harness.ledger.respond(move |tx| {
            Reply::Accept(vec![fixtures::completed(tx, GameType::Baccarat, payout)])
        });
    }

    #[tokio::test]
    async fn test_single_bet_form() {
        let mut harness = Harness::new();
        script_round(&harness, 25);
        let result = harness
            .handle(
                &BaccaratHandler,
                json!({"type": "baccarat_deal", "betType": "PLAYER", "amount": 25}),
            )
            .await;
        assert!(result.success, "{result:?}");
        assert_eq!(
            harness.ledger.moves(),
            vec![vec![3, 1, 0, 0, 0, 0, 0, 0, 0, 0, 25]]
        );
    }

    #[tokio::test]
    async fn test_legacy_map_form() {
        let mut harness = Harness::new();
        script_round(&harness, -15);
        let result = harness
            .handle(
                &BaccaratHandler,
                json!({"type": "baccarat_bet", "bets": {"BANKER": 10, "TIE": 5, "SIDEWAYS": 3}}),
            )
            .await;
        assert!(result.success, "{result:?}");
        let batch = &harness.ledger.moves()[0];
        assert_eq!(&batch[..2], &[3, 2]);
        assert_eq!(batch.len(), 2 + 2 * 9);
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected_locally() {
        let mut harness = Harness::new();
        let result = harness
            .handle(
                &BaccaratHandler,
                json!({"type": "baccarat_deal", "bets": [{"type": "PLAYER", "amount": 0}]}),
            )
            .await;
        assert_eq!(result.error_code(), Some(ErrorCode::InvalidBet));
        assert!(harness.ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_bet_symbol_submits_nothing() {
        let mut harness = Harness::new();
        let result = harness
            .handle(
                &BaccaratHandler,
                json!({"type": "baccarat_deal", "bets": [
                    {"type": "PLAYER", "amount": 10},
                    {"type": "NOT_A_BET", "amount": 10},
                ]}),
            )
            .await;
        assert_eq!(result.error_code(), Some(ErrorCode::InvalidBet));
        assert!(harness.ledger.submitted().is_empty());
        assert_eq!(harness.session.game_session_counter(), 0);
    }
}
