use super::{
    base, bets, message_type, GameHandler, HandleResult, HandlerContext, HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{casino::sic_bo, GameType};
use serde_json::{json, Value};

/// Sic Bo: every roll is a fresh game whose bets and roll land in one atomic batch.
pub struct SicBoHandler;

impl SicBoHandler {
    async fn roll<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let bets = bets::normalize::<sic_bo::BetType>(msg)?;
        let batch = sic_bo::atomic_batch(&bets)?;
        base::start_with_moves(ctx, GameType::SicBo, 0, vec![batch]).await
    }
}

impl GameHandler for SicBoHandler {
    fn game_type(&self) -> GameType {
        GameType::SicBo
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        json!({ "dice": sic_bo::dice(state) })
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "sicbo_roll" | "sic_bo_roll" | "sicbo_bet" | "sic_bo_bet" => self.roll(ctx, msg).await,
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
    use nullspace_types::{game_session_id, Instruction};

    #[tokio::test]
    async fn test_roll_settles_in_one_batch() {
        let mut harness = Harness::new();
        harness
            .ledger
            .respond(|tx| Reply::Accept(vec![fixtures::started(tx, vec![])]));
        harness.ledger.respond(|tx| {
            Reply::Accept(vec![fixtures::completed(tx, GameType::SicBo, 10)])
        });

        let result = harness
            .handle(
                &SicBoHandler,
                json!({"type": "sicbo_roll", "bets": [{"type": "SMALL", "amount": 10}]}),
            )
            .await;
        assert!(result.success, "{result:?}");

        let submitted = harness.ledger.submitted();
        assert_eq!(submitted.len(), 2);
        let expected_id = game_session_id(harness.session.public_key(), 1);
        assert_eq!(
            submitted[0].instruction,
            Instruction::CasinoStartGame {
                game_type: GameType::SicBo,
                bet: 0,
                session_id: expected_id,
            }
        );
        assert_eq!(
            harness.ledger.moves(),
            vec![vec![3, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10]]
        );
        assert_eq!(submitted[1].nonce, submitted[0].nonce + 1);

        let response = result.response.unwrap();
        assert_eq!(response["type"], "game_result");
        assert_eq!(response["won"], true);
        assert_eq!(response["payout"], 10);
        assert_eq!(response["sessionId"], expected_id.to_string());
        assert!(!harness.session.is_subscribed());
    }

    #[tokio::test]
    async fn test_unknown_bet_submits_nothing() {
        let mut harness = Harness::new();
        let result = harness
            .handle(
                &SicBoHandler,
                json!({"type": "sic_bo_bet", "bets": [{"type": "NOT_A_BET", "amount": 10}]}),
            )
            .await;
        assert!(!result.success);
        let error = result.error.unwrap();
        assert_eq!(error.code, ErrorCode::InvalidBet);
        assert!(error.message.contains("NOT_A_BET"));
        assert!(harness.ledger.submitted().is_empty());
        assert_eq!(harness.session.game_session_counter(), 0);
    }

    #[tokio::test]
    async fn test_each_roll_is_a_new_attempt() {
        let mut harness = Harness::new();
        for _ in 0..2 {
            harness
                .ledger
                .respond(|tx| Reply::Accept(vec![fixtures::started(tx, vec![])]));
            harness.ledger.respond(|tx| {
                Reply::Accept(vec![fixtures::completed(tx, GameType::SicBo, -10)])
            });
            let result = harness
                .handle(
                    &SicBoHandler,
                    json!({"type": "sicbo_roll", "bets": [{"type": "BIG", "amount": 10}]}),
                )
                .await;
            assert_eq!(result.response.unwrap()["won"], false);
        }
        let ids: Vec<_> = harness
            .ledger
            .submitted()
            .iter()
            .map(|tx| tx.instruction.session_id())
            .collect();
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_eq!(harness.session.game_session_counter(), 2);
    }

    #[test]
    fn test_state_view() {
        let mut state = vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10];
        state.extend_from_slice(&[2, 4, 6]);
        assert_eq!(
            SicBoHandler.parse_state(&state),
            json!({"dice": [2, 4, 6]})
        );
        assert_eq!(SicBoHandler.parse_state(&[]), json!({"dice": null}));
    }
}
