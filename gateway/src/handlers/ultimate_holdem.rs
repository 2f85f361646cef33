use super::{
    base, message_type, optional_amount, parse_u64, required_amount, view, GameHandler,
    HandleResult, HandlerContext, HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{
    casino::ultimate_holdem::{self, Action},
    GameType,
};
use serde_json::Value;

/// Ultimate Texas Hold'em. Messages arrive as `ultimate_holdem_<action>` or `uth_<action>`.
pub struct UltimateHoldemHandler;

fn action(msg_type: &str) -> Option<&str> {
    msg_type
        .strip_prefix("ultimate_holdem_")
        .or_else(|| msg_type.strip_prefix("uth_"))
}

fn reveal_when_moved(outcome: &Outcome) -> Option<Vec<u8>> {
    outcome.is_moved().then(|| Action::Reveal.payload())
}

impl UltimateHoldemHandler {
    async fn deal<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let amount = required_amount(msg, "amount")?;
        let mut moves = Vec::with_capacity(4);
        if let Some(trips) = optional_amount(msg, "trips")? {
            moves.push(ultimate_holdem::set_trips(trips)?);
        }
        if let Some(six_card) = optional_amount(msg, "sixCard")? {
            moves.push(ultimate_holdem::set_six_card(six_card)?);
        }
        if let Some(progressive) = optional_amount(msg, "progressive")? {
            moves.push(ultimate_holdem::set_progressive(progressive)?);
        }
        moves.push(Action::Deal.payload());
        base::start_with_moves(ctx, GameType::UltimateHoldem, amount, moves).await
    }

    async fn bet<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let multiplier = msg
            .get("multiplier")
            .and_then(parse_u64)
            .ok_or_else(|| HandlerError::invalid_message("multiplier must be 1, 2, 3 or 4"))?;
        let play = Action::bet(multiplier)?.payload();
        base::move_then(ctx, GameType::UltimateHoldem, play, reveal_when_moved).await
    }
}

impl GameHandler for UltimateHoldemHandler {
    fn game_type(&self) -> GameType {
        GameType::UltimateHoldem
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(ultimate_holdem::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let msg_type = message_type(msg);
        let result = match action(msg_type) {
            Some("deal") => self.deal(ctx, msg).await,
            Some("check") => {
                base::make_move(ctx, GameType::UltimateHoldem, Action::Check.payload()).await
            }
            Some("bet") => self.bet(ctx, msg).await,
            Some("fold") => {
                let fold = Action::Fold.payload();
                base::move_then(ctx, GameType::UltimateHoldem, fold, reveal_when_moved).await
            }
            _ => Err(HandlerError::unsupported(msg_type)),
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

    async fn dealt() -> Harness {
        let mut harness = Harness::new();
        harness
            .ledger
            .respond(|tx| Reply::Accept(vec![fixtures::started(tx, vec![])]));
        harness
            .ledger
            .respond(|tx| Reply::Accept(vec![fixtures::moved(tx, 1, vec![])]));
        let result = harness
            .handle(
                &UltimateHoldemHandler,
                json!({"type": "uth_deal", "amount": 10}),
            )
            .await;
        assert!(result.success, "{result:?}");
        harness
    }

    #[tokio::test]
    async fn test_deal_with_trips() {
        let mut harness = Harness::new();
        harness
            .ledger
            .respond(|tx| Reply::Accept(vec![fixtures::started(tx, vec![])]));
        for n in 1..=2 {
            harness
                .ledger
                .respond(move |tx| Reply::Accept(vec![fixtures::moved(tx, n, vec![])]));
        }
        harness
            .handle(
                &UltimateHoldemHandler,
                json!({"type": "ultimate_holdem_deal", "amount": 10, "trips": 5}),
            )
            .await;
        assert_eq!(
            harness.ledger.moves(),
            vec![vec![6, 0, 0, 0, 0, 0, 0, 0, 5], vec![5]]
        );
    }

    #[tokio::test]
    async fn test_bet_then_reveal() {
        let mut harness = dealt().await;
        harness
            .ledger
            .respond(|tx| Reply::Accept(vec![fixtures::moved(tx, 2, vec![])]));
        harness.ledger.respond(|tx| {
            Reply::Accept(vec![fixtures::completed(tx, GameType::UltimateHoldem, 30)])
        });
        let result = harness
            .handle(
                &UltimateHoldemHandler,
                json!({"type": "uth_bet", "multiplier": 2}),
            )
            .await;
        assert_eq!(harness.ledger.moves()[1..], [vec![2], vec![7]]);
        let response = result.response.unwrap();
        assert_eq!(response["type"], "game_result");
        assert_eq!(response["payout"], 30);
    }

    #[tokio::test]
    async fn test_check_does_not_reveal() {
        let mut harness = dealt().await;
        harness
            .ledger
            .respond(|tx| Reply::Accept(vec![fixtures::moved(tx, 2, vec![])]));
        let result = harness
            .handle(
                &UltimateHoldemHandler,
                json!({"type": "ultimate_holdem_check"}),
            )
            .await;
        assert_eq!(result.response.unwrap()["type"], "game_move");
        assert_eq!(harness.ledger.moves()[1..], [vec![0]]);
    }

    #[tokio::test]
    async fn test_invalid_multiplier() {
        let mut harness = dealt().await;
        let result = harness
            .handle(
                &UltimateHoldemHandler,
                json!({"type": "uth_bet", "multiplier": 5}),
            )
            .await;
        assert_eq!(result.error_code(), Some(ErrorCode::InvalidMessage));
        assert_eq!(harness.ledger.moves().len(), 1);
    }

    #[test]
    fn test_action_prefixes() {
        assert_eq!(action("uth_fold"), Some("fold"));
        assert_eq!(action("ultimate_holdem_check"), Some("check"));
        assert_eq!(action("holdem_check"), None);
    }
}
