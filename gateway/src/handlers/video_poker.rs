use super::{
    base, message_type, parse_u8, required_amount, view, GameHandler, HandleResult,
    HandlerContext, HandlerError, Outcome,
};
use crate::ledger::Ledger;
use nullspace_types::{casino::video_poker, GameType};
use serde_json::Value;

pub struct VideoPokerHandler;

/// Hold mask from `"10100"`, `[true, false, ...]` or a raw mask below 32.
fn hold_payload(msg: &Value) -> Result<Vec<u8>, HandlerError> {
    match msg.get("held") {
        Some(Value::String(held)) => Ok(video_poker::hold(&video_poker::parse_held(held)?)?),
        Some(Value::Array(flags)) => {
            let held = flags
                .iter()
                .map(Value::as_bool)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| HandlerError::invalid_message("held flags must be booleans"))?;
            Ok(video_poker::hold(&held)?)
        }
        Some(value @ Value::Number(_)) => match parse_u8(value) {
            Some(mask) if mask < 32 => Ok(vec![mask]),
            _ => Err(HandlerError::invalid_message(format!(
                "invalid hold mask: {value}"
            ))),
        },
        _ => Err(HandlerError::invalid_message("held is required")),
    }
}

impl VideoPokerHandler {
    async fn deal<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let amount = required_amount(msg, "amount")?;
        base::start_game(ctx, GameType::VideoPoker, amount).await
    }

    async fn draw<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> Result<Outcome, HandlerError> {
        let payload = hold_payload(msg)?;
        base::make_move(ctx, GameType::VideoPoker, payload).await
    }
}

impl GameHandler for VideoPokerHandler {
    fn game_type(&self) -> GameType {
        GameType::VideoPoker
    }

    fn parse_state(&self, state: &[u8]) -> Value {
        view(video_poker::parse_state(state))
    }

    async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let result = match message_type(msg) {
            "video_poker_deal" | "videopoker_deal" => self.deal(ctx, msg).await,
            "video_poker_draw" | "video_poker_hold" | "videopoker_draw" | "videopoker_hold" => {
                self.draw(ctx, msg).await
            }
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

    #[test]
    fn test_hold_forms() {
        assert_eq!(hold_payload(&json!({"held": "10100"})).unwrap(), vec![0b00101]);
        assert_eq!(
            hold_payload(&json!({"held": [false, true, false, false, true]})).unwrap(),
            vec![0b10010]
        );
        assert_eq!(hold_payload(&json!({"held": 31})).unwrap(), vec![31]);

        for bad in [
            json!({"held": 32}),
            json!({"held": "1010"}),
            json!({"held": "10x00"}),
            json!({"held": [true, 1, false, false, false]}),
            json!({}),
        ] {
            assert_eq!(
                hold_payload(&bad).unwrap_err().code,
                ErrorCode::InvalidMessage,
                "{bad}"
            );
        }
    }

    #[tokio::test]
    async fn test_deal_then_draw() {
        let mut harness = Harness::new();
        let dealt = vec![0, 0, 13, 26, 39, 12];
        harness.ledger.respond(move |tx| {
            Reply::Accept(vec![fixtures::started(tx, dealt)])
        });
        let result = harness
            .handle(
                &VideoPokerHandler,
                json!({"type": "videopoker_deal", "amount": 5}),
            )
            .await;
        let response = result.response.unwrap();
        assert_eq!(response["type"], "game_started");
        assert_eq!(response["state"]["drawn"], false);
        assert_eq!(response["state"]["cards"][0]["rank"], 1);

        harness.ledger.respond(|tx| {
            Reply::Accept(vec![fixtures::completed(tx, GameType::VideoPoker, 0)])
        });
        let result = harness
            .handle(
                &VideoPokerHandler,
                json!({"type": "video_poker_hold", "held": "11000"}),
            )
            .await;
        assert_eq!(harness.ledger.moves(), vec![vec![0b00011]]);
        let response = result.response.unwrap();
        assert_eq!(response["type"], "game_result");
        assert_eq!(response["won"], false);
        assert_eq!(harness.session.active_game_id(), None);
    }
}
