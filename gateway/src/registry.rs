//! Routes client messages to the handler of the game they name.

use crate::{
    handlers::{
        message_type, BaccaratHandler, BlackjackHandler, CasinoWarHandler, CrapsHandler,
        GameHandler, HandleResult, HandlerContext, HandlerError, HiLoHandler, RouletteHandler,
        SicBoHandler, ThreeCardHandler, UltimateHoldemHandler, VideoPokerHandler,
    },
    ledger::Ledger,
};
use nullspace_types::GameType;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Message type prefixes and the game each one addresses.
const PREFIXES: [(&str, GameType); 15] = [
    ("baccarat_", GameType::Baccarat),
    ("blackjack_", GameType::Blackjack),
    ("casinowar_", GameType::CasinoWar),
    ("casino_war_", GameType::CasinoWar),
    ("craps_", GameType::Craps),
    ("hilo_", GameType::HiLo),
    ("roulette_", GameType::Roulette),
    ("sicbo_", GameType::SicBo),
    ("sic_bo_", GameType::SicBo),
    ("three_card_", GameType::ThreeCard),
    ("threecard_", GameType::ThreeCard),
    ("ultimate_holdem_", GameType::UltimateHoldem),
    ("uth_", GameType::UltimateHoldem),
    ("video_poker_", GameType::VideoPoker),
    ("videopoker_", GameType::VideoPoker),
];

/// Game addressed by a message type, if any.
pub fn game_type_for(msg_type: &str) -> Option<GameType> {
    PREFIXES
        .iter()
        .find(|(prefix, _)| msg_type.starts_with(prefix))
        .map(|(_, game_type)| *game_type)
}

/// One registered game handler.
pub enum Handler {
    Baccarat(BaccaratHandler),
    Blackjack(BlackjackHandler),
    CasinoWar(CasinoWarHandler),
    Craps(CrapsHandler),
    HiLo(HiLoHandler),
    Roulette(RouletteHandler),
    SicBo(SicBoHandler),
    ThreeCard(ThreeCardHandler),
    UltimateHoldem(UltimateHoldemHandler),
    VideoPoker(VideoPokerHandler),
}

impl Handler {
    pub fn for_game(game_type: GameType) -> Self {
        match game_type {
            GameType::Baccarat => Self::Baccarat(BaccaratHandler),
            GameType::Blackjack => Self::Blackjack(BlackjackHandler),
            GameType::CasinoWar => Self::CasinoWar(CasinoWarHandler),
            GameType::Craps => Self::Craps(CrapsHandler),
            GameType::HiLo => Self::HiLo(HiLoHandler),
            GameType::Roulette => Self::Roulette(RouletteHandler),
            GameType::SicBo => Self::SicBo(SicBoHandler),
            GameType::ThreeCard => Self::ThreeCard(ThreeCardHandler),
            GameType::UltimateHoldem => Self::UltimateHoldem(UltimateHoldemHandler),
            GameType::VideoPoker => Self::VideoPoker(VideoPokerHandler),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            Self::Baccarat(h) => h.game_type(),
            Self::Blackjack(h) => h.game_type(),
            Self::CasinoWar(h) => h.game_type(),
            Self::Craps(h) => h.game_type(),
            Self::HiLo(h) => h.game_type(),
            Self::Roulette(h) => h.game_type(),
            Self::SicBo(h) => h.game_type(),
            Self::ThreeCard(h) => h.game_type(),
            Self::UltimateHoldem(h) => h.game_type(),
            Self::VideoPoker(h) => h.game_type(),
        }
    }

    pub fn parse_state(&self, state: &[u8]) -> Value {
        match self {
            Self::Baccarat(h) => h.parse_state(state),
            Self::Blackjack(h) => h.parse_state(state),
            Self::CasinoWar(h) => h.parse_state(state),
            Self::Craps(h) => h.parse_state(state),
            Self::HiLo(h) => h.parse_state(state),
            Self::Roulette(h) => h.parse_state(state),
            Self::SicBo(h) => h.parse_state(state),
            Self::ThreeCard(h) => h.parse_state(state),
            Self::UltimateHoldem(h) => h.parse_state(state),
            Self::VideoPoker(h) => h.parse_state(state),
        }
    }

    pub async fn handle_message<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        match self {
            Self::Baccarat(h) => h.handle_message(ctx, msg).await,
            Self::Blackjack(h) => h.handle_message(ctx, msg).await,
            Self::CasinoWar(h) => h.handle_message(ctx, msg).await,
            Self::Craps(h) => h.handle_message(ctx, msg).await,
            Self::HiLo(h) => h.handle_message(ctx, msg).await,
            Self::Roulette(h) => h.handle_message(ctx, msg).await,
            Self::SicBo(h) => h.handle_message(ctx, msg).await,
            Self::ThreeCard(h) => h.handle_message(ctx, msg).await,
            Self::UltimateHoldem(h) => h.handle_message(ctx, msg).await,
            Self::VideoPoker(h) => h.handle_message(ctx, msg).await,
        }
    }
}

/// Handlers keyed by game type.
pub struct Registry {
    handlers: HashMap<GameType, Handler>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Registry with every supported game.
    pub fn new() -> Self {
        let handlers = GameType::ALL
            .into_iter()
            .map(|game_type| (game_type, Handler::for_game(game_type)))
            .collect();
        Self { handlers }
    }

    pub fn get(&self, game_type: GameType) -> Option<&Handler> {
        self.handlers.get(&game_type)
    }

    /// Handler for a message type.
    pub fn route(&self, msg_type: &str) -> Option<&Handler> {
        game_type_for(msg_type).and_then(|game_type| self.get(game_type))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Hands `msg` to the handler its type addresses.
    pub async fn dispatch<L: Ledger>(
        &self,
        ctx: &mut HandlerContext<'_, L>,
        msg: &Value,
    ) -> HandleResult {
        let msg_type = message_type(msg);
        if msg_type.is_empty() {
            return HandleResult::err(HandlerError::invalid_message("message type is required"));
        }
        match self.route(msg_type) {
            Some(handler) => {
                debug!(msg_type, game = %handler.game_type(), "dispatching");
                handler.handle_message(ctx, msg).await
            }
            None => HandleResult::err(HandlerError::unsupported(msg_type)),
        }
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
    fn test_every_game_registered() {
        let registry = Registry::new();
        assert_eq!(registry.len(), GameType::ALL.len());
        for game_type in GameType::ALL {
            assert_eq!(registry.get(game_type).unwrap().game_type(), game_type);
        }
    }

    #[test]
    fn test_prefix_routing() {
        assert_eq!(game_type_for("casino_war_deal"), Some(GameType::CasinoWar));
        assert_eq!(game_type_for("casinowar_war"), Some(GameType::CasinoWar));
        assert_eq!(game_type_for("sic_bo_roll"), Some(GameType::SicBo));
        assert_eq!(game_type_for("uth_check"), Some(GameType::UltimateHoldem));
        assert_eq!(game_type_for("threecard_play"), Some(GameType::ThreeCard));
        assert_eq!(game_type_for("videopoker_hold"), Some(GameType::VideoPoker));
        assert_eq!(game_type_for("poker_deal"), None);
        assert_eq!(game_type_for("baccarat"), None);
    }

    #[test]
    fn test_state_view_follows_game() {
        let registry = Registry::new();
        let handler = registry.get(GameType::SicBo).unwrap();
        assert_eq!(handler.parse_state(&[]), json!({"dice": null}));
        assert_eq!(
            registry.get(GameType::Blackjack).unwrap().parse_state(&[0xAB]),
            Value::Null
        );
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_types() {
        let registry = Registry::new();
        let mut harness = Harness::new();
        for msg in [json!({}), json!({"type": 7}), json!({"type": "poker_deal"})] {
            let mut ctx = harness.ctx();
            let result = registry.dispatch(&mut ctx, &msg).await;
            assert_eq!(result.error_code(), Some(ErrorCode::InvalidMessage), "{msg}");
        }
        assert!(harness.ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_reaches_handler() {
        let registry = Registry::new();
        let mut harness = Harness::new();
        harness
            .ledger
            .respond(|tx| Reply::Accept(vec![fixtures::started(tx, vec![])]));
        let mut ctx = harness.ctx();
        let result = registry
            .dispatch(&mut ctx, &json!({"type": "hilo_deal", "amount": 10}))
            .await;
        assert!(result.success, "{result:?}");
        assert_eq!(result.response.unwrap()["gameType"], "hilo");
    }
}
