use crate::ledger::EventFeed;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use nullspace_types::{game_session_id, GameType, Instruction, Transaction};

/// Progress of the game a session is playing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NoGame,
    /// Started, no move confirmed yet.
    Betting,
    InProgress,
    Complete,
}

/// State of one connected client.
///
/// Created when a client authenticates and dropped when it disconnects. Nothing here is persisted.
pub struct Session {
    signer: PrivateKey,
    public: PublicKey,
    game_session_counter: u64,
    active_game_id: Option<u64>,
    game_type: Option<GameType>,
    phase: Phase,
    last_state: Vec<u8>,
    pub(crate) events: Option<EventFeed>,
}

impl Session {
    pub fn new(signer: PrivateKey) -> Self {
        let public = signer.public_key();
        Self {
            signer,
            public,
            game_session_counter: 0,
            active_game_id: None,
            game_type: None,
            phase: Phase::NoGame,
            last_state: Vec::new(),
            events: None,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn game_session_counter(&self) -> u64 {
        self.game_session_counter
    }

    pub fn active_game_id(&self) -> Option<u64> {
        self.active_game_id
    }

    pub fn game_type(&self) -> Option<GameType> {
        self.game_type
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// State blob of the most recent started or moved event.
    pub fn last_state(&self) -> &[u8] {
        &self.last_state
    }

    /// Whether an event subscription is currently open.
    pub fn is_subscribed(&self) -> bool {
        self.events.is_some()
    }

    /// Counts a new game attempt and returns its ledger id.
    ///
    /// Any previous game is forgotten.
    pub(crate) fn begin_attempt(&mut self) -> u64 {
        self.clear_game();
        self.game_session_counter += 1;
        game_session_id(&self.public, self.game_session_counter)
    }

    pub(crate) fn sign(&self, nonce: u64, instruction: Instruction) -> Transaction {
        Transaction::sign(&self.signer, nonce, instruction)
    }

    pub(crate) fn start(&mut self, game_type: GameType, game_id: u64, state: Vec<u8>) {
        self.active_game_id = Some(game_id);
        self.game_type = Some(game_type);
        self.phase = Phase::Betting;
        self.last_state = state;
    }

    pub(crate) fn record_move(&mut self, state: Vec<u8>) {
        self.phase = Phase::InProgress;
        self.last_state = state;
    }

    pub(crate) fn complete(&mut self) {
        self.active_game_id = None;
        self.phase = Phase::Complete;
    }

    pub(crate) fn clear_game(&mut self) {
        self.active_game_id = None;
        self.game_type = None;
        self.phase = Phase::NoGame;
        self.last_state.clear();
    }

    /// Tear down the session's subscription and forget any game.
    pub fn close(&mut self) {
        self.events = None;
        self.clear_game();
    }
}
