//! Bridges client game messages to the casino ledger: signs and submits transactions, then
//! correlates the ledger's events back into one response per message.

use commonware_cryptography::ed25519::PrivateKey;
use handlers::{HandleResult, HandlerContext, HandlerError};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info_span, Instrument};
use url::Url;

pub mod config;
pub mod correlation;
pub mod handlers;
pub mod ledger;
pub mod nonce;
pub mod registry;
pub mod session;

pub use config::{ConfigError, GatewayConfig, ValidatedConfig};
pub use handlers::{ErrorCode, GameHandler, Outcome};
pub use ledger::Ledger;
pub use nonce::{MemoryNonceStore, NonceManager, NonceStore};
pub use registry::Registry;
pub use session::{Phase, Session};

/// Shared gateway state. Sessions are owned by their connection task and passed in per message.
#[derive(Clone)]
pub struct Gateway<L: Ledger> {
    ledger: L,
    nonces: Arc<NonceManager>,
    registry: Arc<Registry>,
    ledger_url: Url,
    event_timeout: Duration,
}

impl<L: Ledger> Gateway<L> {
    pub fn new(ledger: L, config: &ValidatedConfig) -> Self {
        Self::with_nonce_store(ledger, config, Arc::new(MemoryNonceStore::default()))
    }

    pub fn with_nonce_store(
        ledger: L,
        config: &ValidatedConfig,
        store: Arc<dyn NonceStore>,
    ) -> Self {
        Self {
            ledger,
            nonces: Arc::new(NonceManager::new(store)),
            registry: Arc::new(Registry::new()),
            ledger_url: config.ledger_url.clone(),
            event_timeout: config.event_timeout,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn nonces(&self) -> &NonceManager {
        &self.nonces
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// New session for a connected player.
    pub fn open_session(&self, signer: PrivateKey) -> Session {
        let session = Session::new(signer);
        debug!(player = ?session.public_key(), "session opened");
        session
    }

    /// Process one client message. Messages of a session must be handled one at a time.
    pub async fn handle(&self, session: &mut Session, msg: &Value) -> HandleResult {
        if !msg.is_object() {
            return HandleResult::err(HandlerError::invalid_message(
                "message must be a JSON object",
            ));
        }
        let span = info_span!(
            "message",
            msg_type = handlers::message_type(msg),
            counter = session.game_session_counter()
        );
        let mut ctx = HandlerContext {
            session,
            ledger: &self.ledger,
            nonces: &self.nonces,
            ledger_url: &self.ledger_url,
            event_timeout: self.event_timeout,
        };
        self.registry.dispatch(&mut ctx, msg).instrument(span).await
    }

    /// Release everything a session holds.
    pub fn close_session(&self, mut session: Session) {
        session.close();
        debug!(player = ?session.public_key(), "session closed");
    }
}
