//! Seam between the gateway and the ledger that executes casino instructions.

use commonware_cryptography::ed25519::PublicKey;
use nullspace_client::{Client, Rejection, Updates};
use nullspace_types::{api::UpdatesFilter, execution::Transaction, Event};
use std::future::Future;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Error)]
pub enum Error {
    #[error("submission rejected: {0}")]
    Rejected(Rejection),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("event subscription closed")]
    SubscriptionClosed,
}

impl From<nullspace_client::Error> for Error {
    fn from(err: nullspace_client::Error) -> Self {
        match err {
            nullspace_client::Error::Rejected(rejection) => Self::Rejected(rejection),
            nullspace_client::Error::ConnectionClosed => Self::SubscriptionClosed,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Account-filtered feed of casino events.
///
/// Either the client's update stream, whose reader task stops when the feed is dropped, or a
/// local channel fed by the caller.
pub enum EventFeed {
    Updates(Updates),
    Channel(mpsc::Receiver<Result<Event, Error>>),
}

impl EventFeed {
    /// Waits for the next event. `None` means the feed is closed.
    pub async fn recv(&mut self) -> Option<Result<Event, Error>> {
        match self {
            Self::Updates(updates) => Some(updates.next().await?.map_err(Error::from)),
            Self::Channel(receiver) => receiver.recv().await,
        }
    }

    /// Returns an already-queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Result<Event, Error>> {
        match self {
            Self::Updates(updates) => Some(updates.try_next()?.map_err(Error::from)),
            Self::Channel(receiver) => receiver.try_recv().ok(),
        }
    }
}

/// Trait for interacting with the ledger.
pub trait Ledger: Clone + Send + Sync + 'static {
    /// Submit a signed transaction to the pending pool.
    ///
    /// Returns once the ledger accepted or rejected it, not once it executed.
    fn submit(&self, transaction: Transaction) -> impl Future<Output = Result<(), Error>> + Send;

    /// Next nonce the ledger expects from `public`.
    fn account_nonce(&self, public: &PublicKey) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Open a feed of the events addressed to `public`.
    fn subscribe(&self, public: &PublicKey)
        -> impl Future<Output = Result<EventFeed, Error>> + Send;
}

impl Ledger for Client {
    async fn submit(&self, transaction: Transaction) -> Result<(), Error> {
        self.submit_transactions(vec![transaction])
            .await
            .map_err(Error::from)
    }

    async fn account_nonce(&self, public: &PublicKey) -> Result<u64, Error> {
        Ok(self.query_account(public).await?.nonce)
    }

    async fn subscribe(&self, public: &PublicKey) -> Result<EventFeed, Error> {
        let updates = self
            .connect_updates(UpdatesFilter::Account(public.clone()))
            .await?;
        debug!("subscribed to account events");
        Ok(EventFeed::Updates(updates))
    }
}

/// Outcome a [Mock] produces for a submission.
#[cfg(test)]
pub enum Reply {
    /// Accept the submission and publish `events` to every open feed.
    Accept(Vec<Event>),
    /// Accept the submission without executing it: the account nonce stays where it was.
    Pending,
    Reject(Rejection),
    Unavailable,
}

#[cfg(test)]
type Responder = Box<dyn FnOnce(&Transaction) -> Reply + Send>;

#[cfg(test)]
#[derive(Default)]
struct MockState {
    nonces: std::collections::HashMap<PublicKey, u64>,
    submitted: Vec<Transaction>,
    responders: std::collections::VecDeque<Responder>,
    feeds: Vec<mpsc::Sender<Result<Event, Error>>>,
    opened: usize,
}

/// A scripted ledger for testing.
///
/// Submissions are checked against a per-account nonce and then answered by the next queued
/// responder (silently accepted when none is queued).
#[cfg(test)]
#[derive(Clone, Default)]
pub struct Mock {
    state: std::sync::Arc<std::sync::Mutex<MockState>>,
}

#[cfg(test)]
impl Mock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, responder: impl FnOnce(&Transaction) -> Reply + Send + 'static) {
        self.state
            .lock()
            .unwrap()
            .responders
            .push_back(Box::new(responder));
    }

    pub fn set_nonce(&self, public: &PublicKey, nonce: u64) {
        self.state
            .lock()
            .unwrap()
            .nonces
            .insert(public.clone(), nonce);
    }

    pub fn nonce(&self, public: &PublicKey) -> u64 {
        self.state
            .lock()
            .unwrap()
            .nonces
            .get(public)
            .copied()
            .unwrap_or_default()
    }

    pub fn submitted(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Payloads of the submitted game moves, in order.
    pub fn moves(&self) -> Vec<Vec<u8>> {
        self.submitted()
            .into_iter()
            .filter_map(|tx| match tx.instruction {
                nullspace_types::Instruction::CasinoGameMove { payload, .. } => Some(payload),
                _ => None,
            })
            .collect()
    }

    /// Feeds opened so far.
    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    /// Feeds that are still held by a subscriber.
    pub fn open_feeds(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        state.feeds.retain(|feed| !feed.is_closed());
        state.feeds.len()
    }

    pub fn publish(&self, event: Event) {
        let mut state = self.state.lock().unwrap();
        state
            .feeds
            .retain(|feed| feed.try_send(Ok(event.clone())).is_ok());
    }

    /// Ends every open feed with [Error::SubscriptionClosed].
    pub fn close_feeds(&self) {
        let mut state = self.state.lock().unwrap();
        for feed in state.feeds.drain(..) {
            let _ = feed.try_send(Err(Error::SubscriptionClosed));
        }
    }
}

#[cfg(test)]
impl Ledger for Mock {
    async fn submit(&self, transaction: Transaction) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        let expected = state
            .nonces
            .get(&transaction.public)
            .copied()
            .unwrap_or_default();
        if transaction.nonce < expected {
            return Err(Error::Rejected(Rejection::NonceTooLow {
                tx_nonce: transaction.nonce,
                expected,
            }));
        }
        if transaction.nonce > expected {
            return Err(Error::Rejected(Rejection::NonceTooHigh {
                tx_nonce: transaction.nonce,
                expected,
            }));
        }
        let reply = match state.responders.pop_front() {
            Some(responder) => responder(&transaction),
            None => Reply::Accept(Vec::new()),
        };
        match reply {
            Reply::Accept(events) => {
                state
                    .nonces
                    .insert(transaction.public.clone(), transaction.nonce + 1);
                state.submitted.push(transaction);
                for event in events {
                    state
                        .feeds
                        .retain(|feed| feed.try_send(Ok(event.clone())).is_ok());
                }
                Ok(())
            }
            Reply::Pending => {
                state.submitted.push(transaction);
                Ok(())
            }
            Reply::Reject(rejection) => Err(Error::Rejected(rejection)),
            Reply::Unavailable => Err(Error::Unavailable("connection refused".to_string())),
        }
    }

    async fn account_nonce(&self, public: &PublicKey) -> Result<u64, Error> {
        Ok(self.nonce(public))
    }

    async fn subscribe(&self, _public: &PublicKey) -> Result<EventFeed, Error> {
        let (sender, receiver) = mpsc::channel(1_024);
        let mut state = self.state.lock().unwrap();
        state.feeds.push(sender);
        state.opened += 1;
        Ok(EventFeed::Channel(receiver))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use commonware_cryptography::{ed25519::PrivateKey, Signer};
    use nullspace_types::{GameType, Instruction};

    fn start(private: &PrivateKey, nonce: u64) -> Transaction {
        Transaction::sign(
            private,
            nonce,
            Instruction::CasinoStartGame {
                game_type: GameType::HiLo,
                bet: 10,
                session_id: 1,
            },
        )
    }

    #[tokio::test]
    async fn test_mock_enforces_nonces() {
        let private = PrivateKey::from_seed(1);
        let mock = Mock::new();
        mock.submit(start(&private, 0)).await.unwrap();
        let err = mock.submit(start(&private, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rejected(Rejection::NonceTooLow {
                tx_nonce: 0,
                expected: 1
            })
        ));
        assert!(mock.submit(start(&private, 3)).await.is_err());
        assert_eq!(mock.submitted().len(), 1);
        assert_eq!(mock.account_nonce(&private.public_key()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mock_publishes_to_feeds() {
        let private = PrivateKey::from_seed(2);
        let mock = Mock::new();
        let mut feed = mock.subscribe(&private.public_key()).await.unwrap();
        mock.respond(|tx| Reply::Accept(vec![fixtures::started(tx, vec![1])]));
        mock.submit(start(&private, 0)).await.unwrap();

        let event = feed.recv().await.unwrap().unwrap();
        assert!(matches!(event, Event::CasinoGameStarted { session_id: 1, .. }));
        assert!(feed.try_recv().is_none());
        assert_eq!(mock.open_feeds(), 1);

        drop(feed);
        assert_eq!(mock.open_feeds(), 0);
        assert_eq!(mock.opened(), 1);
    }

    #[test]
    fn test_client_error_mapping() {
        let err = Error::from(nullspace_client::Error::Rejected(Rejection::Decode));
        assert!(matches!(err, Error::Rejected(Rejection::Decode)));
        let err = Error::from(nullspace_client::Error::DialTimeout);
        assert!(matches!(err, Error::Unavailable(_)));
        let err = Error::from(nullspace_client::Error::ConnectionClosed);
        assert!(matches!(err, Error::SubscriptionClosed));
    }
}
