//! Matching ledger events to the action a session is waiting on.
//!
//! A session holds at most one outstanding action, so filtering the feed by account and by the
//! awaited game id is enough to correlate an event with its submission.

use crate::{
    ledger::{self, Ledger},
    session::Session,
};
use nullspace_types::{Event, EventKind};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum Error {
    #[error("no matching event within {0:?}")]
    Timeout(Duration),
    #[error("ledger error: {0}")]
    Ledger(#[from] ledger::Error),
}

/// Open the session's subscription if it is not open yet.
pub async fn ensure_open<L: Ledger>(session: &mut Session, ledger: &L) -> Result<(), Error> {
    if session.events.is_none() {
        let feed = ledger.subscribe(session.public_key()).await?;
        debug!("opened event subscription");
        session.events = Some(feed);
    }
    Ok(())
}

/// Drop the subscription once nothing is pending and no game is active.
pub fn release_if_idle(session: &mut Session) {
    if session.active_game_id().is_none() && session.events.take().is_some() {
        debug!("released event subscription");
    }
}

/// Wait for the next event of one of the `expected` kinds for game `game_id`.
///
/// Events for other games and events of other kinds are skipped. A `started` match is checked
/// against events already queued behind it: an error for the same game wins. A failed or closed
/// feed is discarded so the next call reopens it.
pub async fn wait_for_event(
    session: &mut Session,
    expected: &[EventKind],
    game_id: u64,
    within: Duration,
) -> Result<Event, Error> {
    let deadline = Instant::now() + within;
    loop {
        let Some(feed) = session.events.as_mut() else {
            return Err(ledger::Error::SubscriptionClosed.into());
        };
        let received = timeout_at(deadline, feed.recv()).await;
        let event = match received {
            Err(_) => return Err(Error::Timeout(within)),
            Ok(Some(Ok(event))) => event,
            Ok(Some(Err(err))) => {
                session.events = None;
                return Err(err.into());
            }
            Ok(None) => {
                session.events = None;
                return Err(ledger::Error::SubscriptionClosed.into());
            }
        };

        if event.session_id().is_some_and(|id| id != game_id) {
            trace!(kind = ?event.kind(), session_id = ?event.session_id(), "skipping stale event");
            continue;
        }
        if !expected.contains(&event.kind()) {
            trace!(kind = ?event.kind(), "skipping unexpected event");
            continue;
        }
        if event.kind() == EventKind::Started {
            while let Some(queued) = feed.try_recv() {
                match queued {
                    Ok(queued @ Event::CasinoError { .. })
                        if queued.session_id().map_or(true, |id| id == game_id) =>
                    {
                        debug!("start was followed by an error");
                        return Ok(queued);
                    }
                    Ok(queued) => trace!(kind = ?queued.kind(), "dropping queued event"),
                    Err(err) => {
                        session.events = None;
                        return Err(err.into());
                    }
                }
            }
        }
        return Ok(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Mock;
    use commonware_cryptography::{ed25519::PrivateKey, Signer};
    use nullspace_types::GameType;

    fn started(session: &Session, session_id: u64) -> Event {
        Event::CasinoGameStarted {
            session_id,
            player: session.public_key().clone(),
            game_type: GameType::Craps,
            bet: 0,
            initial_state: vec![],
        }
    }

    fn error(session: &Session, session_id: Option<u64>) -> Event {
        Event::CasinoError {
            player: session.public_key().clone(),
            session_id,
            error_code: 3,
            message: "insufficient funds".to_string(),
        }
    }

    async fn open() -> (Mock, Session) {
        let ledger = Mock::new();
        let mut session = Session::new(PrivateKey::from_seed(11));
        ensure_open(&mut session, &ledger).await.unwrap();
        (ledger, session)
    }

    #[tokio::test]
    async fn test_times_out_within_deadline() {
        let (_ledger, mut session) = open().await;
        let within = Duration::from_millis(50);
        let start = std::time::Instant::now();
        let result = wait_for_event(&mut session, &[EventKind::Moved], 1, within).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert!(start.elapsed() < within + Duration::from_millis(500));
        assert!(session.is_subscribed());
    }

    #[tokio::test]
    async fn test_skips_stale_and_unexpected_events() {
        let (ledger, mut session) = open().await;
        ledger.publish(started(&session, 99));
        ledger.publish(Event::CasinoGameMoved {
            session_id: 7,
            move_number: 1,
            new_state: vec![],
        });
        ledger.publish(started(&session, 7));

        let event = wait_for_event(
            &mut session,
            &[EventKind::Started, EventKind::Error],
            7,
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(event.session_id(), Some(7));
        assert_eq!(event.kind(), EventKind::Started);
    }

    #[tokio::test]
    async fn test_error_queued_behind_start_wins() {
        let (ledger, mut session) = open().await;
        ledger.publish(started(&session, 5));
        ledger.publish(error(&session, None));

        let event = wait_for_event(
            &mut session,
            &[EventKind::Started, EventKind::Error],
            5,
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(event.kind(), EventKind::Error);
    }

    #[tokio::test]
    async fn test_closed_feed_is_discarded() {
        let (ledger, mut session) = open().await;
        ledger.close_feeds();
        let result =
            wait_for_event(&mut session, &[EventKind::Moved], 1, Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(Error::Ledger(ledger::Error::SubscriptionClosed))
        ));
        assert!(!session.is_subscribed());

        ensure_open(&mut session, &ledger).await.unwrap();
        assert_eq!(ledger.opened(), 2);
    }

    #[tokio::test]
    async fn test_release_only_when_idle() {
        let (ledger, mut session) = open().await;
        session.start(GameType::Craps, 3, vec![]);
        release_if_idle(&mut session);
        assert!(session.is_subscribed());

        session.complete();
        release_if_idle(&mut session);
        assert!(!session.is_subscribed());
        assert_eq!(ledger.open_feeds(), 0);
    }
}
