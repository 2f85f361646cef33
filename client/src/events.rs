use crate::{Error, Result};
use commonware_codec::DecodeExt;
use futures_util::{Stream, StreamExt};
use nullspace_types::{
    api::{Events, UpdatesFilter},
    execution::Event,
};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};
use tracing::{debug, trace, warn};

pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Casino events read from an updates socket, one item per event.
///
/// A single reader task owns the socket. It unpacks each frame, drops events addressed to other
/// accounts and queues the rest in a bounded channel. A frame that fails to decode is logged and
/// skipped. The last item is [Error::ConnectionClosed] (or the transport error) before the
/// stream ends. Dropping [Updates] aborts the reader, which drops the socket.
pub struct Updates {
    receiver: mpsc::Receiver<Result<Event>>,
    reader: JoinHandle<()>,
}

impl Drop for Updates {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Whether `event` belongs on a stream opened with `filter`.
///
/// Moves carry no player: the socket filter already scopes them to the subscribed sessions.
fn wanted(filter: &UpdatesFilter, event: &Event) -> bool {
    match (filter, event.player()) {
        (UpdatesFilter::Account(account), Some(owner)) => owner == account,
        _ => true,
    }
}

async fn read_frames<S>(
    mut ws: WebSocketStream<S>,
    filter: UpdatesFilter,
    sender: mpsc::Sender<Result<Event>>,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    while let Some(message) = ws.next().await {
        let data = match message {
            Ok(Message::Binary(data)) => data,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                warn!(error = %err, "updates socket failed");
                let _ = sender.send(Err(err.into())).await;
                return;
            }
        };
        let frame = match Events::decode(data.as_slice()) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(len = data.len(), error = %err, "skipping undecodable frame");
                continue;
            }
        };
        trace!(height = frame.height, events = frame.events.len(), "received frame");
        for event in frame.events {
            if !wanted(&filter, &event) {
                trace!(kind = ?event.kind(), "skipping event for another account");
                continue;
            }
            if sender.send(Ok(event)).await.is_err() {
                return; // Updates dropped
            }
        }
    }
    debug!("updates socket closed");
    let _ = sender.send(Err(Error::ConnectionClosed)).await;
}

impl Updates {
    pub(crate) fn spawn<S>(ws: WebSocketStream<S>, filter: UpdatesFilter, capacity: usize) -> Self
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let capacity = if capacity == 0 {
            DEFAULT_CHANNEL_CAPACITY
        } else {
            capacity
        };
        let (sender, receiver) = mpsc::channel(capacity);
        let reader = tokio::spawn(read_frames(ws, filter, sender));
        Self { receiver, reader }
    }

    /// Waits for the next event. `None` once the final item has been taken.
    pub async fn next(&mut self) -> Option<Result<Event>> {
        self.receiver.recv().await
    }

    /// Returns an already-queued event without waiting.
    pub fn try_next(&mut self) -> Option<Result<Event>> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Updates {
    type Item = Result<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_cryptography::{
        ed25519::{PrivateKey, PublicKey},
        Signer,
    };

    fn error_for(player: PublicKey) -> Event {
        Event::CasinoError {
            player,
            session_id: Some(1),
            error_code: 3,
            message: "insufficient funds".to_string(),
        }
    }

    #[test]
    fn test_account_filter() {
        let mine = PrivateKey::from_seed(1).public_key();
        let theirs = PrivateKey::from_seed(2).public_key();
        let filter = UpdatesFilter::Account(mine.clone());

        assert!(wanted(&filter, &error_for(mine)));
        assert!(!wanted(&filter, &error_for(theirs.clone())));
        assert!(wanted(&UpdatesFilter::All, &error_for(theirs)));
    }
}
