pub mod client;
pub mod events;

pub use client::{AccountState, Client, RetryPolicy};
pub use events::Updates;
use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("failed: {0}")]
    Failed(reqwest::StatusCode),
    #[error("failed: {status}: {body}")]
    FailedWithBody {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("submission rejected: {0}")]
    Rejected(Rejection),
    #[error("too many transactions in one submission: {got} (max {max})")]
    TooManyTransactions { max: usize, got: usize },
    #[error("invalid data: {0}")]
    InvalidData(#[from] commonware_codec::Error),
    #[error("unexpected response")]
    UnexpectedResponse,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("dial timeout")]
    DialTimeout,
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reason the ledger gave for refusing a submission (`400` body of `POST /submit`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The transaction's nonce was already consumed.
    NonceTooLow { tx_nonce: u64, expected: u64 },
    /// The transaction's nonce skips ahead of the account.
    NonceTooHigh { tx_nonce: u64, expected: u64 },
    /// The submission body could not be decoded.
    Decode,
    Other(String),
}

impl Rejection {
    /// Parses `nonce_too_low:{pk}:tx_nonce=N:expected=M`, `nonce_too_high:...`, `decode_error`,
    /// falling back to [Rejection::Other] for anything else.
    pub fn parse(reason: &str) -> Self {
        let reason = reason.trim();
        if reason == "decode_error" {
            return Self::Decode;
        }
        let mut parts = reason.split(':');
        let kind = parts.next().unwrap_or_default();
        let mut tx_nonce = None;
        let mut expected = None;
        for part in parts {
            if let Some(value) = part.strip_prefix("tx_nonce=") {
                tx_nonce = value.parse().ok();
            } else if let Some(value) = part.strip_prefix("expected=") {
                expected = value.parse().ok();
            }
        }
        match (kind, tx_nonce, expected) {
            ("nonce_too_low", Some(tx_nonce), Some(expected)) => {
                Self::NonceTooLow { tx_nonce, expected }
            }
            ("nonce_too_high", Some(tx_nonce), Some(expected)) => {
                Self::NonceTooHigh { tx_nonce, expected }
            }
            _ => Self::Other(reason.to_string()),
        }
    }

    /// Nonce the ledger expects next, when the rejection names one.
    pub fn expected_nonce(&self) -> Option<u64> {
        match self {
            Self::NonceTooLow { expected, .. } | Self::NonceTooHigh { expected, .. } => {
                Some(*expected)
            }
            Self::Decode | Self::Other(_) => None,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonceTooLow { tx_nonce, expected } => {
                write!(f, "nonce too low (tx_nonce={tx_nonce}, expected={expected})")
            }
            Self::NonceTooHigh { tx_nonce, expected } => {
                write!(f, "nonce too high (tx_nonce={tx_nonce}, expected={expected})")
            }
            Self::Decode => f.write_str("decode error"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{
            ws::{Message as AxumMessage, WebSocketUpgrade},
            Path, State as AxumState,
        },
        http::StatusCode as AxumStatusCode,
        routing::{get, post},
        Json, Router,
    };
    use bytes::Bytes;
    use commonware_codec::{DecodeExt, Encode};
    use commonware_cryptography::{
        ed25519::{PrivateKey, PublicKey},
        Signer,
    };
    use commonware_utils::hex;
    use nullspace_types::{
        api::{Events, Submission, UpdatesFilter},
        casino::GameType,
        execution::{Event, Instruction, Transaction},
    };
    use std::{
        net::SocketAddr,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };
    use tokio::time::{sleep, Duration};

    fn no_backoff(max_attempts: usize, retry_non_idempotent: bool) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            retry_non_idempotent,
        }
    }

    fn sample_transaction(nonce: u64) -> Transaction {
        Transaction::sign(
            &PrivateKey::from_seed(1),
            nonce,
            Instruction::CasinoStartGame {
                game_type: GameType::SicBo,
                bet: 0,
                session_id: 1,
            },
        )
    }

    async fn serve_router(router: Router) -> (String, tokio::task::JoinHandle<()>) {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let actual_addr = listener.local_addr().unwrap();
        let base_url = format!("http://{actual_addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .unwrap();
        });

        sleep(Duration::from_millis(50)).await;
        (base_url, handle)
    }

    #[test]
    fn test_client_invalid_scheme() {
        let result = Client::new("ftp://example.com");
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(matches!(err, Error::InvalidScheme(_)));
            assert_eq!(
                err.to_string(),
                "invalid URL scheme: ftp (expected http or https)"
            );
        }

        assert!(Client::new("http://localhost:8080").is_ok());
        assert!(Client::new("https://localhost:8080").is_ok());
        assert!(matches!(Client::new("not a url"), Err(Error::Url(_))));
    }

    #[test]
    fn test_rejection_parse() {
        assert_eq!(
            Rejection::parse("nonce_too_low:abcd:tx_nonce=3:expected=5"),
            Rejection::NonceTooLow {
                tx_nonce: 3,
                expected: 5
            }
        );
        assert_eq!(
            Rejection::parse("nonce_too_high:abcd:tx_nonce=9:expected=5").expected_nonce(),
            Some(5)
        );
        assert_eq!(Rejection::parse("decode_error"), Rejection::Decode);
        assert_eq!(
            Rejection::parse("invalid_seed"),
            Rejection::Other("invalid_seed".to_string())
        );
        // A nonce rejection missing its numbers is kept verbatim.
        assert_eq!(
            Rejection::parse("nonce_too_low:abcd"),
            Rejection::Other("nonce_too_low:abcd".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_with_retry_retries_retryable_statuses() {
        let counter = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/flaky",
                get(
                    |AxumState(counter): AxumState<Arc<AtomicUsize>>| async move {
                        let attempt = counter.fetch_add(1, Ordering::SeqCst);
                        if attempt < 2 {
                            AxumStatusCode::SERVICE_UNAVAILABLE
                        } else {
                            AxumStatusCode::OK
                        }
                    },
                ),
            )
            .with_state(counter.clone());

        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url)
            .unwrap()
            .with_retry_policy(no_backoff(3, false));

        let url = client.base_url.join("flaky").unwrap();
        let response = client.get_with_retry(url).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.abort();
    }

    #[tokio::test]
    async fn test_post_with_retry_respects_retry_non_idempotent_default() {
        let counter = Arc::new(AtomicUsize::new(0));
        let router =
            Router::new()
                .route(
                    "/flaky-post",
                    post(
                        |AxumState(counter): AxumState<Arc<AtomicUsize>>,
                         _body: axum::body::Bytes| async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            AxumStatusCode::SERVICE_UNAVAILABLE
                        },
                    ),
                )
                .with_state(counter.clone());

        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url)
            .unwrap()
            .with_retry_policy(no_backoff(3, false));

        let url = client.base_url.join("flaky-post").unwrap();
        let err = client
            .post_bytes_with_retry(url.clone(), Bytes::from_static(b"hi"))
            .await
            .expect_err("POST should not be retried by default");
        let Error::FailedWithBody { status, body } = err else {
            panic!("expected FailedWithBody, got {err:?}");
        };
        assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("POST"));
        assert!(body.contains(url.as_str()));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_post_with_retry_retries_when_enabled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let router =
            Router::new()
                .route(
                    "/flaky-post",
                    post(
                        |AxumState(counter): AxumState<Arc<AtomicUsize>>,
                         _body: axum::body::Bytes| async move {
                            let attempt = counter.fetch_add(1, Ordering::SeqCst);
                            if attempt < 2 {
                                AxumStatusCode::SERVICE_UNAVAILABLE
                            } else {
                                AxumStatusCode::OK
                            }
                        },
                    ),
                )
                .with_state(counter.clone());

        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url)
            .unwrap()
            .with_retry_policy(no_backoff(3, true));

        let url = client.base_url.join("flaky-post").unwrap();
        client
            .post_bytes_with_retry(url, Bytes::from_static(b"hi"))
            .await
            .expect("POST should succeed after retry");
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.abort();
    }

    #[tokio::test]
    async fn test_submit_transactions_accepts_and_decodes() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/submit",
                post(
                    |AxumState(received): AxumState<Arc<Mutex<Vec<Submission>>>>,
                     body: axum::body::Bytes| async move {
                        match Submission::decode(body.as_ref()) {
                            Ok(submission) => {
                                received.lock().unwrap().push(submission);
                                (AxumStatusCode::OK, String::new())
                            }
                            Err(_) => (AxumStatusCode::BAD_REQUEST, "decode_error".to_string()),
                        }
                    },
                ),
            )
            .with_state(received.clone());

        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url).unwrap();

        let tx = sample_transaction(4);
        client.submit_transactions(vec![tx.clone()]).await.unwrap();
        let received = received.lock().unwrap().clone();
        assert_eq!(received, vec![Submission::Transactions(vec![tx])]);

        handle.abort();
    }

    #[tokio::test]
    async fn test_submit_transactions_surfaces_rejection() {
        let router = Router::new().route(
            "/submit",
            post(|_body: axum::body::Bytes| async move {
                (
                    AxumStatusCode::BAD_REQUEST,
                    "nonce_too_low:00ff:tx_nonce=0:expected=2",
                )
            }),
        );

        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url)
            .unwrap()
            .with_retry_policy(no_backoff(3, true));

        let err = client
            .submit_transactions(vec![sample_transaction(0)])
            .await
            .expect_err("submission should be rejected");
        let Error::Rejected(rejection) = err else {
            panic!("expected Rejected, got {err:?}");
        };
        assert_eq!(rejection.expected_nonce(), Some(2));

        handle.abort();
    }

    #[tokio::test]
    async fn test_submit_transactions_enforces_limit() {
        let client = Client::new("http://127.0.0.1:1").unwrap();
        let txs = vec![sample_transaction(0); nullspace_types::api::MAX_SUBMISSION_TRANSACTIONS + 1];
        assert!(matches!(
            client.submit_transactions(txs).await,
            Err(Error::TooManyTransactions { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_account() {
        let public = PrivateKey::from_seed(2).public_key();
        let expected_path = hex(public.encode().as_ref());
        let router = Router::new().route(
            "/account/:pubkey",
            get(move |Path(pubkey): Path<String>| async move {
                if pubkey == expected_path {
                    Json(serde_json::json!({ "nonce": 7, "balance": 1000 }))
                } else {
                    Json(serde_json::json!({ "nonce": 0, "balance": 0 }))
                }
            }),
        );

        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url).unwrap();
        let account = client.query_account(&public).await.unwrap();
        assert_eq!(
            account,
            AccountState {
                nonce: 7,
                balance: 1000
            }
        );

        handle.abort();
    }

    fn insufficient_funds(player: &PublicKey) -> Event {
        Event::CasinoError {
            player: player.clone(),
            session_id: Some(9),
            error_code: 3,
            message: "insufficient funds".to_string(),
        }
    }

    #[tokio::test]
    async fn test_client_updates_stream() {
        let player = PrivateKey::from_seed(3).public_key();
        let other = PrivateKey::from_seed(4).public_key();
        let moved = Event::CasinoGameMoved {
            session_id: 9,
            move_number: 1,
            new_state: vec![1, 2],
        };
        let first = Events {
            height: 1,
            events: vec![insufficient_funds(&other), moved.clone()],
        }
        .encode()
        .to_vec();
        let second = Events {
            height: 2,
            events: vec![insufficient_funds(&player)],
        }
        .encode()
        .to_vec();
        let expected_filter = hex(UpdatesFilter::Account(player.clone()).encode().as_ref());
        let router = Router::new().route(
            "/updates/:filter",
            get(
                move |Path(filter): Path<String>, ws: WebSocketUpgrade| async move {
                    assert_eq!(filter, expected_filter);
                    ws.on_upgrade(move |mut socket| async move {
                        let _ = socket.send(AxumMessage::Binary(first)).await;
                        let _ = socket.send(AxumMessage::Binary(vec![0xFF])).await;
                        let _ = socket.send(AxumMessage::Binary(second)).await;
                        let _ = socket.send(AxumMessage::Close(None)).await;
                        sleep(Duration::from_millis(200)).await;
                    })
                },
            ),
        );

        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url).unwrap();
        let mut updates = client
            .connect_updates(UpdatesFilter::Account(player.clone()))
            .await
            .unwrap();

        // The other account's error is dropped and the malformed frame is skipped.
        assert_eq!(updates.next().await.unwrap().unwrap(), moved);
        assert_eq!(
            updates.next().await.unwrap().unwrap(),
            insufficient_funds(&player)
        );
        assert!(matches!(
            updates.next().await.unwrap(),
            Err(Error::ConnectionClosed)
        ));
        assert!(updates.next().await.is_none());

        handle.abort();
    }
}
