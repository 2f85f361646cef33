use crate::{events::DEFAULT_CHANNEL_CAPACITY, Error, Rejection, Result, Updates};
use bytes::Bytes;
use commonware_codec::Encode;
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::hex;
use nullspace_types::{
    api::{Submission, UpdatesFilter, MAX_SUBMISSION_TRANSACTIONS},
    execution::Transaction,
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use url::Url;

/// Timeout for establishing a WebSocket connection.
const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry behavior for HTTP requests.
///
/// Idempotent requests (GET) are retried on transport errors and on `408`, `429` and `5xx`
/// responses. Non-idempotent requests (POST) are only retried when `retry_non_idempotent` is set,
/// since a retried submission that already landed would be rejected for its stale nonce.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            retry_non_idempotent: false,
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16) as u32;
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Account view served by `GET /account/{pubkey}`.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: u64,
}

/// Client for the ledger's submission and update endpoints.
#[derive(Clone)]
pub struct Client {
    pub(crate) base_url: Url,
    http_client: reqwest::Client,
    retry_policy: RetryPolicy,
    event_capacity: usize,
}

impl Client {
    /// Create a client for the ledger at `base_url` (`http` or `https`).
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidScheme(scheme.to_string())),
        }
        let http_client = reqwest::Client::builder().build()?;

        Ok(Self {
            base_url,
            http_client,
            retry_policy: RetryPolicy::default(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Capacity of the channel buffering received events (`0` selects the default).
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send_with_retry(
        &self,
        method: Method,
        url: Url,
        body: Option<Bytes>,
    ) -> Result<reqwest::Response> {
        let retryable = method == Method::GET || self.retry_policy.retry_non_idempotent;
        let attempts = if retryable {
            self.retry_policy.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 0;
        loop {
            let mut request = self.http_client.request(method.clone(), url.clone());
            if let Some(body) = &body {
                request = request
                    .header("Content-Type", "application/octet-stream")
                    .body(body.clone());
            }
            let last = attempt + 1 >= attempts;
            match request.send().await {
                Ok(response) if !last && is_retryable_status(response.status()) => {
                    debug!(%method, %url, status = %response.status(), attempt, "retrying request");
                }
                Ok(response) => return Ok(response),
                Err(err) if !last && (err.is_connect() || err.is_timeout()) => {
                    debug!(%method, %url, error = %err, attempt, "retrying request");
                }
                Err(err) => return Err(err.into()),
            }
            sleep(self.retry_policy.backoff(attempt)).await;
            attempt += 1;
        }
    }

    async fn ensure_success(
        method: Method,
        url: &Url,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(Error::FailedWithBody {
            status,
            body: format!("{method} {url}: {text}"),
        })
    }

    pub async fn get_with_retry(&self, url: Url) -> Result<reqwest::Response> {
        let response = self.send_with_retry(Method::GET, url.clone(), None).await?;
        Self::ensure_success(Method::GET, &url, response).await
    }

    pub async fn post_bytes_with_retry(&self, url: Url, body: Bytes) -> Result<reqwest::Response> {
        let response = self
            .send_with_retry(Method::POST, url.clone(), Some(body))
            .await?;
        Self::ensure_success(Method::POST, &url, response).await
    }

    /// Submit transactions to the pending pool.
    ///
    /// Acceptance does not imply execution: the outcome arrives later on the update stream.
    /// A `400` response is returned as [Error::Rejected].
    pub async fn submit_transactions(&self, transactions: Vec<Transaction>) -> Result<()> {
        if transactions.len() > MAX_SUBMISSION_TRANSACTIONS {
            return Err(Error::TooManyTransactions {
                max: MAX_SUBMISSION_TRANSACTIONS,
                got: transactions.len(),
            });
        }
        let count = transactions.len();
        let body = Bytes::from(Submission::Transactions(transactions).encode().to_vec());
        let url = self.base_url.join("submit")?;
        let response = self
            .send_with_retry(Method::POST, url.clone(), Some(body))
            .await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let reason = response.text().await.unwrap_or_default();
            let rejection = Rejection::parse(&reason);
            warn!(count, %rejection, "submission rejected");
            return Err(Error::Rejected(rejection));
        }
        Self::ensure_success(Method::POST, &url, response).await?;
        Ok(())
    }

    /// Fetch the on-chain nonce and balance of an account.
    pub async fn query_account(&self, public: &PublicKey) -> Result<AccountState> {
        let url = self
            .base_url
            .join(&format!("account/{}", hex(public.encode().as_ref())))?;
        let response = self.get_with_retry(url).await?;
        Ok(response.json::<AccountState>().await?)
    }

    /// Subscribe to the casino events matching `filter`.
    pub async fn connect_updates(&self, filter: UpdatesFilter) -> Result<Updates> {
        let mut url = self
            .base_url
            .join(&format!("updates/{}", hex(filter.encode().as_ref())))?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| Error::InvalidScheme(url.scheme().to_string()))?;

        let (ws, _) = timeout(DIAL_TIMEOUT, tokio_tungstenite::connect_async(url.as_str()))
            .await
            .map_err(|_| Error::DialTimeout)??;
        debug!(%url, "connected to updates stream");
        Ok(Updates::spawn(ws, filter, self.event_capacity))
    }
}
