//! Per-account nonce sequencing.
//!
//! Every account has its own async lock, so submissions for one account are serialized while
//! different accounts proceed independently. A nonce is handed out as a [Reservation] that holds
//! the account's lock until the submission is either accepted ([Reservation::commit]) or abandoned
//! (dropped), so a value the ledger never accepted is reused instead of leaving a gap.

use crate::ledger::{self, Ledger};
use commonware_cryptography::ed25519::PublicKey;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum Error {
    #[error("nonce diverged from chain (local={local}, chain={chain})")]
    Diverged { local: u64, chain: u64 },
    #[error("ledger error: {0}")]
    Ledger(#[from] ledger::Error),
}

/// Persistence for the next nonce of each account.
pub trait NonceStore: Send + Sync + 'static {
    fn get(&self, account: &PublicKey) -> Option<u64>;
    fn set(&self, account: &PublicKey, next: u64);
    fn reset(&self, account: &PublicKey);
}

#[derive(Default)]
pub struct MemoryNonceStore {
    nonces: Mutex<HashMap<PublicKey, u64>>,
}

impl NonceStore for MemoryNonceStore {
    fn get(&self, account: &PublicKey) -> Option<u64> {
        self.nonces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(account)
            .copied()
    }

    fn set(&self, account: &PublicKey, next: u64) {
        self.nonces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.clone(), next);
    }

    fn reset(&self, account: &PublicKey) {
        self.nonces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(account);
    }
}

/// Next nonce of an account, `None` until it is loaded.
type Slot = Arc<AsyncMutex<Option<u64>>>;

pub struct NonceManager {
    store: Arc<dyn NonceStore>,
    accounts: Mutex<HashMap<PublicKey, Slot>>,
}

impl Default for NonceManager {
    fn default() -> Self {
        Self::new(Arc::new(MemoryNonceStore::default()))
    }
}

impl NonceManager {
    pub fn new(store: Arc<dyn NonceStore>) -> Self {
        Self {
            store,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    async fn lock(&self, account: &PublicKey) -> OwnedMutexGuard<Option<u64>> {
        let slot = {
            let mut accounts = self
                .accounts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            accounts.entry(account.clone()).or_default().clone()
        };
        slot.lock_owned().await
    }

    async fn load<L: Ledger>(
        &self,
        ledger: &L,
        account: &PublicKey,
        slot: &mut Option<u64>,
    ) -> Result<u64, Error> {
        if let Some(next) = *slot {
            return Ok(next);
        }
        let next = match self.store.get(account) {
            Some(next) => next,
            None => ledger.account_nonce(account).await?,
        };
        debug!(next, "loaded account nonce");
        *slot = Some(next);
        Ok(next)
    }

    /// Reserve the next nonce for `account`.
    ///
    /// Other reservations for the same account wait until this one is committed or dropped.
    pub async fn reserve<L: Ledger>(
        &self,
        ledger: &L,
        account: &PublicKey,
    ) -> Result<Reservation<'_>, Error> {
        let mut guard = self.lock(account).await;
        let nonce = self.load(ledger, account, &mut guard).await?;
        Ok(Reservation {
            store: self.store.as_ref(),
            account: account.clone(),
            guard,
            nonce,
        })
    }

    /// Reserve and immediately consume the next nonce for `account`.
    pub async fn next<L: Ledger>(&self, ledger: &L, account: &PublicKey) -> Result<u64, Error> {
        let reservation = self.reserve(ledger, account).await?;
        let nonce = reservation.nonce();
        reservation.commit();
        Ok(nonce)
    }

    /// Replace local state with the nonce the ledger reports.
    pub async fn resync_from_chain<L: Ledger>(
        &self,
        ledger: &L,
        account: &PublicKey,
    ) -> Result<u64, Error> {
        let mut guard = self.lock(account).await;
        let chain = ledger.account_nonce(account).await?;
        self.store.reset(account);
        self.store.set(account, chain);
        *guard = Some(chain);
        debug!(chain, "resynced nonce from chain");
        Ok(chain)
    }

    /// Compare local state with the ledger.
    ///
    /// A ledger that moved ahead is adopted. A ledger behind local state is reported as
    /// [Error::Diverged] and left for the caller to resolve.
    pub async fn verify_against_chain<L: Ledger>(
        &self,
        ledger: &L,
        account: &PublicKey,
    ) -> Result<u64, Error> {
        let mut guard = self.lock(account).await;
        let chain = ledger.account_nonce(account).await?;
        let Some(local) = (*guard).or_else(|| self.store.get(account)) else {
            *guard = Some(chain);
            return Ok(chain);
        };
        if chain < local {
            warn!(local, chain, "nonce diverged from chain");
            return Err(Error::Diverged { local, chain });
        }
        if chain > local {
            debug!(local, chain, "adopting chain nonce");
            self.store.set(account, chain);
        }
        *guard = Some(chain);
        Ok(chain)
    }

    /// Adopt the nonce the ledger named in a rejection.
    pub async fn adopt(&self, account: &PublicKey, expected: u64) {
        let mut guard = self.lock(account).await;
        self.store.set(account, expected);
        *guard = Some(expected);
    }
}

/// A nonce held for one submission.
pub struct Reservation<'a> {
    store: &'a dyn NonceStore,
    account: PublicKey,
    guard: OwnedMutexGuard<Option<u64>>,
    nonce: u64,
}

impl Reservation<'_> {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Mark the nonce as consumed by an accepted submission.
    pub fn commit(mut self) {
        let next = self.nonce + 1;
        self.store.set(&self.account, next);
        *self.guard = Some(next);
    }

    /// Release the lock, continuing from `expected` (the ledger's view) instead.
    pub fn adopt(mut self, expected: u64) {
        self.store.set(&self.account, expected);
        *self.guard = Some(expected);
    }
}
