pub mod api;
pub mod casino;
mod compat;
pub mod execution;

pub use api::{Events, Submission, UpdatesFilter};
pub use casino::GameType;
pub use execution::{Event, EventKind, Instruction, Transaction, NAMESPACE};

use commonware_codec::Encode;
use commonware_cryptography::{ed25519::PublicKey, sha256::Sha256, Hasher};

/// Derives the ledger id of a game session from the owning account and a per-session counter.
///
/// The id is the first 8 bytes (big-endian) of `SHA-256(public_key || counter)`, so each
/// `(account, counter)` pair maps to a distinct, stable id.
pub fn game_session_id(public: &PublicKey, counter: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(public.encode().as_ref());
    hasher.update(&counter.to_be_bytes());
    let digest = hasher.finalize().0;
    let mut id = [0u8; 8];
    id.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(id)
}
