//! Core of a tamper-evident demo ledger: hash-chained blocks sealed by a
//! proof-of-work search, with an explicit tamper path that demonstrates
//! cascading invalidation.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod chain;
pub mod constants;

pub use chain::{BlockView, Chain, ChainConfig, TamperError, TamperOutcome};

/// Trust state of a block. `Sealed` is the only trusted state; once a
/// block is tampered with (or a predecessor is) there is no transition
/// back, no re-mine-to-heal path exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trust {
    /// Sealed by proof-of-work and not known to be compromised.
    Sealed,
    /// Data rewritten after sealing; the stored hash carries no work.
    Tampered,
    /// An earlier block was tampered with. This block's own fields are
    /// untouched, but everything built on altered history is distrusted.
    Suspect,
}

impl Trust {
    pub fn is_trusted(self) -> bool {
        matches!(self, Trust::Sealed)
    }
}

/// One ledger entry: payload, linkage to its predecessor, and a
/// work-sealed digest. Only `Draft::seal` constructs a `Block`, so a
/// block is never observable in an unsealed state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub data: String,
    pub timestamp: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
    trust: Trust,
}

impl Block {
    pub fn trust(&self) -> Trust {
        self.trust
    }

    /// Recompute the digest from the current fields and compare it to
    /// the stored hash. Stronger than [`Chain::is_block_valid`], which
    /// trusts the stored hash and only checks prefix, linkage, and the
    /// trust state.
    pub fn digest_matches(&self) -> bool {
        compute_digest(
            self.index,
            &self.data,
            &self.timestamp,
            &self.previous_hash,
            self.nonce,
        ) == self.hash
    }

    /// Replace the payload and recompute the digest at the current nonce
    /// without redoing the work; the result generally fails the
    /// difficulty predicate. Models an attacker who can rehash but
    /// cannot cheaply re-mine. Marks the block `Tampered` unconditionally
    /// and touches nothing outside this block.
    pub(crate) fn tamper(&mut self, new_data: String) {
        self.data = new_data;
        self.hash = compute_digest(
            self.index,
            &self.data,
            &self.timestamp,
            &self.previous_hash,
            self.nonce,
        );
        self.trust = Trust::Tampered;
    }

    pub(crate) fn mark_suspect(&mut self) {
        self.trust = Trust::Suspect;
    }
}

/// Fixed fields of a block whose proof-of-work has not run yet.
#[derive(Debug)]
pub(crate) struct Draft {
    index: u64,
    data: String,
    timestamp: String,
    previous_hash: String,
}

impl Draft {
    pub(crate) fn new(index: u64, data: String, timestamp: String, previous_hash: String) -> Self {
        Self {
            index,
            data,
            timestamp,
            previous_hash,
        }
    }

    /// Proof-of-work search: the nonce starts at 0 and advances by 1 per
    /// failed attempt until the digest carries `difficulty` leading zero
    /// hex characters. Expected cost grows as 16^difficulty. Fails with
    /// [`PowError::SearchExhausted`] once `max_attempts` digests were
    /// computed without success.
    pub(crate) fn seal(self, difficulty: u32, max_attempts: u64) -> Result<Block, PowError> {
        let mut nonce: u64 = 0;
        let mut attempts: u64 = 0;
        loop {
            let hash = compute_digest(
                self.index,
                &self.data,
                &self.timestamp,
                &self.previous_hash,
                nonce,
            );
            if meets_difficulty(&hash, difficulty) {
                tracing::info!(index = self.index, nonce, %hash, "block sealed");
                return Ok(Block {
                    index: self.index,
                    data: self.data,
                    timestamp: self.timestamp,
                    previous_hash: self.previous_hash,
                    nonce,
                    hash,
                    trust: Trust::Sealed,
                });
            }
            attempts += 1;
            if attempts >= max_attempts {
                return Err(PowError::SearchExhausted {
                    attempts,
                    difficulty,
                });
            }
            nonce += 1;
        }
    }
}

/// Proof-of-work failure. Only reachable under a finite attempt cap; the
/// default cap is effectively unbounded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PowError {
    #[error("proof-of-work search exhausted after {attempts} attempts at difficulty {difficulty}")]
    SearchExhausted { attempts: u64, difficulty: u32 },
}

/// Digest input with keys in sorted order. serde_json emits fields in
/// declaration order, so the declaration order here IS the canonical key
/// order. `hash` and the trust state are deliberately not part of the
/// input.
#[derive(Serialize)]
struct DigestInput<'a> {
    data: &'a str,
    index: u64,
    nonce: u64,
    previous_hash: &'a str,
    timestamp: &'a str,
}

/// Deterministic SHA-256 digest of the five committed fields, rendered
/// as lowercase hex.
pub fn compute_digest(
    index: u64,
    data: &str,
    timestamp: &str,
    previous_hash: &str,
    nonce: u64,
) -> String {
    let input = DigestInput {
        data,
        index,
        nonce,
        previous_hash,
        timestamp,
    };
    let bytes = serde_json::to_vec(&input).expect("digest input serializes");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

/// True when `hash_hex` starts with at least `difficulty` '0' characters.
pub fn meets_difficulty(hash_hex: &str, difficulty: u32) -> bool {
    let want = difficulty as usize;
    hash_hex.len() >= want && hash_hex.as_bytes()[..want].iter().all(|&b| b == b'0')
}

/// Current time as RFC 3339 text, the form blocks commit to.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
