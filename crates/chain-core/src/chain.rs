//! Ordered ledger rooted at a mined genesis block: append (mine),
//! per-block and whole-chain validation, and the cascading tamper path.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DIFFICULTY, DEFAULT_MAX_ATTEMPTS, GENESIS_DATA, GENESIS_PREVIOUS_HASH,
};
use crate::{meets_difficulty, now_rfc3339, Block, Draft, PowError};

/// Per-chain mining parameters, fixed for the chain's lifetime.
#[derive(Clone, Copy, Debug)]
pub struct ChainConfig {
    /// Required leading zero hex characters in a sealed digest.
    pub difficulty: u32,
    /// Proof-of-work attempt cap per block. `u64::MAX` is unbounded in
    /// practice; callers wanting bounded latency set a finite cap and
    /// handle [`PowError::SearchExhausted`].
    pub max_attempts: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Outcome of an accepted tamper request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TamperOutcome {
    /// Data replaced; the block and all its descendants are now invalid.
    Applied,
    /// New data equalled the current data; nothing changed.
    NoChange,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TamperError {
    /// Genesis immutability is a business rule, not a structural limit.
    #[error("modification of the genesis block is not allowed")]
    GenesisProtected,
    #[error("block index {index} out of range for chain of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Serializable read model of a block, the exact shape the transport
/// layer renders. `valid` is computed at snapshot time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    pub index: u64,
    pub data: String,
    pub timestamp: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
    pub valid: bool,
}

/// The ledger. Blocks enter only through [`Chain::append`] and are never
/// removed; the only later mutation path is [`Chain::tamper`].
pub struct Chain {
    blocks: Vec<Block>,
    config: ChainConfig,
}

impl Chain {
    /// Build a chain at the given difficulty and mine its genesis block.
    pub fn new(difficulty: u32) -> Result<Self, PowError> {
        Self::with_config(ChainConfig {
            difficulty,
            ..ChainConfig::default()
        })
    }

    pub fn with_config(config: ChainConfig) -> Result<Self, PowError> {
        let genesis = Draft::new(
            0,
            GENESIS_DATA.to_string(),
            now_rfc3339(),
            GENESIS_PREVIOUS_HASH.to_string(),
        )
        .seal(config.difficulty, config.max_attempts)?;
        Ok(Self {
            blocks: vec![genesis],
            config,
        })
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn last_block(&self) -> &Block {
        self.blocks.last().expect("chain holds at least genesis")
    }

    /// Mine a block holding `data` onto the tip and return its view.
    pub fn append(&mut self, data: impl Into<String>) -> Result<BlockView, PowError> {
        let draft = Draft::new(
            self.blocks.len() as u64,
            data.into(),
            now_rfc3339(),
            self.last_block().hash.clone(),
        );
        let block = draft.seal(self.config.difficulty, self.config.max_attempts)?;
        self.blocks.push(block);
        Ok(self.view(self.blocks.len() - 1))
    }

    /// Per-block structural and provenance check: difficulty prefix,
    /// linkage to the stored predecessor hash (the sentinel for
    /// genesis), and a `Sealed` trust state. Trusts the stored hash
    /// rather than recomputing it; [`Block::digest_matches`] is the
    /// stronger form. Idempotent and side-effect-free.
    pub fn is_block_valid(&self, block: &Block) -> bool {
        if !meets_difficulty(&block.hash, self.config.difficulty) || !block.trust().is_trusted() {
            return false;
        }
        if block.index == 0 {
            block.previous_hash == GENESIS_PREVIOUS_HASH
        } else {
            match self.blocks.get(block.index as usize - 1) {
                Some(prev) => block.previous_hash == prev.hash,
                None => false,
            }
        }
    }

    /// True iff every block passes [`Chain::is_block_valid`], checked in
    /// order so callers get a full status picture from [`Chain::snapshot`].
    pub fn is_chain_valid(&self) -> bool {
        self.blocks.iter().all(|b| self.is_block_valid(b))
    }

    fn view(&self, position: usize) -> BlockView {
        let block = &self.blocks[position];
        BlockView {
            index: block.index,
            data: block.data.clone(),
            timestamp: block.timestamp.clone(),
            previous_hash: block.previous_hash.clone(),
            nonce: block.nonce,
            hash: block.hash.clone(),
            valid: self.is_block_valid(block),
        }
    }

    /// Read-only view of every block with freshly computed validity.
    pub fn snapshot(&self) -> Vec<BlockView> {
        (0..self.blocks.len()).map(|i| self.view(i)).collect()
    }

    /// Rewrite the payload of `blocks[index]` and distrust everything
    /// built on top of it. Genesis is immutable; equal data is a no-op.
    pub fn tamper(
        &mut self,
        index: usize,
        new_data: impl Into<String>,
    ) -> Result<TamperOutcome, TamperError> {
        if index == 0 {
            return Err(TamperError::GenesisProtected);
        }
        if index >= self.blocks.len() {
            return Err(TamperError::IndexOutOfRange {
                index,
                len: self.blocks.len(),
            });
        }
        let new_data = new_data.into();
        if self.blocks[index].data == new_data {
            return Ok(TamperOutcome::NoChange);
        }
        self.blocks[index].tamper(new_data);
        for later in &mut self.blocks[index + 1..] {
            later.mark_suspect();
        }
        tracing::warn!(index, "block tampered, descendants marked suspect");
        Ok(TamperOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Trust;

    // Difficulty 1 keeps test mining around 16 expected attempts.
    fn chain(difficulty: u32) -> Chain {
        Chain::new(difficulty).expect("genesis mines")
    }

    #[test]
    fn genesis_is_mined_at_construction() {
        let chain = chain(1);
        assert_eq!(chain.len(), 1);
        let genesis = &chain.blocks()[0];
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.data, GENESIS_DATA);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(meets_difficulty(&genesis.hash, 1));
        assert!(chain.is_block_valid(genesis));
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn append_links_blocks_in_order() {
        let mut chain = chain(1);
        chain.append("a").expect("block mines");
        chain.append("b").expect("block mines");
        chain.append("c").expect("block mines");

        assert_eq!(chain.len(), 4);
        for i in 1..chain.len() {
            assert_eq!(chain.blocks()[i].previous_hash, chain.blocks()[i - 1].hash);
            assert_eq!(chain.blocks()[i].index, i as u64);
        }
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn append_returns_the_new_tip_view() {
        let mut chain = chain(1);
        let view = chain.append("a").expect("block mines");
        assert_eq!(view.index, 1);
        assert_eq!(view.data, "a");
        assert!(view.valid);
        assert_eq!(view.hash, chain.last_block().hash);
    }

    #[test]
    fn append_propagates_search_exhaustion() {
        let mut chain = Chain::with_config(ChainConfig {
            difficulty: 0,
            max_attempts: 1,
        })
        .expect("difficulty 0 seals on the first nonce");
        // The chain stays usable at difficulty 0, so force a miss.
        chain.config.difficulty = 64;
        let err = chain.append("a").unwrap_err();
        assert!(matches!(err, PowError::SearchExhausted { attempts: 1, .. }));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn genesis_tamper_is_rejected() {
        let mut chain = chain(1);
        chain.append("a").expect("block mines");
        assert_eq!(chain.tamper(0, "evil"), Err(TamperError::GenesisProtected));
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn out_of_range_tamper_is_rejected() {
        let mut chain = chain(1);
        chain.append("a").expect("block mines");
        assert_eq!(
            chain.tamper(2, "evil"),
            Err(TamperError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn equal_data_tamper_is_a_no_op() {
        let mut chain = chain(1);
        chain.append("a").expect("block mines");
        let hash_before = chain.blocks()[1].hash.clone();

        assert_eq!(chain.tamper(1, "a"), Ok(TamperOutcome::NoChange));
        assert_eq!(chain.blocks()[1].hash, hash_before);
        assert_eq!(chain.blocks()[1].trust(), Trust::Sealed);
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn tamper_cascades_to_all_descendants() {
        let mut chain = chain(1);
        chain.append("a").expect("block mines");
        chain.append("b").expect("block mines");
        chain.append("c").expect("block mines");

        assert_eq!(chain.tamper(1, "X"), Ok(TamperOutcome::Applied));

        assert_eq!(chain.blocks()[0].trust(), Trust::Sealed);
        assert_eq!(chain.blocks()[1].trust(), Trust::Tampered);
        assert_eq!(chain.blocks()[2].trust(), Trust::Suspect);
        assert_eq!(chain.blocks()[3].trust(), Trust::Suspect);

        let snapshot = chain.snapshot();
        assert!(snapshot[0].valid);
        assert!(!snapshot[1].valid);
        assert!(!snapshot[2].valid);
        assert!(!snapshot[3].valid);
        assert!(!chain.is_chain_valid());
    }

    #[test]
    fn later_blocks_keep_their_sealed_hashes_after_a_cascade() {
        let mut chain = chain(1);
        chain.append("a").expect("block mines");
        chain.append("b").expect("block mines");
        let sealed_hash = chain.blocks()[2].hash.clone();

        chain.tamper(1, "X").expect("tamper applies");

        // cascade only flips trust; block 2's own fields are untouched
        assert_eq!(chain.blocks()[2].hash, sealed_hash);
        assert!(chain.blocks()[2].digest_matches());
        assert!(!chain.is_block_valid(&chain.blocks()[2]));
    }

    #[test]
    fn snapshot_shape_matches_the_wire_contract() {
        let chain = chain(1);
        let snapshot = chain.snapshot();
        let json = serde_json::to_value(&snapshot[0]).expect("view serializes");
        let obj = json.as_object().expect("view is an object");
        for key in [
            "index",
            "data",
            "timestamp",
            "previous_hash",
            "nonce",
            "hash",
            "valid",
        ] {
            assert!(obj.contains_key(key), "missing field {key}");
        }
        assert_eq!(obj.len(), 7);
    }
}
