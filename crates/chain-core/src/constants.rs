pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Previous-hash sentinel committed by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
/// Payload of the genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";

/// Default number of leading zero hex characters a sealed digest must
/// carry. Keep this low; expected search cost is 16^difficulty.
pub const DEFAULT_DIFFICULTY: u32 = 3;
/// Default proof-of-work attempt cap: effectively unbounded.
pub const DEFAULT_MAX_ATTEMPTS: u64 = u64::MAX;
