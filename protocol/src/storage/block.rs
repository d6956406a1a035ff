//! # Block Reference
//!
//! Block assembly, forging, and fork resolution live outside this crate.
//! The transaction core only needs enough of a block to anchor state
//! mutation: the id (for the genesis waivers and balance provenance) and the
//! height (for round accounting).

use serde::{Deserialize, Serialize};

use crate::config::GENESIS_BLOCK_ID;

/// The slice of a block the transaction pipeline consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block identifier, a decimal u64 string like a transaction id.
    pub id: String,
    /// Chain height, 1-based; the genesis block is height 1.
    pub height: u64,
    /// Epoch timestamp of the slot this block was forged in.
    pub timestamp: i32,
}

impl Block {
    pub fn new(id: &str, height: u64, timestamp: i32) -> Self {
        Self {
            id: id.to_string(),
            height,
            timestamp,
        }
    }

    /// The genesis block reference. Transactions applied under this id skip
    /// the balance check and the second-signature requirement.
    pub fn genesis() -> Self {
        Self::new(GENESIS_BLOCK_ID, 1, 0)
    }

    /// Whether this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.id == GENESIS_BLOCK_ID
    }
}
