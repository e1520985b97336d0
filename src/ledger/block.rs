use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use super::transaction::Transaction;

/// Represents a sealed block in the ledger
///
/// Fields are declared in alphabetical order to mirror the canonical digest
/// ordering. Blocks are never mutated after creation; the whole chain is
/// replaced wholesale when consensus picks a longer valid peer chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// 1-based position of the block in the chain
    pub index: u64,

    /// Canonical digest of the preceding block, or the genesis sentinel
    pub previous_hash: String,

    /// Proof of work satisfying `pow::valid_proof` against the previous proof
    pub proof: u64,

    /// Wall-clock creation time, epoch seconds
    pub timestamp: f64,

    /// Transactions sealed into this block, in insertion order
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a new block
    pub fn new(
        index: u64,
        timestamp: f64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Block {
            index,
            previous_hash,
            proof,
            timestamp,
            transactions,
        }
    }

    /// Calculates the canonical SHA-256 digest of the block
    ///
    /// # Returns
    ///
    /// The hash as a lowercase hexadecimal string
    pub fn digest(&self) -> String {
        let block_string = serde_json::to_string(&self.canonical_value())
            .expect("block fields serialize infallibly");

        let mut hasher = Sha256::new();
        hasher.update(block_string.as_bytes());

        hex::encode(hasher.finalize())
    }

    /// Canonical serialization contract: keys in alphabetical order,
    /// numbers in serde_json's shortest round-trip form. Two structurally
    /// equal blocks must produce byte-identical output, and every node on
    /// the network must agree on it for chains to validate across peers.
    fn canonical_value(&self) -> serde_json::Value {
        json!({
            "index": self.index,
            "previous_hash": self.previous_hash,
            "proof": self.proof,
            "timestamp": self.timestamp,
            "transactions": self.transactions,
        })
    }
}
