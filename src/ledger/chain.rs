use std::sync::Mutex;

use chrono::Utc;
use log::info;
use thiserror::Error;

use super::block::Block;
use super::transaction::Transaction;

/// Previous-hash sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Proof constant carried by the genesis block. The genesis block is exempt
/// from the proof-of-work difficulty predicate.
pub const GENESIS_PROOF: u64 = 100;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Unreachable after construction; indicates a programming error.
    #[error("ledger chain is empty")]
    EmptyChain,
}

/// Chain and pending pool, guarded together
///
/// Sealing a block moves the pool into the block and appends the block as
/// one atomic step, so both live under a single lock.
#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

/// Represents the node's ledger: the block chain plus the pool of
/// transactions not yet sealed into a block.
///
/// All mutation goes through this type; the consensus resolver only ever
/// swaps the chain wholesale via [`Ledger::replace_chain`].
#[derive(Debug)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    /// Creates a new ledger with a genesis block
    pub fn new() -> Self {
        let ledger = Ledger {
            state: Mutex::new(LedgerState {
                chain: Vec::new(),
                pending: Vec::new(),
            }),
        };

        // Genesis block, exempt from proof-of-work validation
        ledger.new_block(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH.to_string()));

        ledger
    }

    /// Adds a new transaction to the pending pool
    ///
    /// # Returns
    ///
    /// The index of the block that will include this transaction, i.e. the
    /// index of the next block to be sealed. No validation of the amount or
    /// the addresses is performed.
    pub fn new_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        let mut state = self.state.lock().unwrap();
        state
            .pending
            .push(Transaction::new(sender, recipient, amount));

        next_index(&state.chain)
    }

    /// Seals the pending pool into a new block and appends it to the chain
    ///
    /// `previous_hash` defaults to the digest of the last block when omitted.
    /// The pool is moved into the block, leaving it empty.
    pub fn new_block(&self, proof: u64, previous_hash: Option<String>) -> Block {
        let mut state = self.state.lock().unwrap();

        let previous_hash = previous_hash.unwrap_or_else(|| {
            state
                .chain
                .last()
                .expect("previous_hash may only be omitted after genesis")
                .digest()
        });

        let index = next_index(&state.chain);
        let transactions = std::mem::take(&mut state.pending);
        let block = Block::new(index, epoch_seconds(), transactions, proof, previous_hash);

        state.chain.push(block.clone());
        info!(
            "Sealed block {} with {} transaction(s)",
            block.index,
            block.transactions.len()
        );

        block
    }

    /// Gets the most recently sealed block
    pub fn last_block(&self) -> Result<Block, LedgerError> {
        let state = self.state.lock().unwrap();
        state.chain.last().cloned().ok_or(LedgerError::EmptyChain)
    }

    /// Gets a snapshot of the entire chain
    pub fn chain(&self) -> Vec<Block> {
        self.state.lock().unwrap().chain.clone()
    }

    /// Gets the current chain length
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().chain.len()
    }

    /// Returns true when the chain has no blocks; never the case after
    /// construction
    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().chain.is_empty()
    }

    /// Gets a snapshot of the pending pool
    pub fn pending(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().pending.clone()
    }

    /// Replaces the chain wholesale
    ///
    /// Used by consensus resolution when a longer valid peer chain wins.
    /// The pending pool is left untouched.
    pub fn replace_chain(&self, chain: Vec<Block>) {
        let mut state = self.state.lock().unwrap();
        info!(
            "Replacing chain of length {} with chain of length {}",
            state.chain.len(),
            chain.len()
        );
        state.chain = chain;
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new()
    }
}

/// 1-based index of the next block to be sealed
fn next_index(chain: &[Block]) -> u64 {
    chain.len() as u64 + 1
}

/// Current wall-clock time as real-valued epoch seconds
fn epoch_seconds() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}
