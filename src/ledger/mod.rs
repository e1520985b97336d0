// Ledger module
//
// This module contains the core ledger/consensus engine including:
// - Block and Transaction structures
// - Canonical block hashing
// - Proof of work algorithm
// - Chain validation
// - Peer registration and longest-valid-chain resolution

pub mod block;
pub mod chain;
pub mod consensus;
pub mod peers;
pub mod pow;
pub mod transaction;
pub mod validator;

// Re-export main components for easier access
pub use block::Block;
pub use chain::Ledger;
pub use peers::PeerSet;
pub use transaction::Transaction;
