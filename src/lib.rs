// A minimal single-process proof-of-work ledger node.
//
// The `ledger` module is the core engine: block/transaction data model,
// canonical hashing, proof of work, chain validation and longest-valid-chain
// consensus. The `api` module is a thin actix-web adapter over it.

pub mod api;
pub mod ledger;
pub mod node;
