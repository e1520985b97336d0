use uuid::Uuid;

use crate::ledger::{Ledger, PeerSet};

/// Per-process node state handed to the HTTP layer
///
/// Explicitly constructed at startup and shared via `web::Data`; handlers
/// only ever issue commands and queries against it.
pub struct Node {
    /// This node's identity, used as the mining reward recipient
    pub id: String,

    /// The ledger owned by this node
    pub ledger: Ledger,

    /// Peers known to this node
    pub peers: PeerSet,

    /// Shared HTTP client for peer chain fetches
    pub http: reqwest::Client,
}

impl Node {
    /// Creates a node with a fresh ledger and a random identity
    pub fn new() -> Self {
        Node {
            id: Uuid::new_v4().simple().to_string(),
            ledger: Ledger::new(),
            peers: PeerSet::new(),
            http: reqwest::Client::new(),
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::new()
    }
}
