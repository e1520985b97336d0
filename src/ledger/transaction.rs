use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sender address reserved for mining rewards.
pub const REWARD_SENDER: &str = "0";

/// Represents a transfer waiting to be sealed into a block.
///
/// Fields are declared in alphabetical order; the derived serialization is
/// therefore already in canonical key order (see `block::canonical_value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Amount being transferred
    pub amount: f64,

    /// Recipient's address
    pub recipient: String,

    /// Sender's address
    pub sender: String,
}

impl Transaction {
    /// Creates a new transaction
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Transaction {
            amount,
            recipient: recipient.into(),
            sender: sender.into(),
        }
    }

    /// Creates a mining reward transaction for `recipient`
    ///
    /// The sender is the reserved `"0"` address to signify the coin was
    /// minted, not transferred.
    pub fn reward(recipient: impl Into<String>) -> Self {
        Transaction::new(REWARD_SENDER, recipient, 1.0)
    }

    /// Returns true if this is a mining reward
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
