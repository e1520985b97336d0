use log::debug;

use super::block::Block;
use super::pow;

/// Validates the structural and proof-of-work continuity of a chain
///
/// Walks adjacent pairs starting at index 1; each block must carry the
/// canonical digest of its predecessor and a proof solving the predecessor's
/// puzzle. Chains of length 0 or 1 are trivially valid (the genesis block is
/// exempt from the difficulty predicate). Returns false on the first
/// violation.
pub fn is_valid(chain: &[Block]) -> bool {
    for pair in chain.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);

        if cur.previous_hash != prev.digest() {
            debug!(
                "Chain invalid: block {} does not link to digest of block {}",
                cur.index, prev.index
            );
            return false;
        }

        if !pow::valid_proof(prev.proof, cur.proof) {
            debug!(
                "Chain invalid: block {} proof fails against block {} proof",
                cur.index, prev.index
            );
            return false;
        }
    }

    true
}
