use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use super::block::Block;
use super::chain::Ledger;
use super::peers::PeerSet;
use super::validator;

/// Upper bound on concurrently in-flight peer fetches.
const MAX_FETCH_FANOUT: usize = 8;

/// Per-peer fetch timeout; a slow or unreachable peer must not stall the
/// resolution pass beyond this.
const PEER_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur fetching a peer's chain
///
/// All of them mean the same thing to resolution: the peer contributes no
/// candidate and the scan continues.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Peer returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Payload of a peer's `GET /chain` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteChain {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Resolves conflicts with the registered peers via the
/// longest-valid-chain rule
///
/// Fetches every peer's chain over HTTP and, if any peer reports a chain
/// strictly longer than the local one that also passes validation, replaces
/// the local chain wholesale.
///
/// # Returns
///
/// true if the local chain was replaced
pub async fn resolve(ledger: &Ledger, peers: &PeerSet, client: &reqwest::Client) -> bool {
    let winner = resolve_with(ledger.len(), peers.peers(), |peer| {
        let client = client.clone();
        async move { fetch_chain(&client, &peer).await }
    })
    .await;

    match winner {
        Some(chain) => {
            info!("Consensus: adopting peer chain of length {}", chain.len());
            ledger.replace_chain(chain);
            true
        }
        None => {
            info!("Consensus: local chain is authoritative");
            false
        }
    }
}

/// Scans the peers with `fetch` and picks the winning candidate chain
///
/// A candidate must report a length strictly greater than the best seen so
/// far (starting from `local_len`) and pass chain validation. Among
/// equal-length valid candidates the first one seen wins; with concurrent
/// fetches "first" follows completion order, which is as unordered as the
/// peer set itself. Fetch failures skip the peer without aborting the scan.
pub async fn resolve_with<F, Fut>(
    local_len: usize,
    peers: Vec<String>,
    fetch: F,
) -> Option<Vec<Block>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<RemoteChain, FetchError>>,
{
    let mut results = stream::iter(peers)
        .map(|peer| {
            let response = fetch(peer.clone());
            async move { (peer, response.await) }
        })
        .buffer_unordered(MAX_FETCH_FANOUT);

    // Fetches overlap, but the reduction below runs one result at a time so
    // the strictly-longer tie-break stays well defined.
    let mut best_len = local_len;
    let mut winner = None;

    while let Some((peer, result)) = results.next().await {
        match result {
            Ok(remote) => {
                if remote.length > best_len && validator::is_valid(&remote.chain) {
                    debug!(
                        "Peer {} offers a valid chain of length {}",
                        peer, remote.length
                    );
                    best_len = remote.length;
                    winner = Some(remote.chain);
                } else {
                    debug!("Peer {} contributes no candidate", peer);
                }
            }
            Err(err) => warn!("Failed to fetch chain from peer {}: {}", peer, err),
        }
    }

    winner
}

/// Fetches `GET http://{peer}/chain` with a bounded timeout
async fn fetch_chain(client: &reqwest::Client, peer: &str) -> Result<RemoteChain, FetchError> {
    let url = format!("http://{}/chain", peer);

    let response = client
        .get(&url)
        .timeout(PEER_FETCH_TIMEOUT)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    Ok(response.json::<RemoteChain>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pow;
    use std::collections::HashMap;

    fn mined_chain(blocks: usize) -> Vec<Block> {
        let ledger = Ledger::new();
        for i in 1..blocks {
            let last = ledger.last_block().unwrap();
            ledger.new_transaction("alice", "bob", i as f64);
            ledger.new_block(pow::solve(last.proof), None);
        }

        ledger.chain()
    }

    fn remote(chain: Vec<Block>) -> RemoteChain {
        RemoteChain {
            length: chain.len(),
            chain,
        }
    }

    fn canned_fetch(
        responses: HashMap<String, Result<RemoteChain, ()>>,
    ) -> impl Fn(String) -> futures::future::Ready<Result<RemoteChain, FetchError>> {
        move |peer| {
            futures::future::ready(match responses.get(&peer) {
                Some(Ok(remote)) => Ok(remote.clone()),
                _ => Err(FetchError::Status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                )),
            })
        }
    }

    #[tokio::test]
    async fn test_longest_valid_peer_chain_wins() {
        let responses = HashMap::from([
            ("peer-a:5000".to_string(), Ok(remote(mined_chain(5)))),
            ("peer-b:5000".to_string(), Ok(remote(mined_chain(4)))),
        ]);
        let peers: Vec<String> = responses.keys().cloned().collect();

        let winner = resolve_with(3, peers, canned_fetch(responses)).await;

        assert_eq!(winner.map(|chain| chain.len()), Some(5));
    }

    #[tokio::test]
    async fn test_no_peer_strictly_longer_leaves_chain_alone() {
        let responses = HashMap::from([
            ("peer-a:5000".to_string(), Ok(remote(mined_chain(3)))),
            ("peer-b:5000".to_string(), Ok(remote(mined_chain(2)))),
        ]);
        let peers: Vec<String> = responses.keys().cloned().collect();

        assert!(resolve_with(3, peers, canned_fetch(responses)).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_longer_chain_is_discarded() {
        let mut tampered = mined_chain(5);
        tampered[2].proof += 1;
        tampered[2].previous_hash = "0".repeat(64);

        let responses =
            HashMap::from([("peer-a:5000".to_string(), Ok(remote(tampered)))]);
        let peers: Vec<String> = responses.keys().cloned().collect();

        assert!(resolve_with(3, peers, canned_fetch(responses)).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_abort_scan() {
        let responses = HashMap::from([
            ("peer-down:5000".to_string(), Err(())),
            ("peer-up:5000".to_string(), Ok(remote(mined_chain(5)))),
        ]);
        let peers: Vec<String> = responses.keys().cloned().collect();

        let winner = resolve_with(3, peers, canned_fetch(responses)).await;

        assert_eq!(winner.map(|chain| chain.len()), Some(5));
    }

    #[tokio::test]
    async fn test_resolve_without_peers_returns_false() {
        let ledger = Ledger::new();
        let peers = PeerSet::new();
        let client = reqwest::Client::new();

        assert!(!resolve(&ledger, &peers, &client).await);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_replaces_ledger_chain() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);

        let peer_chain = mined_chain(3);
        let responses =
            HashMap::from([("peer-a:5000".to_string(), Ok(remote(peer_chain.clone())))]);
        let peers: Vec<String> = responses.keys().cloned().collect();

        let winner = resolve_with(ledger.len(), peers, canned_fetch(responses)).await;
        let winner = winner.expect("strictly longer valid chain must win");
        ledger.replace_chain(winner);

        assert_eq!(ledger.chain(), peer_chain);
    }
}
