use std::collections::HashSet;
use std::sync::Mutex;

use log::info;
use thiserror::Error;
use url::Url;

/// Errors that can occur during peer registration
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Invalid peer address: {0}")]
    InvalidAddress(String),
}

/// Set of known peer nodes, identified by `host[:port]` only
///
/// Scheme and path are stripped at registration and duplicates collapse.
/// Peers are never removed.
#[derive(Debug, Default)]
pub struct PeerSet {
    nodes: Mutex<HashSet<String>>,
}

impl PeerSet {
    /// Creates an empty peer set
    pub fn new() -> Self {
        PeerSet::default()
    }

    /// Registers a peer node
    ///
    /// Accepts full URLs (`http://192.168.0.5:5000/`) as well as bare
    /// `host:port` addresses. The stored identity is `host[:port]`.
    pub fn register(&self, address: &str) -> Result<(), PeerError> {
        let location = parse_location(address)
            .ok_or_else(|| PeerError::InvalidAddress(address.to_string()))?;

        let mut nodes = self.nodes.lock().unwrap();
        if nodes.insert(location.clone()) {
            info!("Registered peer node {}", location);
        }

        Ok(())
    }

    /// Gets a snapshot of the registered peers
    ///
    /// Iteration order is unspecified; consensus tie-breaking depends on it
    /// and is documented as nondeterministic.
    pub fn peers(&self) -> Vec<String> {
        self.nodes.lock().unwrap().iter().cloned().collect()
    }

    /// Gets the number of registered peers
    pub fn len(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }

    /// Returns true when no peers are registered
    pub fn is_empty(&self) -> bool {
        self.nodes.lock().unwrap().is_empty()
    }
}

/// Reduces a peer address to its `host[:port]` network location
fn parse_location(address: &str) -> Option<String> {
    // Bare `host:port` parses as a scheme-only URL with no host, so retry
    // with an explicit scheme when the first attempt yields none.
    let url = match Url::parse(address) {
        Ok(url) if url.host_str().is_some() => url,
        _ => Url::parse(&format!("http://{}", address)).ok()?,
    };

    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
