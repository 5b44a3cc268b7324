//! Identity resolution: attributing isolated identities to their hosts.
//!
//! Some atoms are emitted under a transient, sandboxed identity that must be
//! rewritten to its stable owner before reporting. The transform only needs
//! the read side; the mapping itself is maintained by process lifecycle
//! tracking outside this crate.

use dashmap::DashMap;

/// Maps an isolated identity to its stable host identity.
///
/// `host_id_or_self` is idempotent: a host identity resolves to itself, so
/// running normalization twice is harmless. Implementations must be safe to
/// call concurrently while batches from different pullers are reconciled.
pub trait IdentityResolver: Send + Sync {
    /// The stable owner of `id`, or `id` itself when it is not isolated.
    fn host_id_or_self(&self, id: i64) -> i64;
}

/// Concurrent isolated-to-host mapping table.
#[derive(Debug, Default)]
pub struct IsolatedIdMap {
    hosts: DashMap<i64, i64>,
}

impl IsolatedIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `isolated` belongs to `host`.
    pub fn insert(&self, isolated: i64, host: i64) {
        self.hosts.insert(isolated, host);
    }

    /// Drops the mapping for an isolated identity that went away.
    pub fn remove(&self, isolated: i64) {
        self.hosts.remove(&isolated);
    }

    /// Number of live isolated identities.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl IdentityResolver for IsolatedIdMap {
    fn host_id_or_self(&self, id: i64) -> i64 {
        self.hosts.get(&id).map_or(id, |host| *host)
    }
}
