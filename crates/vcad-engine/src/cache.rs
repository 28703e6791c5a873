//! Cross-evaluation geometry cache.
//!
//! Entries are keyed by [`NodeId`] and tagged with a hash of that node's own
//! operation (not its subtree). A lookup with a different hash means the node
//! was edited: the entry is dropped and the lookup misses. The cache keeps no
//! edges, so callers must invalidate dependents themselves (see
//! [`vcad_ir::Document::dependents_of`]).

use std::collections::{HashMap, VecDeque};
use std::hash::Hasher;
use std::sync::Arc;

use rustc_hash::FxHasher;
use tracing::debug;
use vcad_ir::{CsgOp, NodeId};

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 500;

/// Hash of a node's own operation.
///
/// Computed over the canonical JSON encoding so that any parameter edit,
/// including a changed child reference, changes the hash.
pub fn op_hash(op: &CsgOp) -> u64 {
    let mut hasher = FxHasher::default();
    match serde_json::to_vec(op) {
        Ok(bytes) => hasher.write(&bytes),
        Err(_) => hasher.write(format!("{op:?}").as_bytes()),
    }
    hasher.finish()
}

struct Entry<S> {
    solid: Arc<S>,
    hash: u64,
}

/// Bounded map from node id to a previously evaluated solid.
///
/// When full, inserting a new key evicts the oldest quarter of entries by
/// insertion order. Not synchronized: share across threads only behind a
/// lock.
pub struct GeometryCache<S> {
    entries: HashMap<NodeId, Entry<S>>,
    order: VecDeque<NodeId>,
    capacity: usize,
}

impl<S> Default for GeometryCache<S> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<S> GeometryCache<S> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Cached solid for `id` if it was stored with the same op hash.
    ///
    /// A hash mismatch evicts the stale entry.
    pub fn get(&mut self, id: NodeId, hash: u64) -> Option<Arc<S>> {
        let stored = self.entries.get(&id)?.hash;
        if stored != hash {
            debug!(node = %id, "geometry cache: stale entry evicted");
            self.remove(id);
            return None;
        }
        self.entries.get(&id).map(|e| Arc::clone(&e.solid))
    }

    /// Store a solid. Re-setting an existing key keeps its insertion position.
    pub fn set(&mut self, id: NodeId, hash: u64, solid: Arc<S>) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.solid = solid;
            entry.hash = hash;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_oldest((self.capacity / 4).max(1));
        }
        self.entries.insert(id, Entry { solid, hash });
        self.order.push_back(id);
    }

    /// Remove specific entries.
    pub fn invalidate(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            self.remove(id);
        }
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True if `id` has an entry, regardless of hash.
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    fn remove(&mut self, id: NodeId) {
        if self.entries.remove(&id).is_some() {
            self.order.retain(|k| *k != id);
        }
    }

    fn evict_oldest(&mut self, n: usize) {
        debug!(count = n, "geometry cache full, evicting oldest entries");
        for _ in 0..n {
            match self.order.pop_front() {
                Some(id) => {
                    self.entries.remove(&id);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcad_ir::Vec3;

    fn cube(size: f64) -> CsgOp {
        CsgOp::Cube {
            size: Vec3::new(size, size, size),
        }
    }

    #[test]
    fn hit_returns_same_reference() {
        let mut cache = GeometryCache::new(4);
        let solid = Arc::new("solid");
        let h = op_hash(&cube(1.0));
        cache.set(NodeId(1), h, Arc::clone(&solid));

        let a = cache.get(NodeId(1), h).unwrap();
        let b = cache.get(NodeId(1), h).unwrap();
        assert!(Arc::ptr_eq(&a, &solid));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn hash_mismatch_evicts() {
        let mut cache = GeometryCache::new(4);
        cache.set(NodeId(1), op_hash(&cube(1.0)), Arc::new(1));
        assert!(cache.get(NodeId(1), op_hash(&cube(2.0))).is_none());
        assert!(!cache.contains(NodeId(1)));
        assert!(cache.get(NodeId(1), op_hash(&cube(1.0))).is_none());
    }

    #[test]
    fn op_hash_tracks_parameters() {
        assert_eq!(op_hash(&cube(1.0)), op_hash(&cube(1.0)));
        assert_ne!(op_hash(&cube(1.0)), op_hash(&cube(1.5)));
        let a = CsgOp::Translate {
            child: NodeId(1),
            offset: Vec3::zero(),
        };
        let b = CsgOp::Translate {
            child: NodeId(2),
            offset: Vec3::zero(),
        };
        assert_ne!(op_hash(&a), op_hash(&b));
    }

    #[test]
    fn full_cache_evicts_oldest_quarter() {
        let mut cache = GeometryCache::new(8);
        for i in 0..8 {
            cache.set(NodeId(i), 0, Arc::new(i));
        }
        assert_eq!(cache.len(), 8);
        cache.set(NodeId(100), 0, Arc::new(100));
        // 8 - 2 evicted + 1 inserted
        assert_eq!(cache.len(), 7);
        assert!(!cache.contains(NodeId(0)));
        assert!(!cache.contains(NodeId(1)));
        assert!(cache.contains(NodeId(2)));
        assert!(cache.contains(NodeId(100)));
    }

    #[test]
    fn small_cache_evicts_at_least_one() {
        let mut cache = GeometryCache::new(2);
        cache.set(NodeId(1), 0, Arc::new(1));
        cache.set(NodeId(2), 0, Arc::new(2));
        cache.set(NodeId(3), 0, Arc::new(3));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(NodeId(1)));
    }

    #[test]
    fn reset_keeps_position() {
        let mut cache = GeometryCache::new(4);
        for i in 0..4 {
            cache.set(NodeId(i), 0, Arc::new(i));
        }
        cache.set(NodeId(0), 7, Arc::new(42));
        assert_eq!(cache.len(), 4);
        cache.set(NodeId(9), 0, Arc::new(9));
        // Node 0 was still the oldest.
        assert!(!cache.contains(NodeId(0)));
    }

    #[test]
    fn invalidate_and_clear() {
        let mut cache = GeometryCache::new(8);
        for i in 0..4 {
            cache.set(NodeId(i), 0, Arc::new(i));
        }
        cache.invalidate([NodeId(1), NodeId(3), NodeId(77)]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(NodeId(0)));
        assert!(!cache.contains(NodeId(1)));
        cache.clear();
        assert!(cache.is_empty());
    }
}
