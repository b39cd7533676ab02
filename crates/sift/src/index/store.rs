//! Module: index::store
//! Responsibility: posting-list storage behind a transactional boundary,
//! plus the key ↔ hash registry that backs collision reporting.
//! Does not own: the indexing walk or expression evaluation (engine).

use crate::{
    index::posting::{PostingSet, PostingSetProvider, Roaring},
    record::Value,
    schema::FieldDescriptor,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::{collections::HashMap, sync::Arc};
use xxhash_rust::xxh3::xxh3_64;

/// Opaque error surface for store implementations.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The stable 64-bit key hash. Two distinct keys may collide; the
/// registry keeps the reverse mapping so finds can report candidates.
#[must_use]
pub fn key_hash(key: &str) -> u64 {
    xxh3_64(key.as_bytes())
}

///
/// ValueBucket
///
/// One (value, descriptor chain, posting set) triple under a path. The
/// chain uniquely identifies the field's semantic type, so predicate
/// dispatch at find time needs no re-resolution.
///

#[derive(Debug)]
pub struct ValueBucket {
    pub value: Value,
    pub descriptors: Vec<Arc<FieldDescriptor>>,
    pub postings: Box<dyn PostingSet>,
}

///
/// Store
///
/// Transactional access to posting state. Every engine operation opens
/// exactly one transaction: reads for find, writes for mutation. A write
/// transaction that is dropped without `commit` is closed; whether its
/// effects survive is up to the backend (the in-memory store applies
/// them directly and cannot roll back).
///

pub trait Store: Send + Sync {
    fn read(&self) -> Result<Box<dyn ReadTx + '_>, BackendError>;
    fn write(&self) -> Result<Box<dyn WriteTx + '_>, BackendError>;
    fn posting_sets(&self) -> Arc<dyn PostingSetProvider>;
}

pub trait ReadTx {
    /// Buckets stored under `<type_name>.<path>`, in insertion order.
    fn buckets<'a>(&'a self, type_name: &str, path: &str)
    -> Box<dyn Iterator<Item = &'a ValueBucket> + 'a>;

    /// Keys registered under a hash; more than one means a collision.
    fn keys_for(&self, id: u64) -> &[String];
}

pub trait WriteTx {
    /// Add `h(key)` to the bucket for `value` under the chain's path,
    /// creating the bucket on first sight of the value.
    fn add(
        &mut self,
        key: &str,
        value: Value,
        descriptors: &[Arc<FieldDescriptor>],
    ) -> Result<(), BackendError>;

    /// Remove `h(key)` from every bucket under the path prefix.
    fn remove(&mut self, key: &str, prefix: &str) -> Result<(), BackendError>;

    /// Remove `h(key)` everywhere and drop the key from the registry.
    fn clear(&mut self, key: &str) -> Result<(), BackendError>;

    fn commit(self: Box<Self>) -> Result<(), BackendError>;
}

///
/// MemoryStore
///
/// The default store: one reader/writer lock around the posting map and
/// the hash registry. Writes are exclusive, finds share the read side,
/// and commits are no-ops because mutations apply in place.
///

pub struct MemoryStore {
    provider: Arc<dyn PostingSetProvider>,
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    postings: HashMap<String, Vec<ValueBucket>>,
    hashes: HashMap<u64, Vec<String>>,
    keys: HashMap<String, u64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_provider(Arc::new(Roaring))
    }

    #[must_use]
    pub fn with_provider(provider: Arc<dyn PostingSetProvider>) -> Self {
        Self {
            provider,
            inner: RwLock::new(StoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn read(&self) -> Result<Box<dyn ReadTx + '_>, BackendError> {
        Ok(Box::new(MemoryReadTx {
            guard: self.inner.read(),
        }))
    }

    fn write(&self) -> Result<Box<dyn WriteTx + '_>, BackendError> {
        Ok(Box::new(MemoryWriteTx {
            guard: self.inner.write(),
            provider: self.provider.clone(),
        }))
    }

    fn posting_sets(&self) -> Arc<dyn PostingSetProvider> {
        self.provider.clone()
    }
}

struct MemoryReadTx<'a> {
    guard: RwLockReadGuard<'a, StoreInner>,
}

impl ReadTx for MemoryReadTx<'_> {
    fn buckets<'a>(
        &'a self,
        type_name: &str,
        path: &str,
    ) -> Box<dyn Iterator<Item = &'a ValueBucket> + 'a> {
        self.guard.buckets(type_name, path)
    }

    fn keys_for(&self, id: u64) -> &[String] {
        self.guard.keys_for(id)
    }
}

struct MemoryWriteTx<'a> {
    guard: RwLockWriteGuard<'a, StoreInner>,
    provider: Arc<dyn PostingSetProvider>,
}

impl WriteTx for MemoryWriteTx<'_> {
    fn add(
        &mut self,
        key: &str,
        value: Value,
        descriptors: &[Arc<FieldDescriptor>],
    ) -> Result<(), BackendError> {
        let Some(path) = bucket_path(descriptors) else {
            return Ok(());
        };
        let hash = key_hash(key);
        self.guard.register(key, hash);

        let buckets = self.guard.postings.entry(path).or_default();
        if let Some(bucket) = buckets.iter_mut().find(|b| b.value == value) {
            bucket.postings.set(hash);
        } else {
            let mut postings = self.provider.new_set();
            postings.set(hash);
            buckets.push(ValueBucket {
                value,
                descriptors: descriptors.to_vec(),
                postings,
            });
        }

        Ok(())
    }

    fn remove(&mut self, key: &str, prefix: &str) -> Result<(), BackendError> {
        let hash = self.guard.hash_of(key);
        for (path, buckets) in &mut self.guard.postings {
            if path == prefix || under_prefix(path, prefix) {
                for bucket in buckets {
                    bucket.postings.remove(hash);
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), BackendError> {
        let hash = self.guard.hash_of(key);
        for buckets in self.guard.postings.values_mut() {
            for bucket in buckets {
                bucket.postings.remove(hash);
            }
        }

        self.guard.keys.remove(key);
        if let Some(keys) = self.guard.hashes.get_mut(&hash) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.guard.hashes.remove(&hash);
            }
        }

        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), BackendError> {
        Ok(())
    }
}

impl StoreInner {
    fn buckets<'a>(
        &'a self,
        type_name: &str,
        path: &str,
    ) -> Box<dyn Iterator<Item = &'a ValueBucket> + 'a> {
        let full = format!("{type_name}.{path}");
        match self.postings.get(&full) {
            Some(buckets) => Box::new(buckets.iter()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn keys_for(&self, id: u64) -> &[String] {
        self.hashes.get(&id).map_or(&[], Vec::as_slice)
    }

    fn register(&mut self, key: &str, hash: u64) {
        self.keys.insert(key.to_string(), hash);
        let keys = self.hashes.entry(hash).or_default();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    /// Registered hash of a key, falling back to recomputation for keys
    /// the registry has never seen.
    fn hash_of(&self, key: &str) -> u64 {
        self.keys.get(key).copied().unwrap_or_else(|| key_hash(key))
    }
}

/// Full-name path of a descriptor chain:
/// `<root field full name>.<name>...`, e.g.
/// `test.Test.message_field.string_field`.
fn bucket_path(descriptors: &[Arc<FieldDescriptor>]) -> Option<String> {
    let (first, rest) = descriptors.split_first()?;
    let mut path = first.full_name().to_string();
    for fd in rest {
        path.push('.');
        path.push_str(fd.name());
    }
    Some(path)
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    path.len() > prefix.len()
        && path.starts_with(prefix)
        && path.as_bytes()[prefix.len()] == b'.'
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, SchemaRegistry};

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaRegistry::builder();
        builder
            .message("st.Rec")
            .field("name", 1, FieldKind::String)
            .field("name_ext", 2, FieldKind::String);
        builder.build().expect("schema builds")
    }

    fn name_chain() -> Vec<Arc<FieldDescriptor>> {
        vec![
            registry()
                .message("st.Rec")
                .expect("registered")
                .field("name")
                .expect("declared")
                .clone(),
        ]
    }

    #[test]
    fn key_hash_is_deterministic_and_spreads() {
        assert_eq!(key_hash("a"), key_hash("a"));
        assert_ne!(key_hash("a"), key_hash("b"));
    }

    #[test]
    fn add_groups_equal_values_into_one_bucket() {
        let store = MemoryStore::new();
        {
            let mut tx = store.write().expect("write tx");
            tx.add("k1", Value::String("x".into()), &name_chain())
                .expect("adds");
            tx.add("k2", Value::String("x".into()), &name_chain())
                .expect("adds");
            tx.add("k3", Value::String("y".into()), &name_chain())
                .expect("adds");
            tx.commit().expect("commits");
        }

        let tx = store.read().expect("read tx");
        let buckets: Vec<_> = tx.buckets("st.Rec", "name").collect();
        assert_eq!(buckets.len(), 2);
        let x = buckets
            .iter()
            .find(|b| b.value == Value::String("x".into()))
            .expect("x bucket");
        assert_eq!(x.postings.len(), 2);
    }

    #[test]
    fn remove_is_prefix_scoped_without_capturing_siblings() {
        let store = MemoryStore::new();
        let registry = registry();
        let rec = registry.message("st.Rec").expect("registered");
        let name = vec![rec.field("name").expect("declared").clone()];
        let name_ext = vec![rec.field("name_ext").expect("declared").clone()];

        {
            let mut tx = store.write().expect("write tx");
            tx.add("k", Value::String("x".into()), &name).expect("adds");
            tx.add("k", Value::String("x".into()), &name_ext)
                .expect("adds");
            tx.remove("k", "st.Rec.name").expect("removes");
            tx.commit().expect("commits");
        }

        let h = key_hash("k");
        let inner = store.inner.read();
        assert!(!inner.postings["st.Rec.name"][0].postings.contains(h));
        // The sibling path sharing the textual prefix is untouched.
        assert!(inner.postings["st.Rec.name_ext"][0].postings.contains(h));
    }

    #[test]
    fn clear_empties_postings_and_registry() {
        let store = MemoryStore::new();
        let h = key_hash("k");
        {
            let mut tx = store.write().expect("write tx");
            tx.add("k", Value::String("x".into()), &name_chain())
                .expect("adds");
            tx.clear("k").expect("clears");
            tx.commit().expect("commits");
        }

        let tx = store.read().expect("read tx");
        assert!(tx.keys_for(h).is_empty());
        assert!(
            tx.buckets("st.Rec", "name")
                .all(|b| !b.postings.contains(h))
        );
    }

    #[test]
    fn registry_reports_collision_candidates() {
        let store = MemoryStore::new();
        {
            let mut tx = store.write().expect("write tx");
            tx.add("k1", Value::String("x".into()), &name_chain())
                .expect("adds");
            tx.commit().expect("commits");
        }

        // Simulate a second key landing on the same hash.
        let h = key_hash("k1");
        store.inner.write().register("k1-collider", h);
        let tx = store.read().expect("read tx");
        assert_eq!(tx.keys_for(h).len(), 2);
    }
}
