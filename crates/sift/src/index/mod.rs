//! Module: index
//! Responsibility: the indexing pipeline over records and
//! population-wide find as posting-set algebra, with collision reporting.
//! Does not own: per-record matching (matcher) or predicate semantics
//! (reflect).

mod posting;
mod store;

pub use posting::{Hashed, Ordered, PostingSet, PostingSetProvider, Roaring};
pub use store::{BackendError, MemoryStore, ReadTx, Store, ValueBucket, WriteTx, key_hash};

use crate::{
    cancel::CancelToken,
    expr::{Expression, FieldFilter},
    record::{FieldValue, Record, Value, wrapper},
    reflect::{MatchError, match_value},
    schema::FieldDescriptor,
};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// IndexError
///

#[derive(Debug, ThisError)]
pub enum IndexError {
    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for IndexError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

///
/// FindResult
///
/// `keys` resolved unambiguously; `collisions` are candidates whose
/// 64-bit hash is shared by several keys and must be re-verified against
/// the matcher before being trusted.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FindResult {
    pub keys: Vec<String>,
    pub collisions: Vec<String>,
}

/// Per-chain inclusion predicate: `(message full name, descriptor chain)`.
/// Excluded fields still have their sub-messages walked, so descendants
/// may be indexed independently.
pub type ShouldIndex = dyn Fn(&str, &[Arc<FieldDescriptor>]) -> bool + Send + Sync;

///
/// Index
///
/// Ingests records into posting lists and answers expressions over the
/// whole population. Every operation opens exactly one store
/// transaction.
///

pub struct Index {
    store: Arc<dyn Store>,
    should_index: Option<Box<ShouldIndex>>,
}

impl Index {
    /// In-memory index over the default store, indexing every field.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    #[must_use]
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            should_index: None,
        }
    }

    /// Restrict indexing to chains the predicate accepts.
    #[must_use]
    pub fn should_index(
        mut self,
        predicate: impl Fn(&str, &[Arc<FieldDescriptor>]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_index = Some(Box::new(predicate));
        self
    }

    /// Insert and index a record under the given key.
    pub fn insert(&self, ctx: &CancelToken, key: &str, record: &Record) -> Result<(), IndexError> {
        let mut tx = self.store.write()?;
        let mut chain = Vec::new();
        self.index_record(ctx, tx.as_mut(), key, record, &mut chain)?;
        tx.commit()?;
        tracing::debug!(key, record = record.descriptor().full_name(), "indexed");
        Ok(())
    }

    /// Re-index a record: postings under each non-list top-level field
    /// are dropped for this key, then the record is indexed afresh.
    pub fn update(&self, ctx: &CancelToken, key: &str, record: &Record) -> Result<(), IndexError> {
        let mut tx = self.store.write()?;
        for fd in record.descriptor().fields() {
            check(ctx)?;
            if !fd.is_list() {
                tx.remove(key, fd.full_name())?;
            }
        }
        let mut chain = Vec::new();
        self.index_record(ctx, tx.as_mut(), key, record, &mut chain)?;
        tx.commit()?;
        tracing::debug!(key, record = record.descriptor().full_name(), "reindexed");
        Ok(())
    }

    /// Remove the key from every posting and from the hash registry.
    pub fn remove(&self, ctx: &CancelToken, key: &str) -> Result<(), IndexError> {
        check(ctx)?;
        let mut tx = self.store.write()?;
        tx.clear(key)?;
        tx.commit()?;
        tracing::debug!(key, "removed from index");
        Ok(())
    }

    /// Answer an expression over all indexed records of a type.
    ///
    /// A leaf whose path has no posting matches nothing; the index may
    /// simply never have seen that field. Predicate errors (such as a bad
    /// regex) abort the find with no partial result.
    pub fn find(
        &self,
        ctx: &CancelToken,
        type_name: &str,
        expr: &Expression,
    ) -> Result<FindResult, IndexError> {
        let tx = self.store.read()?;
        let provider = self.store.posting_sets();
        let matched = self.find_expr(ctx, tx.as_ref(), provider.as_ref(), type_name, expr)?;

        let mut result = FindResult::default();
        for id in matched.iter() {
            let keys = tx.keys_for(id);
            match keys {
                [] => {}
                [key] => result.keys.push(key.clone()),
                keys => result.collisions.extend(keys.iter().cloned()),
            }
        }
        tracing::debug!(
            type_name,
            keys = result.keys.len(),
            collisions = result.collisions.len(),
            "find complete"
        );

        Ok(result)
    }

    fn included(&self, message: &str, chain: &[Arc<FieldDescriptor>]) -> bool {
        self.should_index
            .as_ref()
            .is_none_or(|predicate| predicate(message, chain))
    }

    fn index_record(
        &self,
        ctx: &CancelToken,
        tx: &mut dyn WriteTx,
        key: &str,
        record: &Record,
        chain: &mut Vec<Arc<FieldDescriptor>>,
    ) -> Result<(), IndexError> {
        let message = record.descriptor().full_name();
        for fd in record.descriptor().fields() {
            check(ctx)?;
            chain.push(fd.clone());
            let include = self.included(message, chain);

            if fd.is_map() {
                // Maps are opaque to the index.
                chain.pop();
                continue;
            }

            if fd.is_list() {
                let elements = match record.get(fd) {
                    Some(FieldValue::Repeated(elements)) => elements.as_slice(),
                    _ => &[],
                };
                if fd.kind().is_message() && fd.well_known().is_none() {
                    // Lists of messages are recursed into, not indexed as
                    // values.
                    for element in elements {
                        if let Value::Message(m) = element {
                            self.index_record(ctx, tx, key, m, chain)?;
                        }
                    }
                } else if include {
                    for element in elements {
                        tx.add(key, wrapper::unwrap_element(element, fd), chain)?;
                    }
                }
                chain.pop();
                continue;
            }

            if fd.kind().is_message() && fd.well_known().is_none() {
                // Even when excluded, descend so nested chains get their
                // own say.
                if let Some(FieldValue::Singular(Value::Message(m))) = record.get(fd) {
                    self.index_record(ctx, tx, key, m, chain)?;
                }
                chain.pop();
                continue;
            }

            if include {
                // Scalars and well-known wrappers post their extracted
                // value; absence posts `Null` so negated and null
                // predicates can still match.
                tx.add(key, record.extract(fd), chain)?;
            }
            chain.pop();
        }

        Ok(())
    }

    fn find_expr(
        &self,
        ctx: &CancelToken,
        tx: &dyn ReadTx,
        provider: &dyn PostingSetProvider,
        type_name: &str,
        expr: &Expression,
    ) -> Result<Box<dyn PostingSet>, IndexError> {
        let mut acc = self.find_leaf(ctx, tx, provider, type_name, &expr.condition)?;
        for child in &expr.and_exprs {
            let sub = self.find_expr(ctx, tx, provider, type_name, child)?;
            acc.and(sub.as_ref());
        }
        for child in &expr.or_exprs {
            let sub = self.find_expr(ctx, tx, provider, type_name, child)?;
            acc.or(sub.as_ref());
        }
        Ok(acc)
    }

    fn find_leaf(
        &self,
        ctx: &CancelToken,
        tx: &dyn ReadTx,
        provider: &dyn PostingSetProvider,
        type_name: &str,
        ff: &FieldFilter,
    ) -> Result<Box<dyn PostingSet>, IndexError> {
        let mut acc = provider.with_capacity(1024);
        for bucket in tx.buckets(type_name, &ff.field) {
            check(ctx)?;
            let Some(fd) = bucket.descriptors.last() else {
                continue;
            };
            if match_value(&bucket.value, fd, &ff.filter)? {
                acc.or(bucket.postings.as_ref());
            }
        }
        Ok(acc)
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

fn check(ctx: &CancelToken) -> Result<(), IndexError> {
    if ctx.is_cancelled() {
        return Err(IndexError::Cancelled);
    }
    Ok(())
}
