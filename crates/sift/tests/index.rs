//! Index engine end-to-end: matcher/index agreement, bucket behavior,
//! update/remove lifecycles, cancellation, selective indexing, and
//! collision reporting through a store with a degenerate hash.

use sift::{
    cancel::CancelToken,
    expr::{Expression, where_},
    index::{
        BackendError, Hashed, Index, IndexError, PostingSet, PostingSetProvider, ReadTx, Store,
        ValueBucket, WriteTx,
    },
    matcher::Matcher,
    record::{Record, Value},
    schema::FieldDescriptor,
};
use sift_fixtures::{TEST, fields, test_record};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

fn ctx() -> CancelToken {
    CancelToken::new()
}

/// The population from the original engine test: a mix of strings,
/// numbers, bools, optionals, nested messages, and repeated fields.
fn population() -> Vec<Record> {
    let mut other = test_record();
    other.set(fields::STRING_FIELD, "other").expect("set");

    let mut whatever42 = test_record();
    whatever42.set(fields::STRING_FIELD, "whatever").expect("set");
    whatever42.set(fields::NUMBER_FIELD, 42i64).expect("set");

    let mut whatever43 = test_record();
    whatever43.set(fields::STRING_FIELD, "whatever").expect("set");
    whatever43.set(fields::NUMBER_FIELD, 43i64).expect("set");

    let mut flagged = test_record();
    flagged.set(fields::BOOL_FIELD, true).expect("set");

    let mut opted_out = test_record();
    opted_out
        .set(fields::OPTIONAL_BOOL_FIELD, false)
        .expect("set");

    let mut nested_inner = test_record();
    nested_inner.set(fields::STRING_FIELD, "whatever").expect("set");
    let mut nested = test_record();
    nested.set(fields::MESSAGE_FIELD, nested_inner).expect("set");

    let mut listed = test_record();
    listed
        .set_repeated(fields::REPEATED_STRING_FIELD, ["one"])
        .expect("set");

    vec![
        other,
        whatever42,
        whatever43,
        flagged,
        opted_out,
        nested,
        listed,
        test_record(),
    ]
}

fn engine_expression() -> Expression {
    where_(fields::STRING_FIELD)
        .string_equals("whatever")
        .and_where(fields::NUMBER_FIELD)
        .number_in([42.0, 43.0])
        .or(where_(fields::BOOL_FIELD).is_true())
        .or(where_(fields::OPTIONAL_BOOL_FIELD).is_false())
        .or(where_("message_field.string_field").string_equals("whatever"))
        .or(where_(fields::REPEATED_STRING_FIELD).string_in(["one", "two"]))
        .build()
}

/// Resolve a find against the matcher: unambiguous keys are trusted,
/// collision candidates are re-verified record by record.
fn resolve(
    index: &Index,
    records: &HashMap<String, Record>,
    expr: &Expression,
) -> Vec<String> {
    let matcher = Matcher::new();
    let found = index.find(&ctx(), TEST, expr).expect("find succeeds");
    let mut keys = found.keys;
    for candidate in found.collisions {
        let record = &records[&candidate];
        if matcher.match_record(record, expr).expect("match succeeds") {
            keys.push(candidate);
        }
    }
    keys.sort();
    keys
}

#[test]
fn find_agrees_with_matcher_over_mixed_population() {
    let index = Index::new();
    let matcher = Matcher::new();
    let expr = engine_expression();

    let mut records = HashMap::new();
    let mut expected = Vec::new();
    for (i, record) in population().into_iter().enumerate() {
        let key = format!("rec-{i}");
        index.insert(&ctx(), &key, &record).expect("insert succeeds");
        if matcher.match_record(&record, &expr).expect("match succeeds") {
            expected.push(key.clone());
        }
        records.insert(key, record);
    }
    expected.sort();

    assert_eq!(expected.len(), 6);
    assert_eq!(resolve(&index, &records, &expr), expected);
}

#[test]
fn population_split_finds_exactly_one_side() {
    let index = Index::new();
    let mut records = HashMap::new();
    let mut expected = Vec::new();

    for i in 0..10_000 {
        let key = format!("key-{i:05}");
        let mut record = test_record();
        let value = if i % 2 == 0 { "a" } else { "b" };
        record.set(fields::STRING_FIELD, value).expect("set");
        index.insert(&ctx(), &key, &record).expect("insert succeeds");
        if i % 2 == 0 {
            expected.push(key.clone());
        }
        records.insert(key, record);
    }

    let expr = where_(fields::STRING_FIELD).string_equals("a").build();
    let keys = resolve(&index, &records, &expr);
    assert_eq!(keys.len(), 5_000);
    assert_eq!(keys, expected);
}

#[test]
fn unknown_field_paths_yield_empty_results() {
    let index = Index::new();
    let mut record = test_record();
    record.set(fields::STRING_FIELD, "x").expect("set");
    index.insert(&ctx(), "k", &record).expect("insert succeeds");

    // The index never saw this path; unlike the matcher this is not an
    // error.
    let expr = where_("never_indexed").string_equals("x").build();
    let found = index.find(&ctx(), TEST, &expr).expect("find succeeds");
    assert!(found.keys.is_empty());
    assert!(found.collisions.is_empty());
}

#[test]
fn remove_drops_a_key_from_every_posting() {
    let index = Index::new();
    let mut record = test_record();
    record.set(fields::STRING_FIELD, "x").expect("set");
    record.set(fields::NUMBER_FIELD, 9i64).expect("set");
    index.insert(&ctx(), "gone", &record).expect("insert succeeds");
    index.insert(&ctx(), "kept", &record).expect("insert succeeds");

    index.remove(&ctx(), "gone").expect("remove succeeds");

    let expr = where_(fields::STRING_FIELD).string_equals("x").build();
    let found = index.find(&ctx(), TEST, &expr).expect("find succeeds");
    assert_eq!(found.keys, vec!["kept".to_string()]);
}

#[test]
fn update_moves_a_key_between_buckets() {
    let index = Index::new();
    let mut record = test_record();
    record.set(fields::STRING_FIELD, "before").expect("set");
    index.insert(&ctx(), "k", &record).expect("insert succeeds");

    record.set(fields::STRING_FIELD, "after").expect("set");
    index.update(&ctx(), "k", &record).expect("update succeeds");

    let before = where_(fields::STRING_FIELD).string_equals("before").build();
    assert!(
        index
            .find(&ctx(), TEST, &before)
            .expect("find succeeds")
            .keys
            .is_empty()
    );
    let after = where_(fields::STRING_FIELD).string_equals("after").build();
    assert_eq!(
        index.find(&ctx(), TEST, &after).expect("find succeeds").keys,
        vec!["k".to_string()]
    );
}

#[test]
fn update_reaches_nested_paths() {
    let index = Index::new();
    let mut inner = test_record();
    inner.set(fields::STRING_FIELD, "old").expect("set");
    let mut record = test_record();
    record.set(fields::MESSAGE_FIELD, inner).expect("set");
    index.insert(&ctx(), "k", &record).expect("insert succeeds");

    let mut inner = test_record();
    inner.set(fields::STRING_FIELD, "new").expect("set");
    record.set(fields::MESSAGE_FIELD, inner).expect("set");
    index.update(&ctx(), "k", &record).expect("update succeeds");

    let old = where_("message_field.string_field").string_equals("old").build();
    assert!(
        index
            .find(&ctx(), TEST, &old)
            .expect("find succeeds")
            .keys
            .is_empty()
    );
    let new = where_("message_field.string_field").string_equals("new").build();
    assert_eq!(
        index.find(&ctx(), TEST, &new).expect("find succeeds").keys,
        vec!["k".to_string()]
    );
}

#[test]
fn absent_optionals_are_posted_for_negated_predicates() {
    let index = Index::new();
    let with = {
        let mut r = test_record();
        r.set(fields::OPTIONAL_STRING_FIELD, "set").expect("set");
        r
    };
    let without = test_record();
    index.insert(&ctx(), "with", &with).expect("insert succeeds");
    index
        .insert(&ctx(), "without", &without)
        .expect("insert succeeds");

    let expr = where_(fields::OPTIONAL_STRING_FIELD).null().build();
    assert_eq!(
        index.find(&ctx(), TEST, &expr).expect("find succeeds").keys,
        vec!["without".to_string()]
    );

    let expr = where_(fields::OPTIONAL_STRING_FIELD)
        .string_not_equals("set")
        .build();
    assert_eq!(
        index.find(&ctx(), TEST, &expr).expect("find succeeds").keys,
        vec!["without".to_string()]
    );
}

#[test]
fn bad_regex_aborts_find_with_no_partial_result() {
    let index = Index::new();
    let mut record = test_record();
    record.set(fields::STRING_FIELD, "x").expect("set");
    index.insert(&ctx(), "k", &record).expect("insert succeeds");

    let expr = where_(fields::STRING_FIELD).string_regex("([").build();
    let err = index.find(&ctx(), TEST, &expr).expect_err("aborts");
    assert!(matches!(
        err,
        IndexError::Match(sift::reflect::MatchError::BadRegex(_))
    ));
}

#[test]
fn cancellation_aborts_operations() {
    let token = CancelToken::new();
    token.cancel();

    let index = Index::new();
    let record = test_record();
    let err = index.insert(&token, "k", &record).expect_err("cancelled");
    assert!(matches!(err, IndexError::Cancelled));

    let err = index.remove(&token, "k").expect_err("cancelled");
    assert!(matches!(err, IndexError::Cancelled));
}

#[test]
fn should_index_excludes_chains_but_not_descendants() {
    // Exclude the top-level string field; keep everything else,
    // including the same field nested under message_field.
    let index = Index::new().should_index(|_, chain| {
        !(chain.len() == 1 && chain[0].name() == fields::STRING_FIELD)
    });

    let mut inner = test_record();
    inner.set(fields::STRING_FIELD, "hit").expect("set");
    let mut record = test_record();
    record.set(fields::STRING_FIELD, "hit").expect("set");
    record.set(fields::MESSAGE_FIELD, inner).expect("set");
    index.insert(&ctx(), "k", &record).expect("insert succeeds");

    let top = where_(fields::STRING_FIELD).string_equals("hit").build();
    assert!(
        index
            .find(&ctx(), TEST, &top)
            .expect("find succeeds")
            .keys
            .is_empty()
    );

    let nested = where_("message_field.string_field")
        .string_equals("hit")
        .build();
    assert_eq!(
        index
            .find(&ctx(), TEST, &nested)
            .expect("find succeeds")
            .keys,
        vec!["k".to_string()]
    );
}

// ---- collision reporting through a degenerate-hash store -------------

/// A store whose every key lands on one hash bucket. Structurally the
/// same shape as the in-memory store, but collisions are guaranteed, so
/// every find reports candidates instead of keys.
struct CollidingStore {
    provider: Arc<dyn PostingSetProvider>,
    inner: RwLock<CollidingState>,
}

#[derive(Default)]
struct CollidingState {
    postings: HashMap<String, Vec<ValueBucket>>,
    keys: Vec<String>,
}

const THE_HASH: u64 = 7;

impl CollidingStore {
    fn new() -> Self {
        Self {
            provider: Arc::new(Hashed),
            inner: RwLock::new(CollidingState::default()),
        }
    }
}

impl Store for CollidingStore {
    fn read(&self) -> Result<Box<dyn ReadTx + '_>, BackendError> {
        Ok(Box::new(CollidingReadTx {
            guard: self.inner.read().map_err(|_| "poisoned lock")?,
        }))
    }

    fn write(&self) -> Result<Box<dyn WriteTx + '_>, BackendError> {
        Ok(Box::new(CollidingWriteTx {
            guard: self.inner.write().map_err(|_| "poisoned lock")?,
            provider: self.provider.clone(),
        }))
    }

    fn posting_sets(&self) -> Arc<dyn PostingSetProvider> {
        self.provider.clone()
    }
}

struct CollidingReadTx<'a> {
    guard: std::sync::RwLockReadGuard<'a, CollidingState>,
}

impl ReadTx for CollidingReadTx<'_> {
    fn buckets<'a>(
        &'a self,
        type_name: &str,
        path: &str,
    ) -> Box<dyn Iterator<Item = &'a ValueBucket> + 'a> {
        match self.guard.postings.get(&format!("{type_name}.{path}")) {
            Some(buckets) => Box::new(buckets.iter()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn keys_for(&self, id: u64) -> &[String] {
        if id == THE_HASH {
            &self.guard.keys
        } else {
            &[]
        }
    }
}

struct CollidingWriteTx<'a> {
    guard: std::sync::RwLockWriteGuard<'a, CollidingState>,
    provider: Arc<dyn PostingSetProvider>,
}

impl WriteTx for CollidingWriteTx<'_> {
    fn add(
        &mut self,
        key: &str,
        value: Value,
        descriptors: &[Arc<FieldDescriptor>],
    ) -> Result<(), BackendError> {
        let Some(first) = descriptors.first() else {
            return Ok(());
        };
        let mut path = first.full_name().to_string();
        for fd in &descriptors[1..] {
            path.push('.');
            path.push_str(fd.name());
        }
        if !self.guard.keys.iter().any(|k| k == key) {
            self.guard.keys.push(key.to_string());
        }

        let buckets = self.guard.postings.entry(path).or_default();
        if let Some(bucket) = buckets.iter_mut().find(|b| b.value == value) {
            bucket.postings.set(THE_HASH);
        } else {
            let mut postings = self.provider.new_set();
            postings.set(THE_HASH);
            buckets.push(ValueBucket {
                value,
                descriptors: descriptors.to_vec(),
                postings,
            });
        }
        Ok(())
    }

    fn remove(&mut self, _key: &str, _prefix: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn clear(&mut self, _key: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), BackendError> {
        Ok(())
    }
}

#[test]
fn collisions_are_reported_for_caller_verification() {
    let index = Index::with_store(Arc::new(CollidingStore::new()));
    let matcher = Matcher::new();

    let mut a = test_record();
    a.set(fields::STRING_FIELD, "a").expect("set");
    let mut b = test_record();
    b.set(fields::STRING_FIELD, "b").expect("set");
    index.insert(&ctx(), "key-a", &a).expect("insert succeeds");
    index.insert(&ctx(), "key-b", &b).expect("insert succeeds");

    let expr = where_(fields::STRING_FIELD).string_equals("a").build();
    let found = index.find(&ctx(), TEST, &expr).expect("find succeeds");

    // Both keys share the hash, so neither is unambiguous.
    assert!(found.keys.is_empty());
    assert_eq!(found.collisions.len(), 2);

    let mut records = HashMap::new();
    records.insert("key-a".to_string(), a);
    records.insert("key-b".to_string(), b);
    let verified: Vec<String> = found
        .collisions
        .into_iter()
        .filter(|k| {
            matcher
                .match_record(&records[k], &expr)
                .expect("match succeeds")
        })
        .collect();
    assert_eq!(verified, vec!["key-a".to_string()]);
}
