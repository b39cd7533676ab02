//! Module: index::posting
//! Responsibility: the pluggable posting-set abstraction (sets of 64-bit
//! key hashes) and its three reference implementations.
//! Does not own: bucket layout or the key-hash registry (store).

use roaring::RoaringTreemap;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

///
/// PostingSet
///
/// A set of 64-bit ids with in-place intersection/union. `and`/`or`
/// accept any implementation; combining across implementations works
/// through `contains`/`iter`.
///

pub trait PostingSet: fmt::Debug + Send + Sync {
    fn set(&mut self, id: u64);
    fn remove(&mut self, id: u64);
    fn contains(&self, id: u64) -> bool;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Intersect in place.
    fn and(&mut self, other: &dyn PostingSet);

    /// Union in place.
    fn or(&mut self, other: &dyn PostingSet);

    /// Contained ids, in implementation order.
    fn iter(&self) -> Box<dyn Iterator<Item = u64> + '_>;

    /// Serialize as contiguous little-endian u64s. Ordering is
    /// unspecified but deterministic within one call; duplicates never
    /// occur.
    fn bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len() * 8);
        for id in self.iter() {
            buf.extend_from_slice(&id.to_le_bytes());
        }
        buf
    }
}

///
/// PostingSetProvider
///
/// Factory injected into stores; selection trades memory for query
/// speed. The compressed bitmap is the default for large populations,
/// the hashed set is faster for small record counts.
///

pub trait PostingSetProvider: Send + Sync {
    fn new_set(&self) -> Box<dyn PostingSet>;
    fn with_capacity(&self, capacity: usize) -> Box<dyn PostingSet>;
    fn from_bytes(&self, buf: &[u8]) -> Box<dyn PostingSet>;
}

fn decode_ids(buf: &[u8]) -> impl Iterator<Item = u64> + '_ {
    buf.chunks_exact(8).map(|chunk| {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        u64::from_le_bytes(raw)
    })
}

fn intersect(target: &mut dyn PostingSet, other: &dyn PostingSet) {
    let gone: Vec<u64> = target.iter().filter(|id| !other.contains(*id)).collect();
    for id in gone {
        target.remove(id);
    }
}

fn union(target: &mut dyn PostingSet, other: &dyn PostingSet) {
    for id in other.iter() {
        target.set(id);
    }
}

///
/// Hashed
///
/// Hash-set provider.
///

pub struct Hashed;

#[derive(Debug, Default)]
struct HashedSet(HashSet<u64>);

impl PostingSetProvider for Hashed {
    fn new_set(&self) -> Box<dyn PostingSet> {
        Box::new(HashedSet(HashSet::new()))
    }

    fn with_capacity(&self, capacity: usize) -> Box<dyn PostingSet> {
        Box::new(HashedSet(HashSet::with_capacity(capacity)))
    }

    fn from_bytes(&self, buf: &[u8]) -> Box<dyn PostingSet> {
        Box::new(HashedSet(decode_ids(buf).collect()))
    }
}

impl PostingSet for HashedSet {
    fn set(&mut self, id: u64) {
        self.0.insert(id);
    }

    fn remove(&mut self, id: u64) {
        self.0.remove(&id);
    }

    fn contains(&self, id: u64) -> bool {
        self.0.contains(&id)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn and(&mut self, other: &dyn PostingSet) {
        intersect(self, other);
    }

    fn or(&mut self, other: &dyn PostingSet) {
        union(self, other);
    }

    fn iter(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.0.iter().copied())
    }
}

///
/// Roaring
///
/// Compressed-bitmap provider, the default.
///

pub struct Roaring;

#[derive(Debug, Default)]
struct RoaringSet(RoaringTreemap);

impl PostingSetProvider for Roaring {
    fn new_set(&self) -> Box<dyn PostingSet> {
        Box::new(RoaringSet(RoaringTreemap::new()))
    }

    fn with_capacity(&self, _capacity: usize) -> Box<dyn PostingSet> {
        self.new_set()
    }

    fn from_bytes(&self, buf: &[u8]) -> Box<dyn PostingSet> {
        Box::new(RoaringSet(decode_ids(buf).collect()))
    }
}

impl PostingSet for RoaringSet {
    fn set(&mut self, id: u64) {
        self.0.insert(id);
    }

    fn remove(&mut self, id: u64) {
        self.0.remove(id);
    }

    fn contains(&self, id: u64) -> bool {
        self.0.contains(id)
    }

    #[expect(clippy::cast_possible_truncation)]
    fn len(&self) -> usize {
        self.0.len() as usize
    }

    fn and(&mut self, other: &dyn PostingSet) {
        intersect(self, other);
    }

    fn or(&mut self, other: &dyn PostingSet) {
        union(self, other);
    }

    fn iter(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.0.iter())
    }
}

///
/// Ordered
///
/// Ordered-set provider; serialization is ascending.
///

pub struct Ordered;

#[derive(Debug, Default)]
struct OrderedSet(BTreeSet<u64>);

impl PostingSetProvider for Ordered {
    fn new_set(&self) -> Box<dyn PostingSet> {
        Box::new(OrderedSet(BTreeSet::new()))
    }

    fn with_capacity(&self, _capacity: usize) -> Box<dyn PostingSet> {
        self.new_set()
    }

    fn from_bytes(&self, buf: &[u8]) -> Box<dyn PostingSet> {
        Box::new(OrderedSet(decode_ids(buf).collect()))
    }
}

impl PostingSet for OrderedSet {
    fn set(&mut self, id: u64) {
        self.0.insert(id);
    }

    fn remove(&mut self, id: u64) {
        self.0.remove(&id);
    }

    fn contains(&self, id: u64) -> bool {
        self.0.contains(&id)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn and(&mut self, other: &dyn PostingSet) {
        intersect(self, other);
    }

    fn or(&mut self, other: &dyn PostingSet) {
        union(self, other);
    }

    fn iter(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.0.iter().copied())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn providers() -> Vec<(&'static str, Box<dyn PostingSetProvider>)> {
        vec![
            ("hashed", Box::new(Hashed)),
            ("roaring", Box::new(Roaring)),
            ("ordered", Box::new(Ordered)),
        ]
    }

    #[test]
    fn algebra_is_set_intersection_and_union() {
        for (name, provider) in providers() {
            let mut a = provider.new_set();
            let mut b = provider.new_set();
            for id in [1u64, 2, 3, u64::MAX] {
                a.set(id);
            }
            for id in [2u64, 3, 4] {
                b.set(id);
            }

            let mut i = provider.from_bytes(&a.bytes());
            i.and(&*b);
            let mut got: Vec<u64> = i.iter().collect();
            got.sort_unstable();
            assert_eq!(got, vec![2, 3], "{name} intersection");

            a.or(&*b);
            let mut got: Vec<u64> = a.iter().collect();
            got.sort_unstable();
            assert_eq!(got, vec![1, 2, 3, 4, u64::MAX], "{name} union");
        }
    }

    #[test]
    fn serialization_round_trips_disjoint_unions() {
        for (name, provider) in providers() {
            let mut a = provider.new_set();
            let mut b = provider.new_set();
            for id in [10u64, 20] {
                a.set(id);
            }
            for id in [30u64, 40] {
                b.set(id);
            }
            a.or(&*b);

            let restored = provider.from_bytes(&a.bytes());
            let mut got: Vec<u64> = restored.iter().collect();
            got.sort_unstable();
            assert_eq!(got, vec![10, 20, 30, 40], "{name} round trip");
            assert_eq!(restored.len(), 4, "{name} length");
        }
    }

    #[test]
    fn duplicates_collapse_and_removal_works() {
        for (name, provider) in providers() {
            let mut s = provider.new_set();
            s.set(7);
            s.set(7);
            assert_eq!(s.len(), 1, "{name} dedup");
            s.remove(7);
            assert!(s.is_empty(), "{name} removal");
            assert!(!s.contains(7), "{name} contains after removal");
        }
    }

    #[test]
    fn mixed_implementations_combine() {
        let mut roaring = Roaring.new_set();
        roaring.set(1);
        roaring.set(2);
        let mut hashed = Hashed.new_set();
        hashed.set(2);
        hashed.set(3);

        roaring.and(&*hashed);
        let got: Vec<u64> = roaring.iter().collect();
        assert_eq!(got, vec![2]);
    }

    #[test]
    fn wire_layout_is_little_endian_u64s() {
        let mut s = Ordered.new_set();
        s.set(0x0102_0304_0506_0708);
        assert_eq!(s.bytes(), vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }
}
