use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    iter, mem, slice,
};

use crate::{
    config::MapConfig,
    engine::{EngineKind, delegate_map_engine},
    error::{MapError, Result},
    hashing::{DefaultHashBuilder, make_hash, reduce},
};

/// A bucket containing a key-value pair
#[derive(Debug, Clone)]
struct Bucket<K, V> {
    /// The key in the key-value pair
    key: K,
    /// The value associated with the key
    value: V,
    /// Probe sequence length: distance from the ideal slot of `key`
    psl: usize,
}

/// Builds `capacity` empty slots
fn empty_slots<K, V>(capacity: usize) -> Vec<Option<Bucket<K, V>>> {
    iter::repeat_with(|| None).take(capacity).collect()
}

/// A hash table using Robin Hood linear probing.
///
/// Every entry remembers how far it sits from its ideal slot (its PSL). An insertion
/// that meets a resident closer to home than itself takes the resident's slot and
/// carries the resident onward, which keeps the longest probe short. Lookups stop as
/// soon as they meet a resident with a shorter PSL than the distance walked so far.
///
/// Removal shifts the following entries of the run one slot back instead of leaving a
/// tombstone. The slot count doubles once the number of entries exceeds
/// `floor(capacity * load_factor)`.
#[derive(Debug, Clone)]
pub struct RobinHoodMap<K, V, S = DefaultHashBuilder> {
    /// The slots storing the key-value pairs
    slots: Vec<Option<Bucket<K, V>>>,
    /// Current number of elements in the hash table
    size: usize,
    /// Configured load factor
    load_factor: f64,
    /// Builds the hasher used for slot selection
    hash_builder: S,
}

impl<K, V> RobinHoodMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map with 32 slots and load factor 0.75
    #[must_use]
    pub fn new() -> Self {
        Self::with_config_and_hasher(MapConfig::default(), DefaultHashBuilder::default())
    }

    /// Creates an empty map with `capacity` slots and the default load factor
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidArgument`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self::with_config_and_hasher(
            MapConfig::with_capacity(capacity)?,
            DefaultHashBuilder::default(),
        ))
    }

    /// Creates an empty map with `capacity` slots that grows past `load_factor`
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidArgument`] if `capacity` is zero or `load_factor` is outside `(0, 1)`.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f64) -> Result<Self> {
        Ok(Self::with_config_and_hasher(
            MapConfig::new(capacity, load_factor)?,
            DefaultHashBuilder::default(),
        ))
    }
}

impl<K, V, S> Default for RobinHoodMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Extend<(K, V)> for RobinHoodMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for RobinHoodMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> RobinHoodMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates an empty map with default parameters using `hash_builder` to hash keys
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_config_and_hasher(MapConfig::default(), hash_builder)
    }

    /// Creates an empty map from a validated configuration
    pub fn with_config_and_hasher(config: MapConfig, hash_builder: S) -> Self {
        Self {
            slots: empty_slots(config.capacity()),
            size: 0,
            load_factor: config.load_factor(),
            hash_builder,
        }
    }

    /// Ideal slot of `key`
    fn ideal_slot<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        reduce(make_hash(&self.hash_builder, key), self.slots.len())
    }

    /// Slot following `index`
    #[allow(clippy::arithmetic_side_effects)]
    fn next_slot(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }

    /// Index of the slot holding `key`
    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.size == 0 {
            return None;
        }

        let mut index = self.ideal_slot(key);
        for distance in 0..self.slots.len() {
            let bucket = self.slots.get(index)?.as_ref()?;
            // a resident closer to home than we are proves the key was never placed further on
            if bucket.psl < distance {
                return None;
            }
            if bucket.key.borrow() == key {
                return Some(index);
            }
            index = self.next_slot(index);
        }
        None
    }

    /// Inserts a key-value pair, returning the previous value of an existing key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut index = self.ideal_slot(&key);
        let mut incoming = Bucket { key, value, psl: 0 };
        // once the caller's entry has been placed we carry an evicted resident, whose key
        // cannot appear again further along
        let mut displaced = false;

        for _ in 0..self.slots.len() {
            let Some(slot) = self.slots.get_mut(index) else { break };
            match slot {
                None => {
                    *slot = Some(incoming);
                    self.size = self.size.saturating_add(1);
                    if self.size > self.threshold() {
                        self.grow();
                    }
                    return None;
                }
                Some(resident) => {
                    if !displaced && resident.key == incoming.key {
                        return Some(mem::replace(&mut resident.value, incoming.value));
                    }
                    if resident.psl < incoming.psl {
                        mem::swap(resident, &mut incoming);
                        displaced = true;
                    }
                }
            }
            incoming.psl = incoming.psl.saturating_add(1);
            index = self.next_slot(index);
        }

        // no empty slot left, which the growth policy rules out
        self.grow();
        self.insert(incoming.key, incoming.value)
    }

    /// Places an entry known to be absent, without checking the growth threshold
    fn place(&mut self, key: K, value: V) {
        let mut index = self.ideal_slot(&key);
        let mut incoming = Bucket { key, value, psl: 0 };

        for _ in 0..self.slots.len() {
            let Some(slot) = self.slots.get_mut(index) else { return };
            match slot {
                None => {
                    *slot = Some(incoming);
                    self.size = self.size.saturating_add(1);
                    return;
                }
                Some(resident) => {
                    if resident.psl < incoming.psl {
                        mem::swap(resident, &mut incoming);
                    }
                }
            }
            incoming.psl = incoming.psl.saturating_add(1);
            index = self.next_slot(index);
        }
    }

    /// Retrieves the value stored under `key`
    ///
    /// # Errors
    ///
    /// [`MapError::KeyNotFound`] if the key is absent.
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key)
            .and_then(|index| self.slots.get(index))
            .and_then(Option::as_ref)
            .map(|bucket| &bucket.value)
            .ok_or(MapError::KeyNotFound)
    }

    /// Retrieves a mutable reference to the value stored under `key`
    ///
    /// # Errors
    ///
    /// [`MapError::KeyNotFound`] if the key is absent.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key).ok_or(MapError::KeyNotFound)?;
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .map(|bucket| &mut bucket.value)
            .ok_or(MapError::KeyNotFound)
    }

    /// Removes `key` from the map, shifting the rest of its probe run one slot back
    ///
    /// # Errors
    ///
    /// [`MapError::KeyNotFound`] if the key is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut hole = self.find(key).ok_or(MapError::KeyNotFound)?;
        let removed = self
            .slots
            .get_mut(hole)
            .and_then(Option::take)
            .ok_or(MapError::KeyNotFound)?;
        self.size = self.size.saturating_sub(1);

        for _ in 1..self.slots.len() {
            let next = self.next_slot(hole);
            let shifted = match self.slots.get_mut(next) {
                Some(slot) if slot.as_ref().is_some_and(|bucket| bucket.psl > 0) => slot.take(),
                _ => None,
            };
            let Some(mut bucket) = shifted else { break };
            bucket.psl = bucket.psl.saturating_sub(1);
            if let Some(slot) = self.slots.get_mut(hole) {
                *slot = Some(bucket);
            }
            hole = next;
        }

        Ok(removed.value)
    }

    /// Returns true if the map contains `key`
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes every entry, keeping the current slot count
    pub fn clear(&mut self) {
        log::trace!("clearing robin hood map with {} entries", self.size);
        for slot in &mut self.slots {
            *slot = None;
        }
        self.size = 0;
    }

    /// Returns the number of elements in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the configured load factor
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns the longest probe sequence length among the stored entries
    #[must_use]
    pub fn max_psl(&self) -> usize {
        self.slots.iter().flatten().map(|bucket| bucket.psl).max().unwrap_or(0)
    }

    /// Number of entries above which the table grows
    fn threshold(&self) -> usize {
        crate::config::threshold(self.slots.len(), self.load_factor)
    }

    /// Doubles the slot count and reinserts every entry with a fresh PSL
    fn grow(&mut self) {
        let new_capacity = self.slots.len().saturating_mul(2);
        log::debug!(
            "growing robin hood map from {} to {} slots at {} entries (max psl {})",
            self.slots.len(),
            new_capacity,
            self.size,
            self.max_psl()
        );

        let old = mem::replace(&mut self.slots, empty_slots(new_capacity));
        self.size = 0;
        for bucket in old.into_iter().flatten() {
            self.place(bucket.key, bucket.value);
        }
    }

    /// Returns an iterator over the key-value pairs in arbitrary order
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { slots: self.slots.iter() }
    }
}

delegate_map_engine!(RobinHoodMap, EngineKind::RobinHood);

/// Iterator over the key-value pairs of a [`RobinHoodMap`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Remaining slots
    slots: slice::Iter<'a, Option<Bucket<K, V>>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(|slot| slot.as_ref().map(|bucket| (&bucket.key, &bucket.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::BuildIdentityHasher;

    /// Map with integer keys hashing to themselves
    fn identity_map(capacity: usize) -> RobinHoodMap<i32, i32, BuildIdentityHasher> {
        RobinHoodMap::with_config_and_hasher(
            MapConfig::with_capacity(capacity).unwrap(),
            BuildIdentityHasher::default(),
        )
    }

    /// Key and PSL of slot `index`
    fn resident(map: &RobinHoodMap<i32, i32, BuildIdentityHasher>, index: usize) -> Option<(i32, usize)> {
        map.slots[index].as_ref().map(|bucket| (bucket.key, bucket.psl))
    }

    /// Every PSL equals the distance from the ideal slot, and no hole splits a run
    fn assert_invariants<K: Eq + Hash, V, S: BuildHasher>(map: &RobinHoodMap<K, V, S>) {
        let capacity = map.capacity();
        let mut count = 0;
        for (index, slot) in map.slots.iter().enumerate() {
            let Some(bucket) = slot else { continue };
            count += 1;
            let ideal = map.ideal_slot(&bucket.key);
            assert_eq!(bucket.psl, (index + capacity - ideal) % capacity, "slot {index}");
            for back in 1..=bucket.psl {
                let earlier = (index + capacity - back) % capacity;
                assert!(map.slots[earlier].is_some(), "hole at {earlier} before slot {index}");
            }
        }
        assert_eq!(count, map.len());
    }

    #[test]
    fn test_construction() {
        let map: RobinHoodMap<i32, i32> = RobinHoodMap::new();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 32);

        let map: RobinHoodMap<i32, i32> = RobinHoodMap::with_capacity(128).unwrap();
        assert_eq!(map.capacity(), 128);

        let map: RobinHoodMap<i32, i32> =
            RobinHoodMap::with_capacity_and_load_factor(64, 0.5).unwrap();
        assert_eq!(map.capacity(), 64);
        assert!((map.load_factor() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_insert_and_update() {
        let mut map = identity_map(32);
        assert_eq!(map.insert(1, 100), None);
        assert_eq!(map.insert(2, 200), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1), Ok(&100));
        assert_eq!(map.insert(1, 1000), Some(100));
        assert_eq!(map.get(&1), Ok(&1000));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&3), Err(MapError::KeyNotFound));
    }

    #[test]
    fn test_rich_entries_are_displaced() {
        let mut map = identity_map(32);
        map.insert(1, 100);
        map.insert(2, 200);
        map.insert(33, 1000);

        // 33 wants slot 1; at slot 2 it has walked further than 2 has and takes its place
        assert_eq!(resident(&map, 1), Some((1, 0)));
        assert_eq!(resident(&map, 2), Some((33, 1)));
        assert_eq!(resident(&map, 3), Some((2, 1)));
        assert_eq!(map.max_psl(), 1);
        assert_invariants(&map);
    }

    #[test]
    fn test_collisions() {
        let mut map = identity_map(32);
        for (key, value) in [
            (1, 100),
            (33, 1000),
            (65, 10000),
            (129, 100_000),
            (6, 600),
            (38, 6000),
            (31, 120),
            (63, 140),
            (2, 200),
        ] {
            map.insert(key, value);
        }
        assert_invariants(&map);

        assert_eq!(map.get(&1), Ok(&100));
        assert_eq!(map.get(&33), Ok(&1000));
        assert_eq!(map.get(&65), Ok(&10000));
        assert_eq!(map.get(&129), Ok(&100_000));
        assert_eq!(map.get(&6), Ok(&600));
        assert_eq!(map.get(&38), Ok(&6000));
        assert_eq!(map.get(&31), Ok(&120));
        assert_eq!(map.get(&63), Ok(&140));
        assert_eq!(map.get(&2), Ok(&200));
        assert_eq!(map.get(&97), Err(MapError::KeyNotFound));
    }

    #[test]
    fn test_probe_wraps_around() {
        let mut map = identity_map(32);
        map.insert(31, 310);
        map.insert(63, 630);
        assert_eq!(resident(&map, 0), Some((63, 1)));
        assert_eq!(map.get(&63), Ok(&630));

        assert_eq!(map.remove(&31), Ok(310));
        assert_eq!(resident(&map, 31), Some((63, 0)));
        assert_eq!(resident(&map, 0), None);
        assert_invariants(&map);
    }

    #[test]
    fn test_backward_shift_keeps_run_reachable() {
        let mut map = identity_map(32);
        map.insert(1, 100);
        map.insert(33, 1000);
        map.insert(65, 10000);

        assert_eq!(map.remove(&33), Ok(1000));
        assert_eq!(resident(&map, 2), Some((65, 1)));
        assert_eq!(resident(&map, 3), None);
        assert_eq!(map.get(&65), Ok(&10000));
        assert!(!map.contains_key(&33));
        assert_invariants(&map);
    }

    #[test]
    fn test_backward_shift_stops_at_home_entry() {
        let mut map = identity_map(32);
        map.insert(1, 100);
        map.insert(33, 1000);
        map.insert(3, 300);

        assert_eq!(map.remove(&1), Ok(100));
        assert_eq!(resident(&map, 1), Some((33, 0)));
        assert_eq!(resident(&map, 2), None);
        assert_eq!(resident(&map, 3), Some((3, 0)));
        assert_invariants(&map);
    }

    #[test]
    fn test_remove() {
        let mut map = identity_map(32);
        for (key, value) in [(1, 100), (2, 200), (3, 300), (33, 1000), (65, 10000)] {
            map.insert(key, value);
        }
        assert_eq!(map.len(), 5);

        map.remove(&2).unwrap();
        map.remove(&3).unwrap();
        assert!(!map.contains_key(&2));
        assert!(!map.contains_key(&3));
        assert_eq!(map.len(), 3);
        assert_invariants(&map);

        map.remove(&1).unwrap();
        assert!(!map.contains_key(&1));
        map.insert(1, 100);
        map.remove(&65).unwrap();
        assert!(!map.contains_key(&65));
        assert_eq!(map.get(&33), Ok(&1000));
        assert_invariants(&map);

        assert_eq!(map.remove(&1000), Err(MapError::KeyNotFound));
        assert_eq!(map.remove(&5000), Err(MapError::KeyNotFound));
    }

    #[test]
    fn test_rehash() {
        let mut map = identity_map(8);
        for key in 1..=6 {
            map.insert(key, key * 100);
        }
        assert_eq!(map.capacity(), 8);

        map.insert(7, 700);
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.len(), 7);
        assert_eq!(map.get(&4), Ok(&400));
        assert_invariants(&map);
    }

    #[test]
    fn test_rehash_with_collisions() {
        let mut map = identity_map(8);
        for (key, value) in [(1, 100), (2, 200), (3, 300), (4, 400), (33, 1000), (65, 650), (129, 1290)] {
            map.insert(key, value);
        }
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.len(), 7);
        assert_eq!(map.get(&65), Ok(&650));
        assert_eq!(map.get(&129), Ok(&1290));
        assert_invariants(&map);
    }

    #[test]
    fn test_invariants_under_churn() {
        let mut map: RobinHoodMap<u32, u32> = RobinHoodMap::with_capacity(16).unwrap();
        for key in 0..2000 {
            map.insert(key, key);
            if key % 3 == 0 && map.contains_key(&(key / 2)) {
                map.remove(&(key / 2)).unwrap();
            }
        }
        assert_invariants(&map);
        for key in 0..2000 {
            if let Ok(value) = map.get(&key) {
                assert_eq!(*value, key);
            }
        }
    }

    #[test]
    fn test_clear() {
        let mut map = identity_map(32);
        map.insert(1, 100);
        map.insert(33, 1000);
        map.insert(2, 200);
        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.max_psl(), 0);

        map.insert(1, 100);
        assert_eq!(map.get(&1), Ok(&100));
        map.insert(33, 1000);
        assert_eq!(map.get(&33), Ok(&1000));
    }

    #[test]
    fn test_get_mut_and_iter() {
        let mut map = RobinHoodMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);
        *map.get_mut("key1").unwrap() += 10;

        let mut values: Vec<i32> = map.iter().map(|(_, v)| *v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![2, 11]);
    }
}
