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
    prime::next_prime,
};

/// State of a single slot
#[derive(Debug, Clone)]
enum Slot<K, V> {
    /// Never held an entry since the last clear or resize
    Free,
    /// Holds a live entry
    Occupied {
        /// The key in the key-value pair
        key: K,
        /// The value associated with the key
        value: V,
    },
    /// Held an entry that was removed; probing continues past it
    Tombstoned,
}

/// Builds `capacity` free slots
fn free_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    iter::repeat_with(|| Slot::Free).take(capacity).collect()
}

/// Probe sequence of one hash value over a prime number of slots.
///
/// Starts at `hash mod capacity` and advances by `1 + hash mod (capacity - 1)`. The step
/// is never zero and, the capacity being prime, is coprime with it, so `capacity`
/// consecutive indices visit every slot exactly once.
#[derive(Debug, Clone, Copy)]
struct Probe {
    /// Next index to yield
    index: usize,
    /// Distance between consecutive indices
    step: usize,
    /// Number of slots
    capacity: usize,
}

impl Probe {
    /// Starts the probe sequence of `hash`
    fn new(hash: u64, capacity: usize) -> Self {
        let step = reduce(hash, capacity.saturating_sub(1).max(1)).saturating_add(1);
        Self { index: reduce(hash, capacity), step, capacity }
    }
}

impl Iterator for Probe {
    type Item = usize;

    #[allow(clippy::arithmetic_side_effects)]
    fn next(&mut self) -> Option<usize> {
        let current = self.index;
        // both terms are below the capacity, the sum cannot overflow in practice
        self.index = (self.index + self.step) % self.capacity;
        Some(current)
    }
}

/// A hash table resolving collisions by double hashing.
///
/// The number of slots is always prime. Removal leaves a tombstone so that probe
/// sequences passing through the slot stay intact; tombstones are dropped on resize.
///
/// Growth is driven by the number of slots that are not free (live entries plus
/// tombstones): once it exceeds `floor(capacity * load_factor)` the table is rebuilt
/// with `next_prime(2 * capacity)` slots.
#[derive(Debug, Clone)]
pub struct DoubleHashMap<K, V, S = DefaultHashBuilder> {
    /// The slots storing the key-value pairs
    slots: Vec<Slot<K, V>>,
    /// Current number of live entries
    size: usize,
    /// Number of slots that are occupied or tombstoned
    used: usize,
    /// Configured load factor
    load_factor: f64,
    /// Builds the hasher used for probing
    hash_builder: S,
}

impl<K, V> DoubleHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map with 37 slots (the first prime above 32) and load factor 0.75
    #[must_use]
    pub fn new() -> Self {
        Self::with_config_and_hasher(MapConfig::default(), DefaultHashBuilder::default())
    }

    /// Creates an empty map with at least `capacity` slots, rounded up to a prime
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

    /// Creates an empty map with at least `capacity` slots that grows past `load_factor`
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

impl<K, V, S> Default for DoubleHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Extend<(K, V)> for DoubleHashMap<K, V, S>
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

impl<K, V, S> FromIterator<(K, V)> for DoubleHashMap<K, V, S>
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

impl<K, V, S> DoubleHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates an empty map with default parameters using `hash_builder` to hash keys
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_config_and_hasher(MapConfig::default(), hash_builder)
    }

    /// Creates an empty map from a validated configuration; the capacity is rounded up to a
    /// prime
    pub fn with_config_and_hasher(config: MapConfig, hash_builder: S) -> Self {
        Self {
            slots: free_slots(next_prime(config.capacity())),
            size: 0,
            used: 0,
            load_factor: config.load_factor(),
            hash_builder,
        }
    }

    /// Probe sequence of `key` over the current slots
    fn probe<Q: Hash + ?Sized>(&self, key: &Q) -> iter::Take<Probe> {
        let capacity = self.slots.len();
        Probe::new(make_hash(&self.hash_builder, key), capacity).take(capacity)
    }

    /// Index of the slot holding `key`
    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        for index in self.probe(key) {
            match self.slots.get(index)? {
                Slot::Free => return None,
                Slot::Occupied { key: resident, .. } if resident.borrow() == key => {
                    return Some(index);
                }
                Slot::Occupied { .. } | Slot::Tombstoned => {}
            }
        }
        None
    }

    /// Inserts a key-value pair, returning the previous value of an existing key.
    ///
    /// A new key takes the first tombstone met along its probe sequence, or the free slot
    /// that ended the probe when there was none.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut first_tombstone = None;
        let mut free = None;

        for index in self.probe(&key) {
            match self.slots.get_mut(index) {
                None => break,
                Some(Slot::Free) => {
                    free = Some(index);
                    break;
                }
                Some(Slot::Tombstoned) => {
                    first_tombstone = first_tombstone.or(Some(index));
                }
                Some(Slot::Occupied { key: resident, value: current }) => {
                    if *resident == key {
                        return Some(mem::replace(current, value));
                    }
                }
            }
        }

        let Some(target) = first_tombstone.or(free) else {
            // every slot is occupied, which the growth policy rules out
            self.grow();
            return self.insert(key, value);
        };

        if let Some(slot) = self.slots.get_mut(target) {
            if matches!(slot, Slot::Free) {
                self.used = self.used.saturating_add(1);
            }
            *slot = Slot::Occupied { key, value };
            self.size = self.size.saturating_add(1);
        }

        if self.used > self.threshold() {
            self.grow();
        }
        None
    }

    /// Places an entry known to be absent into the first free slot of its probe sequence
    fn place(&mut self, key: K, value: V) {
        let target = self.probe(&key).find(|&index| matches!(self.slots.get(index), Some(Slot::Free)));
        if let Some(slot) = target.and_then(|index| self.slots.get_mut(index)) {
            *slot = Slot::Occupied { key, value };
            self.size = self.size.saturating_add(1);
            self.used = self.used.saturating_add(1);
        }
    }

    /// Retrieves the value stored under `key`
    ///
    /// # Errors
    ///
    /// [`MapError::KeyNotFound`] if the probe reaches a free slot without meeting the key.
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.find(key).and_then(|index| self.slots.get(index)) {
            Some(Slot::Occupied { value, .. }) => Ok(value),
            _ => Err(MapError::KeyNotFound),
        }
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
        match self.slots.get_mut(index) {
            Some(Slot::Occupied { value, .. }) => Ok(value),
            _ => Err(MapError::KeyNotFound),
        }
    }

    /// Removes `key` from the map, leaving a tombstone in its slot
    ///
    /// # Errors
    ///
    /// [`MapError::KeyNotFound`] if the key is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key).ok_or(MapError::KeyNotFound)?;
        let slot = self.slots.get_mut(index).ok_or(MapError::KeyNotFound)?;
        match mem::replace(slot, Slot::Tombstoned) {
            Slot::Occupied { value, .. } => {
                self.size = self.size.saturating_sub(1);
                Ok(value)
            }
            other => {
                *slot = other;
                Err(MapError::KeyNotFound)
            }
        }
    }

    /// Returns true if the map contains `key`
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes every entry and tombstone, reallocating the slots at the current capacity
    pub fn clear(&mut self) {
        log::trace!("clearing double hash map with {} entries", self.size);
        self.slots = free_slots(self.slots.len());
        self.size = 0;
        self.used = 0;
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

    /// Returns the number of slots, always a prime
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the configured load factor
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns the number of tombstoned slots
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.used.saturating_sub(self.size)
    }

    /// Number of non-free slots above which the table grows
    fn threshold(&self) -> usize {
        crate::config::threshold(self.slots.len(), self.load_factor)
    }

    /// Rebuilds the table with `next_prime(2 * capacity)` slots, dropping tombstones
    fn grow(&mut self) {
        let new_capacity = next_prime(self.slots.len().saturating_mul(2));
        log::debug!(
            "growing double hash map from {} to {} slots ({} entries, {} tombstones)",
            self.slots.len(),
            new_capacity,
            self.size,
            self.tombstones()
        );

        let old = mem::replace(&mut self.slots, free_slots(new_capacity));
        self.size = 0;
        self.used = 0;
        for slot in old {
            if let Slot::Occupied { key, value } = slot {
                self.place(key, value);
            }
        }
    }

    /// Returns an iterator over the key-value pairs in arbitrary order
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { slots: self.slots.iter() }
    }
}

delegate_map_engine!(DoubleHashMap, EngineKind::DoubleHash);

/// Iterator over the key-value pairs of a [`DoubleHashMap`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Remaining slots
    slots: slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(|slot| match slot {
            Slot::Occupied { key, value } => Some((key, value)),
            Slot::Free | Slot::Tombstoned => None,
        })
    }
}
