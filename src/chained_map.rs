use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash},
    mem,
};

use slotmap::{DefaultKey, SlotMap};

use crate::{
    config::MapConfig,
    engine::{EngineKind, delegate_map_engine},
    error::{MapError, Result},
    hashing::{DefaultHashBuilder, make_hash, reduce},
};

/// A node of a bucket chain
#[derive(Debug, Clone)]
struct Node<K, V> {
    /// The key in the key-value pair
    key: K,
    /// The value associated with the key
    value: V,
    /// Next node of the same bucket, `None` at the tail
    next: Option<DefaultKey>,
}

/// A hash table resolving collisions by separate chaining.
///
/// Every bucket heads a singly linked chain of entries. The nodes live in an arena and
/// chains link arena keys, so a resize only relinks nodes and never moves entries.
///
/// The bucket count doubles as soon as the number of entries exceeds
/// `floor(capacity * load_factor)`.
#[derive(Debug, Clone)]
pub struct ChainedMap<K, V, S = DefaultHashBuilder> {
    /// First node of every bucket
    heads: Vec<Option<DefaultKey>>,
    /// Arena owning every node
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    /// Configured load factor
    load_factor: f64,
    /// Builds the hasher used for bucket selection
    hash_builder: S,
}

impl<K, V> ChainedMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map with 32 buckets and load factor 0.75
    #[must_use]
    pub fn new() -> Self {
        Self::with_config_and_hasher(MapConfig::default(), DefaultHashBuilder::default())
    }

    /// Creates an empty map with `capacity` buckets and the default load factor
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

    /// Creates an empty map with `capacity` buckets that grows past `load_factor`
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

impl<K, V, S> Default for ChainedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedMap<K, V, S>
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

impl<K, V, S> FromIterator<(K, V)> for ChainedMap<K, V, S>
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

impl<K, V, S> ChainedMap<K, V, S>
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
            heads: vec![None; config.capacity()],
            nodes: SlotMap::new(),
            load_factor: config.load_factor(),
            hash_builder,
        }
    }

    /// Bucket a key hashes to
    fn bucket_of<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        reduce(make_hash(&self.hash_builder, key), self.heads.len())
    }

    /// First node of `bucket`
    fn head(&self, bucket: usize) -> Option<DefaultKey> {
        self.heads.get(bucket).copied().flatten()
    }

    /// Points the link following `prev` (the bucket head when `prev` is `None`) at `target`
    fn relink(&mut self, bucket: usize, prev: Option<DefaultKey>, target: Option<DefaultKey>) {
        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(node) => node.next = target,
            None => {
                if let Some(head) = self.heads.get_mut(bucket) {
                    *head = target;
                }
            }
        }
    }

    /// Arena key of the node holding `key`
    fn find<Q>(&self, key: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut cursor = self.head(self.bucket_of(key));
        while let Some(node_key) = cursor {
            let node = self.nodes.get(node_key)?;
            if node.key.borrow() == key {
                return Some(node_key);
            }
            cursor = node.next;
        }
        None
    }

    /// Inserts a key-value pair, returning the previous value of an existing key.
    ///
    /// A new key is appended to the tail of its bucket chain.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let bucket = self.bucket_of(&key);
        let mut tail = None;
        let mut cursor = self.head(bucket);

        while let Some(node_key) = cursor {
            let Some(node) = self.nodes.get_mut(node_key) else { break };
            if node.key == key {
                return Some(mem::replace(&mut node.value, value));
            }
            tail = Some(node_key);
            cursor = node.next;
        }

        let node_key = self.nodes.insert(Node { key, value, next: None });
        self.relink(bucket, tail, Some(node_key));

        if self.len() > self.threshold() {
            self.grow();
        }
        None
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
            .and_then(|node_key| self.nodes.get(node_key))
            .map(|node| &node.value)
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
        let node_key = self.find(key).ok_or(MapError::KeyNotFound)?;
        self.nodes.get_mut(node_key).map(|node| &mut node.value).ok_or(MapError::KeyNotFound)
    }

    /// Removes `key` from the map, returning its value
    ///
    /// # Errors
    ///
    /// [`MapError::KeyNotFound`] if the key is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_of(key);
        let mut prev = None;
        let mut cursor = self.head(bucket);

        while let Some(node_key) = cursor {
            let node = self.nodes.get(node_key).ok_or(MapError::KeyNotFound)?;
            if node.key.borrow() == key {
                // head, middle and tail all reduce to pointing the previous link past the node
                let next = node.next;
                self.relink(bucket, prev, next);
                return self
                    .nodes
                    .remove(node_key)
                    .map(|node| node.value)
                    .ok_or(MapError::KeyNotFound);
            }
            prev = Some(node_key);
            cursor = node.next;
        }

        Err(MapError::KeyNotFound)
    }

    /// Returns true if the map contains `key`
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes every entry, keeping the current bucket count
    pub fn clear(&mut self) {
        log::trace!("clearing chained map with {} entries", self.nodes.len());
        self.nodes.clear();
        self.heads.fill(None);
    }

    /// Returns the number of elements in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of buckets
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.heads.len()
    }

    /// Returns the configured load factor
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Number of entries above which the bucket array grows
    fn threshold(&self) -> usize {
        crate::config::threshold(self.heads.len(), self.load_factor)
    }

    /// Doubles the bucket count and relinks every node into its new chain
    fn grow(&mut self) {
        let new_capacity = self.heads.len().saturating_mul(2);
        log::debug!(
            "growing chained map from {} to {} buckets at {} entries",
            self.heads.len(),
            new_capacity,
            self.nodes.len()
        );

        let Self { heads, nodes, hash_builder, .. } = self;
        *heads = vec![None; new_capacity];
        for (node_key, node) in nodes.iter_mut() {
            let bucket = reduce(make_hash(&*hash_builder, &node.key), new_capacity);
            if let Some(head) = heads.get_mut(bucket) {
                node.next = head.replace(node_key);
            }
        }
    }

    /// Returns an iterator over the key-value pairs in arbitrary order
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { nodes: self.nodes.iter() }
    }
}

delegate_map_engine!(ChainedMap, EngineKind::Chained);

/// Iterator over the key-value pairs of a [`ChainedMap`]
pub struct Iter<'a, K, V> {
    /// Underlying arena iterator
    nodes: slotmap::basic::Iter<'a, DefaultKey, Node<K, V>>,
}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").finish_non_exhaustive()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(|(_, node)| (&node.key, &node.value))
    }
}
