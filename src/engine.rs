//! The contract shared by every hash map engine.

use std::fmt;

use crate::config::MapConfig;
use crate::error::Result;

/// Collision-resolution strategy of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineKind {
    /// Separate chaining, see [`crate::ChainedMap`]
    Chained,
    /// Double hashing with tombstones, see [`crate::DoubleHashMap`]
    DoubleHash,
    /// Robin Hood hashing with backward-shift deletion, see [`crate::RobinHoodMap`]
    RobinHood,
}

impl EngineKind {
    /// Every strategy, in reporting order.
    pub const ALL: [Self; 3] = [Self::Chained, Self::DoubleHash, Self::RobinHood];

    /// Short label used in benchmark reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Chained => "LL",
            Self::DoubleHash => "DH",
            Self::RobinHood => "RH",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operations every engine supports.
///
/// The engines also expose these as inherent methods accepting borrowed key forms; the
/// trait exists so that code such as the benchmark runner can drive any engine
/// generically.
pub trait MapEngine<K, V> {
    /// Strategy implemented by this engine.
    const KIND: EngineKind;

    /// Creates an empty engine from a validated configuration.
    fn from_config(config: MapConfig) -> Self
    where
        Self: Sized;

    /// Stores `value` under `key`, returning the value it replaced.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`crate::MapError::KeyNotFound`] if the key is absent.
    fn get(&self, key: &K) -> Result<&V>;

    /// Removes `key`, returning its value.
    ///
    /// # Errors
    ///
    /// [`crate::MapError::KeyNotFound`] if the key is absent.
    fn remove(&mut self, key: &K) -> Result<V>;

    /// Whether `key` is stored.
    fn contains_key(&self, key: &K) -> bool;

    /// Removes every entry.
    fn clear(&mut self);

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Whether the map holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current number of slots.
    fn capacity(&self) -> usize;

    /// Configured load factor.
    fn load_factor(&self) -> f64;
}

/// Implements [`MapEngine`] for an engine type by delegating to its inherent methods.
macro_rules! delegate_map_engine {
    ($engine:ident, $kind:expr) => {
        impl<K, V, S> $crate::engine::MapEngine<K, V> for $engine<K, V, S>
        where
            K: Eq + ::std::hash::Hash,
            S: ::std::hash::BuildHasher + Default,
        {
            const KIND: $crate::engine::EngineKind = $kind;

            fn from_config(config: $crate::config::MapConfig) -> Self {
                Self::with_config_and_hasher(config, S::default())
            }

            fn insert(&mut self, key: K, value: V) -> Option<V> {
                $engine::insert(self, key, value)
            }

            fn get(&self, key: &K) -> $crate::error::Result<&V> {
                $engine::get(self, key)
            }

            fn remove(&mut self, key: &K) -> $crate::error::Result<V> {
                $engine::remove(self, key)
            }

            fn contains_key(&self, key: &K) -> bool {
                $engine::contains_key(self, key)
            }

            fn clear(&mut self) {
                $engine::clear(self);
            }

            fn len(&self) -> usize {
                $engine::len(self)
            }

            fn capacity(&self) -> usize {
                $engine::capacity(self)
            }

            fn load_factor(&self) -> f64 {
                $engine::load_factor(self)
            }
        }
    };
}

pub(crate) use delegate_map_engine;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChainedMap, DoubleHashMap, RobinHoodMap};

    fn fill<M: MapEngine<u32, u32>>(map: &mut M, n: u32) {
        for i in 0..n {
            assert_eq!(map.insert(i, i * 2), None);
        }
    }

    fn exercise<M: MapEngine<u32, u32>>() {
        let mut map = M::from_config(MapConfig::new(8, 0.5).unwrap());
        assert!(map.is_empty());
        fill(&mut map, 40);
        assert_eq!(map.len(), 40);
        assert!(map.capacity() >= 40);
        for i in 0..40 {
            assert_eq!(map.get(&i), Ok(&(i * 2)));
        }
        assert_eq!(map.remove(&7), Ok(14));
        assert!(!map.contains_key(&7));
        map.clear();
        assert!(map.is_empty());
        assert!((map.load_factor() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_generic_contract() {
        exercise::<ChainedMap<u32, u32>>();
        exercise::<DoubleHashMap<u32, u32>>();
        exercise::<RobinHoodMap<u32, u32>>();
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(<ChainedMap<u32, u32> as MapEngine<u32, u32>>::KIND.label(), "LL");
        assert_eq!(<DoubleHashMap<u32, u32> as MapEngine<u32, u32>>::KIND.label(), "DH");
        assert_eq!(<RobinHoodMap<u32, u32> as MapEngine<u32, u32>>::KIND.to_string(), "RH");
        assert_eq!(EngineKind::ALL.len(), 3);
    }
}
