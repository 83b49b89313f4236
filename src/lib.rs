//! # Hash Maps
//!
//! Three hash table engines resolving collisions in different ways, sharing one API:
//!
//! - `ChainedMap`: separate chaining, every bucket holds a linked chain of entries
//! - `DoubleHashMap`: open addressing with a second hash as probe step, prime capacities
//!   and tombstones for removed entries
//! - `RobinHoodMap`: open addressing that keeps probe sequence lengths balanced and
//!   deletes by shifting entries back
//!
//! All three implement [`MapEngine`], so generic code (such as the [`bench`] driver) can
//! run against any of them.
//!
//! ## Basic Usage
//!
//! ```rust
//! use hashmaps::{ChainedMap, MapError};
//!
//! // Create a new hash map
//! let mut map = ChainedMap::new();
//!
//! // Insert values
//! assert_eq!(map.insert("apple".to_string(), 1), None);
//! map.insert("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(map.get("apple"), Ok(&1));
//!
//! // Update values
//! assert_eq!(map.insert("apple".to_string(), 10), Some(1));
//!
//! // Remove values
//! assert_eq!(map.remove("apple"), Ok(10));
//! assert_eq!(map.get("apple"), Err(MapError::KeyNotFound));
//! ```
//!
//! ## Choosing Capacity and Hasher
//!
//! ```rust
//! use hashmaps::{BuildIdentityHasher, DoubleHashMap, MapConfig, RobinHoodMap};
//!
//! // Double hashing rounds the capacity up to a prime
//! let map = DoubleHashMap::<String, f32>::with_capacity_and_load_factor(100, 0.9)?;
//! assert_eq!(map.capacity(), 101);
//!
//! // With the identity hasher integer keys land in predictable slots
//! let config = MapConfig::new(16, 0.75)?;
//! let mut map = RobinHoodMap::with_config_and_hasher(config, BuildIdentityHasher::default());
//! map.insert(1_u64, "one");
//! map.insert(17_u64, "seventeen");
//! assert_eq!(map.max_psl(), 1);
//! # Ok::<(), hashmaps::MapError>(())
//! ```

/// Benchmark driver timing the engines on a dataset
pub mod bench;
/// Separate chaining engine
pub mod chained_map;
/// Engine construction parameters
mod config;
/// Double hashing engine
pub mod double_hash_map;
/// The trait shared by all engines
mod engine;
/// Error type of the engines
mod error;
/// Hash builders and hash reduction helpers
mod hashing;
/// Prime number helpers for double hashing capacities
mod prime;
/// Robin Hood engine
pub mod robin_hood_map;

pub use chained_map::ChainedMap;
pub use config::{DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, MapConfig};
pub use double_hash_map::DoubleHashMap;
pub use engine::{EngineKind, MapEngine};
pub use error::{MapError, Result};
pub use hashing::{BuildIdentityHasher, DefaultHashBuilder, IdentityHasher};
pub use prime::{is_prime, next_prime};
pub use robin_hood_map::RobinHoodMap;
