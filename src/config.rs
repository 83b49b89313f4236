//! Construction parameters shared by every engine.

use crate::error::{MapError, Result};

/// Slot count used when no capacity is requested.
pub const DEFAULT_CAPACITY: usize = 32;

/// Load factor used when none is requested.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Validated capacity and load factor of a map.
///
/// The capacity is the *requested* slot count; engines may adjust it (the double hashing
/// engine rounds it up to a prime).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Requested number of slots, always positive
    capacity: usize,
    /// Resize threshold as a fraction of the capacity, always in `(0, 1)`
    load_factor: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY, load_factor: DEFAULT_LOAD_FACTOR }
    }
}

impl MapConfig {
    /// Creates a configuration, rejecting a zero capacity or a load factor outside `(0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidArgument`] naming the offending parameter.
    pub fn new(capacity: usize, load_factor: f64) -> Result<Self> {
        if capacity == 0 {
            return Err(MapError::invalid("capacity", "must be positive"));
        }
        // NaN fails both comparisons and is rejected as well.
        if !(load_factor > 0.0 && load_factor < 1.0) {
            return Err(MapError::invalid(
                "load factor",
                format!("{load_factor} does not lie strictly between 0 and 1"),
            ));
        }
        Ok(Self { capacity, load_factor })
    }

    /// Creates a configuration with the given capacity and the default load factor.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidArgument`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::new(capacity, DEFAULT_LOAD_FACTOR)
    }

    /// Requested slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured load factor.
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Largest occupancy a table of `capacity` slots may hold before it has to grow.
    #[must_use]
    pub fn threshold(&self, capacity: usize) -> usize {
        threshold(capacity, self.load_factor)
    }
}

/// `floor(capacity * load_factor)`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub(crate) fn threshold(capacity: usize, load_factor: f64) -> usize {
    (capacity as f64 * load_factor).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert_eq!(config.capacity(), 32);
        assert!((config.load_factor() - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.threshold(32), 24);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = MapConfig::new(0, 0.5).unwrap_err();
        assert!(matches!(err, MapError::InvalidArgument { parameter: "capacity", .. }));
    }

    #[test]
    fn test_rejects_out_of_range_load_factor() {
        for load_factor in [0.0, 1.0, -0.3, 1.5, f64::NAN] {
            let err = MapConfig::new(8, load_factor).unwrap_err();
            assert!(
                matches!(err, MapError::InvalidArgument { parameter: "load factor", .. }),
                "{load_factor} should be rejected"
            );
        }
    }

    #[test]
    fn test_threshold_floors() {
        let config = MapConfig::new(7, 0.75).unwrap();
        assert_eq!(config.threshold(7), 5);
        assert_eq!(config.threshold(17), 12);
        assert_eq!(threshold(131, 0.99), 129);
    }
}
