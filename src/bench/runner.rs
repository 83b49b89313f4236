//! Times every engine over the size × load factor matrix.

use std::{fmt, hint::black_box, time::Instant};

use log::{info, warn};
use rand::seq::SliceRandom;

use super::{BenchConfig, BenchError, dataset::Record};
use crate::{
    chained_map::ChainedMap, config::MapConfig, double_hash_map::DoubleHashMap,
    engine::{EngineKind, MapEngine}, robin_hood_map::RobinHoodMap,
};

/// A timed map operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Inserting every key of the cell
    Put,
    /// Looking up every key in shuffled order
    ContainsKey,
    /// A single lookup of a key that is not stored
    ContainsKeyFailed,
    /// Removing every key in shuffled order
    Remove,
}

impl Operation {
    /// Every operation, in measuring order.
    pub const ALL: [Self; 4] = [Self::Put, Self::ContainsKey, Self::ContainsKeyFailed, Self::Remove];

    /// Name written to the CSV report.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::ContainsKey => "containsKey",
            Self::ContainsKeyFailed => "containsKeyFailed",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One timing of one operation on one engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Engine measured
    pub engine: EngineKind,
    /// Number of entries in the map
    pub size: usize,
    /// Load factor the map was built with
    pub load_factor: f64,
    /// Operation timed
    pub operation: Operation,
    /// Elapsed wall time in nanoseconds
    pub nanos: u128,
}

/// Rounds `n` to a power of two: down when `n` lies within half a step of the lower
/// power, up otherwise. Values below 2 round to 1.
#[must_use]
pub fn nearest_power_of_two(n: usize) -> usize {
    if n < 2 {
        return 1;
    }
    let power = 1_usize << n.ilog2();
    if n.saturating_sub(power) <= power / 2 { power } else { power.saturating_mul(2) }
}

/// Slot count requested for a cell before any engine-specific rounding.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn cell_capacity(size: usize, load_factor: f64) -> usize {
    (size as f64 / load_factor).floor() as usize
}

/// Keys a cell works on.
struct Cell<'a> {
    /// Keys in dataset order, used for insertion
    records: &'a [Record],
    /// The same keys shuffled, used for lookups and removal
    shuffled: &'a [&'a str],
    /// Key expected to be absent
    missing_key: &'a String,
}

/// Times each operation on one freshly built engine.
fn run_engine<M>(config: MapConfig, cell: &Cell<'_>) -> [(Operation, u128); 4]
where
    M: MapEngine<String, f32>,
{
    let mut map = M::from_config(config);

    let start = Instant::now();
    for record in cell.records {
        map.insert(record.key.clone(), record.value);
    }
    let put = start.elapsed().as_nanos();

    let keys: Vec<String> = cell.shuffled.iter().map(|key| (*key).to_string()).collect();

    let start = Instant::now();
    for key in &keys {
        black_box(map.contains_key(key));
    }
    let contains = start.elapsed().as_nanos();

    let start = Instant::now();
    black_box(map.contains_key(cell.missing_key));
    let failed = start.elapsed().as_nanos();

    let start = Instant::now();
    for key in &keys {
        // Duplicate dataset keys are removed on their first occurrence.
        black_box(map.remove(key).ok());
    }
    let remove = start.elapsed().as_nanos();

    [
        (Operation::Put, put),
        (Operation::ContainsKey, contains),
        (Operation::ContainsKeyFailed, failed),
        (Operation::Remove, remove),
    ]
}

/// Runs the whole matrix of `config` over `records`.
///
/// Sizes larger than the dataset are skipped. Chained and Robin Hood maps get the cell
/// capacity rounded by [`nearest_power_of_two`]; the double hashing map takes it as is and
/// makes it prime itself.
///
/// # Errors
///
/// [`BenchError::EmptyDataset`] for an empty `records`, [`BenchError::Map`] when a cell
/// yields an invalid capacity or load factor.
pub fn run(config: &BenchConfig, records: &[Record]) -> Result<Vec<Measurement>, BenchError> {
    if records.is_empty() {
        return Err(BenchError::EmptyDataset);
    }

    let mut rng = rand::rng();
    let mut measurements = Vec::new();

    for &load_factor in &config.load_factors {
        for &size in &config.sizes {
            let Some(cell_records) = records.get(..size) else {
                warn!("skipping size {size}: dataset holds only {} records", records.len());
                continue;
            };
            info!("measuring {size} entries at load factor {load_factor:.2}");

            let capacity = cell_capacity(size, load_factor);
            let rounded = MapConfig::new(nearest_power_of_two(capacity), load_factor)?;
            let exact = MapConfig::new(capacity, load_factor)?;

            let mut shuffled: Vec<&str> =
                cell_records.iter().map(|record| record.key.as_str()).collect();
            shuffled.shuffle(&mut rng);
            let cell =
                Cell { records: cell_records, shuffled: &shuffled, missing_key: &config.missing_key };

            for kind in EngineKind::ALL {
                let timings = match kind {
                    EngineKind::Chained => run_engine::<ChainedMap<String, f32>>(rounded, &cell),
                    EngineKind::DoubleHash => {
                        run_engine::<DoubleHashMap<String, f32>>(exact, &cell)
                    }
                    EngineKind::RobinHood => run_engine::<RobinHoodMap<String, f32>>(rounded, &cell),
                };
                measurements.extend(timings.into_iter().map(|(operation, nanos)| Measurement {
                    engine: kind,
                    size,
                    load_factor,
                    operation,
                    nanos,
                }));
            }
        }
    }

    Ok(measurements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<Record> {
        (0..n).map(|i| Record { key: format!("key-{i}"), value: i as f32 }).collect()
    }

    #[test]
    fn test_nearest_power_of_two() {
        assert_eq!(nearest_power_of_two(0), 1);
        assert_eq!(nearest_power_of_two(1), 1);
        assert_eq!(nearest_power_of_two(66), 64);
        assert_eq!(nearest_power_of_two(96), 64);
        assert_eq!(nearest_power_of_two(97), 128);
        assert_eq!(nearest_power_of_two(100), 128);
        assert_eq!(nearest_power_of_two(128), 128);
    }

    #[test]
    fn test_cell_capacity_floors() {
        assert_eq!(cell_capacity(50, 0.75), 66);
        assert_eq!(cell_capacity(100, 0.99), 101);
        assert_eq!(cell_capacity(1000, 0.5), 2000);
    }

    #[test]
    fn test_operation_names() {
        let names: Vec<_> = Operation::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["put", "containsKey", "containsKeyFailed", "remove"]);
    }

    #[test]
    fn test_run_covers_matrix_and_skips_large_sizes() {
        let config = BenchConfig {
            load_factors: vec![0.75, 0.9],
            sizes: vec![10, 50, 1000],
            ..BenchConfig::default()
        };
        let measurements = run(&config, &records(60)).unwrap();

        // 2 load factors × 2 usable sizes × 3 engines × 4 operations
        assert_eq!(measurements.len(), 48);
        assert!(measurements.iter().all(|m| m.size != 1000));
        for kind in EngineKind::ALL {
            assert_eq!(measurements.iter().filter(|m| m.engine == kind).count(), 16);
        }
        assert_eq!(
            measurements.iter().filter(|m| m.operation == Operation::ContainsKeyFailed).count(),
            12
        );
    }

    #[test]
    fn test_run_rejects_empty_dataset() {
        assert!(matches!(run(&BenchConfig::default(), &[]), Err(BenchError::EmptyDataset)));
    }

    #[test]
    fn test_run_rejects_zero_size() {
        let config = BenchConfig { sizes: vec![0], ..BenchConfig::default() };
        assert!(matches!(run(&config, &records(5)), Err(BenchError::Map(_))));
    }
}
