#![allow(clippy::missing_docs_in_private_items)]

use std::{env, path::PathBuf};

use hashmaps::bench::{BenchConfig, BenchError, dataset, report, runner};

fn main() -> Result<(), BenchError> {
    let mut args = env::args().skip(1);
    let Some(dataset_path) = args.next().map(PathBuf::from) else {
        return Err(BenchError::Usage("hashmap_bench <dataset> [output-dir]".to_string()));
    };
    let config = BenchConfig {
        output_dir: args.next().map_or_else(|| PathBuf::from("."), PathBuf::from),
        ..BenchConfig::default()
    };

    let records = dataset::read_dataset(&dataset_path)?;
    println!("Read {} records from {}", records.len(), dataset_path.display());
    println!("Load factors: {:?}", config.load_factors);
    println!("Number of elements: {:?}", config.sizes);

    let measurements = runner::run(&config, &records)?;
    println!("Collected {} measurements", measurements.len());

    let csv = report::write_csv(&config.output_dir, &measurements)?;
    println!("Saved results to {}", csv.display());

    let charts = report::render_charts(&config.output_dir, &measurements)?;
    println!("Generated {} charts in {}", charts.len(), config.output_dir.display());

    Ok(())
}
