//! CSV and chart output of a benchmark run.

use std::{
    error::Error,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use plotters::prelude::*;

use super::{
    BenchError,
    runner::{Measurement, Operation},
};
use crate::engine::EngineKind;

/// First line of every CSV report.
pub const CSV_HEADER: &str = "HashMap,\"Number of elements\",Load factor,Operation,Time";

/// Font of captions and axis labels.
const FONT_FAMILY: &str = "sans-serif";

/// Line colors, in [`EngineKind::ALL`] order.
const COLORS: [RGBColor; 3] = [
    RGBColor(220, 50, 50),  // red
    RGBColor(50, 90, 220),  // blue
    RGBColor(50, 180, 50),  // green
];

/// Stroke width of engine lines.
const LINE_WIDTH: u32 = 2;
/// Radius of point markers.
const MARKER_SIZE: u32 = 4;
/// Axis description font size.
const TEXT_SIZE: u32 = 16;
/// Caption font size.
const TITLE_SIZE: u32 = 30;

/// Renders measurements as CSV: the header, then one row per measurement.
#[must_use]
pub fn to_csv_string(measurements: &[Measurement]) -> String {
    let mut csv = String::from(CSV_HEADER);
    for m in measurements {
        // Writing into a String cannot fail.
        let _ = write!(
            csv,
            "\n{},{},{:.2},{},{}",
            m.engine.label(),
            m.size,
            m.load_factor,
            m.operation,
            m.nanos
        );
    }
    csv
}

/// Writes `results-<unix seconds>.csv` into `dir`, returning its path.
///
/// # Errors
///
/// [`BenchError::Io`] when the directory cannot be created or the file written.
pub fn write_csv(dir: &Path, measurements: &[Measurement]) -> Result<PathBuf, BenchError> {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("results-{seconds}.csv"));
    fs::write(&path, to_csv_string(measurements))?;
    Ok(path)
}

/// Distinct load factors in order of first appearance.
fn load_factors(measurements: &[Measurement]) -> Vec<f64> {
    let mut factors: Vec<f64> = Vec::new();
    for m in measurements {
        if !factors.iter().any(|lf| (lf - m.load_factor).abs() < f64::EPSILON) {
            factors.push(m.load_factor);
        }
    }
    factors
}

/// Time of a measurement in the unit its chart uses: nanoseconds for the single failed
/// lookup, milliseconds otherwise.
#[allow(clippy::cast_precision_loss)]
fn chart_time(m: &Measurement) -> f64 {
    match m.operation {
        Operation::ContainsKeyFailed => m.nanos as f64,
        _ => m.nanos as f64 / 1_000_000.0,
    }
}

/// Draws one chart per operation and load factor into `dir` as SVG files.
///
/// # Errors
///
/// [`BenchError::Io`] when `dir` cannot be created, [`BenchError::Chart`] when drawing
/// fails.
pub fn render_charts(dir: &Path, measurements: &[Measurement]) -> Result<Vec<PathBuf>, BenchError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for load_factor in load_factors(measurements) {
        for operation in Operation::ALL {
            let cell: Vec<&Measurement> = measurements
                .iter()
                .filter(|m| {
                    m.operation == operation && (m.load_factor - load_factor).abs() < f64::EPSILON
                })
                .collect();
            if cell.is_empty() {
                continue;
            }

            let path = dir.join(format!("{operation}-lf{load_factor:.2}.svg"));
            draw_chart(&path, operation, load_factor, &cell).map_err(|err| BenchError::Chart {
                path: path.clone(),
                reason: err.to_string(),
            })?;
            written.push(path);
        }
    }

    Ok(written)
}

/// Time against number of entries, one line per engine.
fn draw_chart(
    path: &Path,
    operation: Operation,
    load_factor: f64,
    cell: &[&Measurement],
) -> Result<(), Box<dyn Error>> {
    let mut sizes: Vec<usize> = cell.iter().map(|m| m.size).collect();
    sizes.sort_unstable();
    sizes.dedup();
    let x_labels: Vec<String> = sizes.iter().map(ToString::to_string).collect();

    let max_time = cell.iter().map(|m| chart_time(m)).fold(0.0, f64::max);
    let y_max = if max_time > 0.0 { max_time * 1.1 } else { 1.0 };
    let unit = if operation == Operation::ContainsKeyFailed { "ns" } else { "ms" };

    let root = SVGBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{operation} (load factor {load_factor:.2})"),
            (FONT_FAMILY, TITLE_SIZE),
        )
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..sizes.len(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_labels(sizes.len())
        .x_label_formatter(&|x| x_labels.get(*x).cloned().unwrap_or_default())
        .x_desc("Number of entries in hash map")
        .y_desc(format!("Time [{unit}]"))
        .axis_desc_style((FONT_FAMILY, TEXT_SIZE))
        .draw()?;

    for (kind, color) in EngineKind::ALL.into_iter().zip(COLORS) {
        let points: Vec<(usize, f64)> = sizes
            .iter()
            .enumerate()
            .filter_map(|(index, &size)| {
                cell.iter()
                    .find(|m| m.engine == kind && m.size == size)
                    .map(|m| (index, chart_time(m)))
            })
            .collect();
        let line_style = ShapeStyle::from(&color).stroke_width(LINE_WIDTH);

        chart
            .draw_series(LineSeries::new(points.iter().copied(), line_style))?
            .label(kind.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series(
            points.iter().map(|&point| Circle::new(point, MARKER_SIZE, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(
        engine: EngineKind,
        size: usize,
        load_factor: f64,
        operation: Operation,
        nanos: u128,
    ) -> Measurement {
        Measurement { engine, size, load_factor, operation, nanos }
    }

    fn sample() -> Vec<Measurement> {
        let mut all = Vec::new();
        for load_factor in [0.75, 0.9] {
            for size in [50, 100] {
                for engine in EngineKind::ALL {
                    for operation in Operation::ALL {
                        all.push(measurement(engine, size, load_factor, operation, 1_500_000));
                    }
                }
            }
        }
        all
    }

    #[test]
    fn test_csv_rows() {
        let csv = to_csv_string(&[
            measurement(EngineKind::Chained, 50, 0.75, Operation::Put, 1234),
            measurement(EngineKind::RobinHood, 150_000, 0.99, Operation::ContainsKeyFailed, 87),
        ]);
        assert_eq!(
            csv,
            "HashMap,\"Number of elements\",Load factor,Operation,Time\n\
             LL,50,0.75,put,1234\n\
             RH,150000,0.99,containsKeyFailed,87"
        );
    }

    #[test]
    fn test_csv_header_only() {
        assert_eq!(to_csv_string(&[]), CSV_HEADER);
    }

    #[test]
    fn test_write_csv_names_file_after_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), &sample()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("results-") && name.ends_with(".csv"), "{name}");
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1 + sample().len());
    }

    #[test]
    fn test_chart_units() {
        let failed = measurement(EngineKind::DoubleHash, 10, 0.8, Operation::ContainsKeyFailed, 2500);
        let put = measurement(EngineKind::DoubleHash, 10, 0.8, Operation::Put, 2_500_000);
        assert!((chart_time(&failed) - 2500.0).abs() < f64::EPSILON);
        assert!((chart_time(&put) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_one_chart_per_operation_and_load_factor() {
        let dir = tempfile::tempdir().unwrap();
        let paths = render_charts(dir.path(), &sample()).unwrap();

        assert_eq!(paths.len(), 8);
        assert!(paths.iter().any(|p| p.ends_with("containsKeyFailed-lf0.90.svg")));
        for path in &paths {
            let svg = fs::read_to_string(path).unwrap();
            assert!(svg.contains("<svg"), "{}", path.display());
        }
    }
}
