//! CSV loader for metric series
//!
//! Expected layout, header required:
//!
//! ```text
//! timestamp,value
//! 1700000000000,0.42
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use metrix_series::{MetricTimeSeries, Point};
use tracing::debug;

/// Load a series from a CSV file; the series is named after the file stem
pub fn load_series(path: &Path) -> Result<MetricTimeSeries> {
    if !path.exists() {
        return Err(anyhow!("Input file not found: {}", path.display()));
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("series")
        .to_string();

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let series = read_series(name, BufReader::new(file))
        .with_context(|| format!("Failed to read {}", path.display()))?;

    debug!(path = %path.display(), points = series.len(), "Loaded series");
    Ok(series)
}

fn read_series<R: Read>(name: String, reader: R) -> Result<MetricTimeSeries> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut series = MetricTimeSeries::new(name);
    for (index, record) in csv_reader.deserialize::<Point>().enumerate() {
        // header is line 1
        let point = record.with_context(|| format!("Invalid row at line {}", index + 2))?;
        series.add_point(point);
    }

    Ok(series)
}
