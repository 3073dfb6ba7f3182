use crate::benchmark::BenchmarkReport;
use crate::error::{BenchError, Result};
use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// One benchmark run, as stored in the JSON results file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BenchmarkRecord {
    pub input_name: String,
    pub variant: String,
    pub input_bytes: usize,
    pub compressed_bytes: usize,
    pub compression_rate: f64,
    pub compression_speed: f64,
    pub decompression_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_speed: Option<f64>,
}

impl BenchmarkRecord {
    pub fn from_report(input_name: impl Into<String>, report: &BenchmarkReport) -> Self {
        let input = report.input_len();
        Self {
            input_name: input_name.into(),
            variant: report.variant.name().to_string(),
            input_bytes: input,
            compressed_bytes: report.compressed_len(),
            compression_rate: report.compression_rate(),
            compression_speed: report.compress.throughput_mb_s(input),
            decompression_speed: report.decompress.throughput_mb_s(input),
            accelerator_speed: report.accelerator.as_ref().map(|r| r.throughput_mb_s(input)),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BenchError {
    BenchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Reads all records from `path`. A missing file yields no records; an
/// unparsable one is logged and treated as empty.
pub fn read_benchmark_results(path: &Path) -> Result<Vec<BenchmarkRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "cannot parse results file, starting fresh");
        Vec::new()
    }))
}

/// Appends `record` to the JSON array stored at `path`.
pub fn append_benchmark_result(record: &BenchmarkRecord, path: &Path) -> Result<()> {
    let mut records = read_benchmark_results(path)?;
    records.push(record.clone());
    let json = serde_json::to_string_pretty(&records).map_err(|e| io_error(path, e.into()))?;
    fs::write(path, json).map_err(|e| io_error(path, e))
}

fn mean<'a>(values: impl Iterator<Item = &'a f64>, len: usize) -> f64 {
    values.sum::<f64>() / len as f64
}

/// Averages repeated runs per (variant, input) and prints one table per
/// variant.
pub fn print_benchmark_results(records: &[BenchmarkRecord]) {
    let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<&BenchmarkRecord>>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.variant.as_str())
            .or_default()
            .entry(record.input_name.as_str())
            .or_default()
            .push(record);
    }

    for (variant, inputs) in grouped {
        let mut table = Table::new();
        table.add_row(row![
            "Input",
            "Comp Rate",
            "Comp Speed (MB/s)",
            "Decomp Speed (MB/s)",
            "Accel Speed (MB/s)"
        ]);

        let mut averaged = Vec::with_capacity(inputs.len());
        for (input, runs) in inputs {
            let n = runs.len();
            let accelerator: Vec<f64> = runs.iter().filter_map(|r| r.accelerator_speed).collect();
            let rate = mean(runs.iter().map(|r| &r.compression_rate), n);
            let compression = mean(runs.iter().map(|r| &r.compression_speed), n);
            let decompression = mean(runs.iter().map(|r| &r.decompression_speed), n);
            let accelerator = if accelerator.is_empty() {
                "-".to_string()
            } else {
                format!("{:.2}", mean(accelerator.iter(), accelerator.len()))
            };
            table.add_row(row![
                input,
                format!("{:.3}", rate),
                format!("{:.2}", compression),
                format!("{:.2}", decompression),
                accelerator,
            ]);
            averaged.push((rate, compression, decompression));
        }

        let n = averaged.len();
        table.add_row(row![
            "AVERAGE",
            format!("{:.3}", mean(averaged.iter().map(|r| &r.0), n)),
            format!("{:.2}", mean(averaged.iter().map(|r| &r.1), n)),
            format!("{:.2}", mean(averaged.iter().map(|r| &r.2), n)),
            "",
        ]);

        println!("\nResults for variant: {variant}");
        table.printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(input: &str, rate: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            input_name: input.into(),
            variant: "rle8".into(),
            input_bytes: 100,
            compressed_bytes: 50,
            compression_rate: rate,
            compression_speed: 1.0,
            decompression_speed: 2.0,
            accelerator_speed: None,
        }
    }

    #[test]
    fn append_accumulates_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        assert!(read_benchmark_results(&path).unwrap().is_empty());

        append_benchmark_result(&record("a", 2.0), &path).unwrap();
        append_benchmark_result(&record("b", 3.0), &path).unwrap();
        let records = read_benchmark_results(&path).unwrap();
        assert_eq!(records, vec![record("a", 2.0), record("b", 3.0)]);
        print_benchmark_results(&records);
    }

    #[test]
    fn garbage_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "not json").unwrap();
        assert!(read_benchmark_results(&path).unwrap().is_empty());
    }
}
