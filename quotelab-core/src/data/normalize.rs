//! CSV → canonical row-set normalization.
//!
//! Reads one snapshot file and produces `PriceBar`s in the canonical column
//! order, or an explicit empty result on malformed input. The mapping is
//! header-driven: if the mandatory columns are missing from the header the
//! file is unprocessable — no positional guessing.

use super::csv_store::recover_ticker;
use super::provider::DataError;
use crate::domain::PriceBar;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Columns that must appear in a snapshot header for the file to be
/// processable. Absence of any of them means the file predates the canonical
/// format (or the source format drifted) and it is skipped wholesale.
const MANDATORY_COLUMNS: [&str; 4] = ["open", "close", "dividends", "split_ratio"];

/// Loosely-typed row as read from disk. Optional fields distinguish an empty
/// cell from a present value; structurally absent columns are caught by the
/// header check before deserialization starts.
#[derive(Debug, Deserialize)]
struct FileRow {
    date: chrono::NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    #[serde(default)]
    adjusted_close: Option<f64>,
    #[serde(default)]
    volume: Option<u64>,
    dividends: Option<f64>,
    split_ratio: Option<f64>,
}

/// Normalize one snapshot file into canonical rows.
///
/// Malformed input (unrecognized filename, missing mandatory columns,
/// unparseable records) yields an empty Vec and a warning naming the file —
/// the batch continues with the remaining files. Re-running on the same file
/// always yields the identical row-set.
pub fn normalize_file(path: &Path, default_suffix: &str) -> Vec<PriceBar> {
    match try_normalize(path, default_suffix) {
        Ok(bars) => bars,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "skipping unprocessable file");
            Vec::new()
        }
    }
}

fn try_normalize(path: &Path, default_suffix: &str) -> Result<Vec<PriceBar>, DataError> {
    let ticker = recover_ticker(path, default_suffix).ok_or_else(|| DataError::MalformedFile {
        path: path.display().to_string(),
        reason: "filename does not match the snapshot pattern".into(),
    })?;

    let malformed = |reason: String| DataError::MalformedFile {
        path: path.display().to_string(),
        reason,
    };

    let mut reader =
        csv::Reader::from_path(path).map_err(|e| malformed(format!("open: {e}")))?;

    let headers = reader
        .headers()
        .map_err(|e| malformed(format!("header: {e}")))?;
    for col in MANDATORY_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(malformed(format!("missing mandatory column '{col}'")));
        }
    }

    let mut bars = Vec::new();
    let mut dropped = 0usize;

    for record in reader.deserialize::<FileRow>() {
        let row = record.map_err(|e| malformed(format!("record: {e}")))?;

        // A bar without a full OHLC set cannot be represented; drop the row,
        // keep the file.
        let (Some(open), Some(high), Some(low), Some(close)) =
            (row.open, row.high, row.low, row.close)
        else {
            dropped += 1;
            continue;
        };

        bars.push(PriceBar {
            date: row.date,
            ticker: ticker.clone(),
            open,
            high,
            low,
            close,
            adjusted_close: row.adjusted_close,
            volume: row.volume.unwrap_or(0),
            dividends: row.dividends.unwrap_or(0.0),
            split_ratio: row.split_ratio.unwrap_or(0.0),
        });
    }

    if dropped > 0 {
        warn!(file = %path.display(), ticker = %ticker, dropped, "dropped rows without full OHLC");
    }

    Ok(bars)
}

/// Normalize every snapshot file in the given list, skipping unprocessable
/// files. Returns one row-set per successfully-normalized file.
pub fn normalize_files(paths: &[std::path::PathBuf], default_suffix: &str) -> Vec<Vec<PriceBar>> {
    paths
        .iter()
        .map(|p| normalize_file(p, default_suffix))
        .filter(|bars| !bars.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_SUFFIX;
    use chrono::NaiveDate;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const CANONICAL_CSV: &str = "\
date,open,high,low,close,adjusted_close,volume,dividends,split_ratio
2022-01-03,100.0,102.0,99.0,101.0,100.5,1000,0.0,0.0
2022-01-04,101.0,103.0,100.0,102.0,,1100,0.25,0.0
";

    #[test]
    fn normalizes_canonical_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data15To23_PETR4.csv", CANONICAL_CSV);

        let bars = normalize_file(&path, DEFAULT_SUFFIX);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].ticker, "PETR4.SA");
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2022, 1, 3).unwrap());
        assert_eq!(bars[0].adjusted_close, Some(100.5));
        // Empty adjusted_close cell stays None.
        assert_eq!(bars[1].adjusted_close, None);
        assert_eq!(bars[1].dividends, 0.25);
    }

    #[test]
    fn index_ticker_recovers_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data15To23_BVSP.csv", CANONICAL_CSV);

        let bars = normalize_file(&path, DEFAULT_SUFFIX);
        assert_eq!(bars[0].ticker, "^BVSP");
    }

    #[test]
    fn missing_mandatory_column_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        // Legacy format: no dividends/split_ratio columns.
        let path = write_file(
            dir.path(),
            "data15To23_ELET3.csv",
            "date,open,high,low,close,adjusted_close,volume\n2022-01-03,1.0,2.0,0.5,1.5,1.4,100\n",
        );

        assert!(normalize_file(&path, DEFAULT_SUFFIX).is_empty());
    }

    #[test]
    fn null_dividends_default_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "data15To23_EGIE3.csv",
            "date,open,high,low,close,adjusted_close,volume,dividends,split_ratio\n\
             2022-01-03,10.0,11.0,9.0,10.5,10.2,500,,\n",
        );

        let bars = normalize_file(&path, DEFAULT_SUFFIX);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].dividends, 0.0);
        assert_eq!(bars[0].split_ratio, 0.0);
    }

    #[test]
    fn rows_without_full_ohlc_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "data15To23_VALE3.csv",
            "date,open,high,low,close,adjusted_close,volume,dividends,split_ratio\n\
             2022-01-03,10.0,11.0,9.0,10.5,10.2,500,0.0,0.0\n\
             2022-01-04,,11.0,9.0,10.5,10.2,500,0.0,0.0\n",
        );

        let bars = normalize_file(&path, DEFAULT_SUFFIX);
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn unrecognized_filename_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "prices.csv", CANONICAL_CSV);
        assert!(normalize_file(&path, DEFAULT_SUFFIX).is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data15To23_PETR4.csv", CANONICAL_CSV);

        let first = normalize_file(&path, DEFAULT_SUFFIX);
        let second = normalize_file(&path, DEFAULT_SUFFIX);
        assert_eq!(first, second);
    }

    #[test]
    fn normalize_files_skips_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "data15To23_PETR4.csv", CANONICAL_CSV);
        let bad = write_file(
            dir.path(),
            "data15To23_OLD.csv",
            "date,open,close\n2022-01-03,1.0,2.0\n",
        );

        let sets = normalize_files(&[good, bad], DEFAULT_SUFFIX);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0][0].ticker, "PETR4.SA");
    }
}
