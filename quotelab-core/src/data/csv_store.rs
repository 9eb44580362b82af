//! Working-directory CSV snapshot store.
//!
//! Layout: one file per (ticker, date window) named
//! `data{startYY}To{endYY-MM-DD}_{BARE}.csv`, where `BARE` is the ticker with
//! the index-prefix marker and the default exchange suffix stripped. The
//! filename is the authoritative place the ticker is recovered from on
//! re-ingestion — embedded-header recovery does not survive source format
//! drift, the filename does.
//!
//! Every file carries the identical header
//! `date,open,high,low,close,adjusted_close,volume,dividends,split_ratio`
//! so downstream concatenation never misaligns columns by position.
//! Writes are atomic: write to `.tmp`, rename into place.

use super::provider::{DataError, RawBar};
use crate::domain::{bare_name, canonicalize, DateWindow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix shared by every snapshot file in the working directory.
const FILE_PREFIX: &str = "data";

/// On-disk row. Field order defines the column order of every snapshot file.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SnapshotRow {
    pub date: chrono::NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: Option<f64>,
    pub volume: u64,
    pub dividends: f64,
    pub split_ratio: f64,
}

impl From<&RawBar> for SnapshotRow {
    fn from(bar: &RawBar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            adjusted_close: bar.adj_close,
            volume: bar.volume,
            dividends: bar.dividends,
            split_ratio: bar.split_ratio,
        }
    }
}

/// The snapshot store rooted at a working directory.
pub struct CsvStore {
    dir: PathBuf,
    default_suffix: String,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>, default_suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_suffix: default_suffix.into(),
        }
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn default_suffix(&self) -> &str {
        &self.default_suffix
    }

    /// Snapshot filename for a canonical ticker and window, e.g.
    /// `data15To25-08-07_PETR4.csv` for `PETR4.SA` from 2015 until 2025-08-07.
    pub fn file_name(&self, ticker: &str, window: DateWindow) -> String {
        let bare = bare_name(ticker, &self.default_suffix);
        format!(
            "{FILE_PREFIX}{}To{}_{bare}.csv",
            window.start.format("%y"),
            window.end.format("%y-%m-%d"),
        )
    }

    fn path_for(&self, ticker: &str, window: DateWindow) -> PathBuf {
        self.dir.join(self.file_name(ticker, window))
    }

    /// Write one snapshot file for a ticker and window.
    pub fn write_snapshot(
        &self,
        ticker: &str,
        window: DateWindow,
        bars: &[RawBar],
    ) -> Result<PathBuf, DataError> {
        if bars.is_empty() {
            return Err(DataError::SnapshotError(format!(
                "no bars to write for {ticker}"
            )));
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| DataError::SnapshotError(format!("create dir: {e}")))?;

        let path = self.path_for(ticker, window);
        let tmp_path = path.with_extension("csv.tmp");

        {
            let mut writer = csv::Writer::from_path(&tmp_path)
                .map_err(|e| DataError::SnapshotError(format!("create {}: {e}", tmp_path.display())))?;
            for bar in bars {
                writer
                    .serialize(SnapshotRow::from(bar))
                    .map_err(|e| DataError::SnapshotError(format!("write row: {e}")))?;
            }
            writer
                .flush()
                .map_err(|e| DataError::SnapshotError(format!("flush: {e}")))?;
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::SnapshotError(format!("atomic rename failed: {e}"))
        })?;

        Ok(path)
    }

    /// All snapshot files currently in the working directory, sorted by name.
    pub fn list_snapshots(&self) -> Result<Vec<PathBuf>, DataError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir)
            .map_err(|e| DataError::SnapshotError(format!("read dir: {e}")))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::SnapshotError(format!("dir entry: {e}")))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(FILE_PREFIX) && name.ends_with(".csv") {
                paths.push(entry.path());
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// Remove every snapshot file so the next download pass starts clean.
    /// Returns the number of files removed.
    pub fn clean_snapshots(&self) -> Result<usize, DataError> {
        let paths = self.list_snapshots()?;
        for path in &paths {
            fs::remove_file(path)
                .map_err(|e| DataError::SnapshotError(format!("remove {}: {e}", path.display())))?;
        }
        Ok(paths.len())
    }

    /// Recover the canonical ticker from a snapshot filename.
    ///
    /// Takes the segment after the last `_` before `.csv` and reapplies the
    /// canonical exchange-suffix/index-prefix convention. Returns `None` for
    /// files that do not follow the snapshot naming pattern.
    pub fn recover_ticker(&self, path: &Path) -> Option<String> {
        recover_ticker(path, &self.default_suffix)
    }
}

/// See [`CsvStore::recover_ticker`].
pub fn recover_ticker(path: &Path, default_suffix: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".csv")?;
    if !stem.starts_with(FILE_PREFIX) {
        return None;
    }
    let bare = stem.rsplit_once('_')?.1;
    if bare.is_empty() {
        return None;
    }
    Some(canonicalize(bare, default_suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_SUFFIX;
    use chrono::NaiveDate;

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        )
    }

    fn sample_bars() -> Vec<RawBar> {
        vec![
            RawBar {
                date: NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                adj_close: Some(100.5),
                volume: 1_000,
                dividends: 0.0,
                split_ratio: 0.0,
            },
            RawBar {
                date: NaiveDate::from_ymd_opt(2022, 1, 4).unwrap(),
                open: 101.0,
                high: 103.0,
                low: 100.0,
                close: 102.0,
                adj_close: None,
                volume: 1_100,
                dividends: 0.25,
                split_ratio: 0.0,
            },
        ]
    }

    #[test]
    fn file_name_strips_ticker_markers() {
        let store = CsvStore::new("unused", DEFAULT_SUFFIX);
        assert_eq!(
            store.file_name("PETR4.SA", window()),
            "data15To23-01-01_PETR4.csv"
        );
        assert_eq!(
            store.file_name("^BVSP", window()),
            "data15To23-01-01_BVSP.csv"
        );
    }

    #[test]
    fn recover_ticker_reapplies_convention() {
        assert_eq!(
            recover_ticker(Path::new("data15To23_PETR4.csv"), DEFAULT_SUFFIX),
            Some("PETR4.SA".to_string())
        );
        assert_eq!(
            recover_ticker(Path::new("data15To23_BVSP.csv"), DEFAULT_SUFFIX),
            Some("^BVSP".to_string())
        );
        assert_eq!(
            recover_ticker(Path::new("data15To23_FIX.SA.csv"), DEFAULT_SUFFIX),
            Some("FIX.SA".to_string())
        );
    }

    #[test]
    fn recover_ticker_rejects_foreign_files() {
        assert_eq!(recover_ticker(Path::new("notes.csv"), DEFAULT_SUFFIX), None);
        assert_eq!(recover_ticker(Path::new("data.txt"), DEFAULT_SUFFIX), None);
        assert_eq!(
            recover_ticker(Path::new("data15To23.csv"), DEFAULT_SUFFIX),
            None
        );
    }

    #[test]
    fn write_name_recover_roundtrip() {
        let store = CsvStore::new("unused", DEFAULT_SUFFIX);
        for ticker in ["PETR4.SA", "^BVSP", "HGLG11.SA", "^IFIX"] {
            let name = store.file_name(ticker, window());
            let recovered = recover_ticker(Path::new(&name), DEFAULT_SUFFIX).unwrap();
            assert_eq!(recovered, ticker, "ticker {ticker}");
        }
    }

    #[test]
    fn write_list_clean_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path(), DEFAULT_SUFFIX);

        store
            .write_snapshot("PETR4.SA", window(), &sample_bars())
            .unwrap();
        store
            .write_snapshot("^BVSP", window(), &sample_bars())
            .unwrap();

        let listed = store.list_snapshots().unwrap();
        assert_eq!(listed.len(), 2);

        assert_eq!(store.clean_snapshots().unwrap(), 2);
        assert!(store.list_snapshots().unwrap().is_empty());
    }

    #[test]
    fn snapshot_header_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path(), DEFAULT_SUFFIX);
        let path = store
            .write_snapshot("PETR4.SA", window(), &sample_bars())
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "date,open,high,low,close,adjusted_close,volume,dividends,split_ratio"
        );
        // Missing adjusted close serializes as an empty field, not 0.
        let second_row = content.lines().nth(2).unwrap();
        assert!(second_row.contains(",,"));
    }

    #[test]
    fn empty_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path(), DEFAULT_SUFFIX);
        assert!(store.write_snapshot("PETR4.SA", window(), &[]).is_err());
    }

    #[test]
    fn list_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path(), DEFAULT_SUFFIX);
        store
            .write_snapshot("PETR4.SA", window(), &sample_bars())
            .unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not a snapshot").unwrap();
        std::fs::write(dir.path().join("other.csv"), "a,b\n1,2\n").unwrap();

        assert_eq!(store.list_snapshots().unwrap().len(), 1);
    }
}
