//! Snapshot → store ingestion pass.
//!
//! Gathers every snapshot file in the working directory, normalizes each one
//! (skipping unprocessable files), concatenates the row-sets, and writes them
//! to the relational store in the requested mode. One parameterized pass
//! replaces the script-per-window copies this pipeline grew out of.

use crate::data::csv_store::CsvStore;
use crate::data::normalize::normalize_files;
use crate::data::provider::DataError;
use crate::db::{missing_adj_close_tickers, PriceStore, StoreError, WriteMode};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("snapshot scan failed")]
    Data(#[from] DataError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What an ingestion pass did.
#[derive(Debug)]
pub struct IngestOutcome {
    /// Snapshot files found in the working directory.
    pub files_found: usize,
    /// Files that normalized to a non-empty row-set.
    pub files_ingested: usize,
    /// Rows written to the store.
    pub rows_written: u64,
    /// Tickers with `adjusted_close` null on every row.
    pub missing_adj_close: Vec<String>,
}

/// Normalize all snapshots and write them to the store.
///
/// When no file yields a valid row-set the store is left untouched — even in
/// replace mode, an empty pass must not wipe a populated table.
pub fn upload_snapshots(
    store: &CsvStore,
    db: &mut PriceStore,
    mode: WriteMode,
) -> Result<IngestOutcome, PipelineError> {
    let paths = store.list_snapshots()?;
    let sets = normalize_files(&paths, store.default_suffix());
    let files_ingested = sets.len();

    let bars: Vec<_> = sets.into_iter().flatten().collect();

    if bars.is_empty() {
        warn!(
            dir = %store.dir().display(),
            files = paths.len(),
            "no valid rows to upload; store untouched"
        );
        return Ok(IngestOutcome {
            files_found: paths.len(),
            files_ingested: 0,
            rows_written: 0,
            missing_adj_close: Vec::new(),
        });
    }

    let missing_adj_close = missing_adj_close_tickers(&bars);

    db.ensure_table()?;
    let rows_written = db.write(&bars, mode)?;

    info!(
        files = files_ingested,
        rows = rows_written,
        mode = %mode,
        "ingestion pass complete"
    );

    Ok(IngestOutcome {
        files_found: paths.len(),
        files_ingested,
        rows_written,
        missing_adj_close,
    })
}
