//! Download orchestrator — multi-ticker batches with pacing and progress.

use super::csv_store::CsvStore;
use super::provider::{DataError, DataProvider, DownloadProgress};
use crate::domain::DateWindow;
use std::time::Duration;
use tracing::{info, warn};

/// Run one download pass: fetch every ticker for the window and write one
/// snapshot file per ticker.
///
/// A fixed pause precedes every request. The remote source throttles bursty
/// clients and a throttled batch fails for every remaining ticker, so the
/// pause is a correctness requirement of the batch, not tuning.
///
/// A failed ticker (empty result, network error) is logged and skipped; it
/// never aborts the batch.
pub fn download_tickers(
    provider: &dyn DataProvider,
    store: &CsvStore,
    tickers: &[&str],
    window: DateWindow,
    pause: Duration,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = tickers.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    info!(
        total,
        start = %window.start,
        end = %window.end,
        provider = provider.name(),
        "starting download pass"
    );

    for (i, ticker) in tickers.iter().enumerate() {
        progress.on_start(ticker, i, total);
        std::thread::sleep(pause);

        let result = download_single(provider, store, ticker, window);
        progress.on_complete(ticker, i, total, &result);

        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "skipping ticker");
                errors.push((ticker.to_string(), e));
                failed += 1;
            }
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

/// Download a single ticker: fetch → snapshot file.
fn download_single(
    provider: &dyn DataProvider,
    store: &CsvStore,
    ticker: &str,
    window: DateWindow,
) -> Result<(), DataError> {
    let fetched = provider.fetch(ticker, window.start, window.end)?;
    store.write_snapshot(ticker, window, &fetched.bars)?;
    Ok(())
}

/// Summary of a batch download operation.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
