//! Data pipeline: remote fetch, CSV snapshots, normalization.

pub mod csv_store;
pub mod download;
pub mod normalize;
pub mod provider;
pub mod universe;
pub mod yahoo;

pub use csv_store::{recover_ticker, CsvStore};
pub use download::{download_tickers, DownloadSummary};
pub use normalize::{normalize_file, normalize_files};
pub use provider::{
    DataError, DataProvider, DownloadProgress, FetchResult, RawBar, SilentProgress, StdoutProgress,
};
pub use universe::Universe;
pub use yahoo::YahooProvider;
