//! quotelab-core — daily price-history ingestion and appreciation forecast.
//!
//! The pipeline, end to end:
//! - Download: per-ticker daily OHLCV (+ dividends/splits) from Yahoo
//!   Finance, one canonical CSV snapshot per (ticker, date window)
//! - Normalize: CSV → canonical row-set, ticker recovered from the filename
//! - Upload: bulk write into one PostgreSQL table keyed on `(date, ticker)`
//! - Forecast: trailing indicators + forward-return labels, random-forest
//!   classifier, ranked picks above a confidence threshold
//!
//! Everything is single-threaded and synchronous; network and database
//! calls block the calling thread.

pub mod config;
pub mod data;
pub mod db;
pub mod domain;
pub mod features;
pub mod forecast;
pub mod forest;
pub mod indicators;
pub mod pipeline;
