//! Relational store for normalized price bars.

pub mod price_store;

pub use price_store::{missing_adj_close_tickers, PriceStore, StoreError, WriteMode};
