//! Domain types: price bars, ticker conventions, date windows.

pub mod bar;
pub mod ticker;

pub use bar::PriceBar;
pub use ticker::{bare_name, canonicalize, DEFAULT_SUFFIX};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive-start, exclusive-end date range for a download pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}
