//! Universe configuration — sector-organized ticker lists.
//!
//! The universe is stored as a TOML table of sectors to member tickers.
//! Tickers are written in canonical form (exchange suffix / index prefix
//! included) so the list can feed the downloader directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The complete universe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read universe file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse universe TOML: {e}"))
    }

    /// Get all tickers across all sectors.
    pub fn all_tickers(&self) -> Vec<&str> {
        self.sectors
            .values()
            .flat_map(|tickers| tickers.iter().map(|t| t.as_str()))
            .collect()
    }

    /// Get tickers for a specific sector.
    pub fn sector_tickers(&self, sector: &str) -> Option<&[String]> {
        self.sectors.get(sector).map(|v| v.as_slice())
    }

    /// Total number of tickers.
    pub fn ticker_count(&self) -> usize {
        self.sectors.values().map(|v| v.len()).sum()
    }

    /// Default B3 universe: dividend payers, real-estate funds, benchmarks.
    pub fn default_b3() -> Self {
        let mut sectors = BTreeMap::new();

        sectors.insert(
            "Banks".into(),
            to_strings(&["BBAS3.SA", "SANB11.SA", "ITSA4.SA"]),
        );
        sectors.insert(
            "Energy".into(),
            to_strings(&["TAEE11.SA", "CPLE6.SA", "EGIE3.SA"]),
        );
        sectors.insert("Sanitation".into(), to_strings(&["CSMG3.SA", "SAPR11.SA"]));
        sectors.insert("Commodities".into(), to_strings(&["VALE3.SA", "PETR4.SA"]));
        sectors.insert(
            "ReitLogistics".into(),
            to_strings(&["HGLG11.SA", "BTLG11.SA"]),
        );
        sectors.insert(
            "ReitPaper".into(),
            to_strings(&["KNIP11.SA", "MXRF11.SA", "CPTS11.SA"]),
        );
        sectors.insert(
            "ReitShopping".into(),
            to_strings(&["VISC11.SA", "XPML11.SA"]),
        );
        sectors.insert("Benchmarks".into(), to_strings(&["^BVSP", "FIX.SA"]));

        Self { sectors }
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize universe: {e}"))
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::default_b3()
    }
}

fn to_strings(tickers: &[&str]) -> Vec<String> {
    tickers.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_universe_has_sectors() {
        let u = Universe::default_b3();
        assert!(u.sectors.contains_key("Banks"));
        assert!(u.sectors.contains_key("Benchmarks"));
        assert!(u.ticker_count() > 15);
    }

    #[test]
    fn toml_roundtrip() {
        let u = Universe::default_b3();
        let toml_str = u.to_toml().unwrap();
        let parsed = Universe::from_toml(&toml_str).unwrap();
        assert_eq!(u, parsed);
    }

    #[test]
    fn all_tickers_flattens() {
        let u = Universe::default_b3();
        let all = u.all_tickers();
        assert!(all.contains(&"PETR4.SA"));
        assert!(all.contains(&"^BVSP"));
    }

    #[test]
    fn sector_lookup() {
        let u = Universe::default_b3();
        let banks = u.sector_tickers("Banks").unwrap();
        assert!(banks.contains(&"ITSA4.SA".to_string()));
        assert!(u.sector_tickers("Nope").is_none());
    }
}
