//! Ticker symbol conventions.
//!
//! Instruments carry an exchange suffix (`PETR4.SA`) and market indices an
//! index-prefix marker (`^BVSP`). File names on disk use the bare symbol with
//! both markers stripped, so recovery from a filename has to reapply the
//! convention. Index symbols cannot be told apart from equities once the `^`
//! is stripped, hence the known-index table.

/// Default exchange suffix applied to bare equity symbols.
pub const DEFAULT_SUFFIX: &str = ".SA";

/// Bare symbols that are market indices and take the `^` prefix on recovery.
const INDEX_SYMBOLS: &[&str] = &["BVSP", "IBX50", "IFIX", "IDIV"];

/// Reapply the canonical convention to a bare symbol recovered from a filename.
///
/// - already prefixed with `^` → unchanged;
/// - known index symbol → `^` prepended;
/// - already carries some exchange suffix (contains `.`) → unchanged;
/// - otherwise the default suffix is appended.
pub fn canonicalize(bare: &str, default_suffix: &str) -> String {
    if bare.starts_with('^') {
        return bare.to_string();
    }
    if INDEX_SYMBOLS.contains(&bare) {
        return format!("^{bare}");
    }
    if bare.contains('.') {
        return bare.to_string();
    }
    format!("{bare}{default_suffix}")
}

/// Strip the index-prefix marker and the default exchange suffix for use in
/// file names. Foreign suffixes (`.DE`, `.L`, ...) are kept so the symbol
/// stays unambiguous.
pub fn bare_name(ticker: &str, default_suffix: &str) -> String {
    let no_prefix = ticker.strip_prefix('^').unwrap_or(ticker);
    no_prefix
        .strip_suffix(default_suffix)
        .unwrap_or(no_prefix)
        .to_string()
}
