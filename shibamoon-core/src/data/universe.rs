//! Scan universe: which exchange markets get scored.
//!
//! Keeps pairs quoted in the configured asset that are currently trading,
//! drops any whose base asset contains a stablecoin ticker (so `USDCUSDT`,
//! `TUSDUSDT` and similar wrappers are skipped) and caps the list in exchange
//! order.

use super::provider::Market;

/// Stablecoin tickers excluded from the base asset by default.
pub const DEFAULT_STABLECOINS: [&str; 8] =
    ["USDT", "USDC", "BUSD", "DAI", "TUSD", "UST", "USDP", "USDD"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseFilter {
    pub quote_asset: String,
    pub excluded_bases: Vec<String>,
    pub max_symbols: usize,
}

impl Default for UniverseFilter {
    fn default() -> Self {
        Self {
            quote_asset: "USDT".into(),
            excluded_bases: DEFAULT_STABLECOINS.iter().map(|s| s.to_string()).collect(),
            max_symbols: 100,
        }
    }
}

impl UniverseFilter {
    /// Substring match against the upper-cased base asset.
    pub fn is_excluded(&self, base: &str) -> bool {
        let base = base.to_uppercase();
        self.excluded_bases
            .iter()
            .any(|ticker| base.contains(&ticker.to_uppercase()))
    }

    pub fn accepts(&self, market: &Market) -> bool {
        market.trading
            && market.quote.eq_ignore_ascii_case(&self.quote_asset)
            && !self.is_excluded(&market.base)
    }

    pub fn apply(&self, markets: &[Market]) -> Vec<Market> {
        markets
            .iter()
            .filter(|m| self.accepts(m))
            .take(self.max_symbols)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<Market> {
        let mut halted = Market::new("LUNA", "USDT");
        halted.trading = false;
        vec![
            Market::new("BTC", "USDT"),
            Market::new("ETH", "BTC"),
            Market::new("USDC", "USDT"),
            Market::new("ETH", "USDT"),
            halted,
            Market::new("BUSD", "USDT"),
            Market::new("SOL", "USDT"),
        ]
    }

    #[test]
    fn keeps_trading_usdt_pairs_in_order() {
        let symbols: Vec<String> = UniverseFilter::default()
            .apply(&listing())
            .iter()
            .map(Market::symbol)
            .collect();
        assert_eq!(symbols, ["BTC/USDT", "ETH/USDT", "SOL/USDT"]);
    }

    #[test]
    fn stablecoin_match_is_substring() {
        let filter = UniverseFilter::default();
        assert!(filter.is_excluded("XUSDP"));
        assert!(filter.is_excluded("usdc"));
        assert!(filter.is_excluded("USTC"));
        assert!(!filter.is_excluded("DOGE"));
        assert!(!filter.is_excluded("FDUSD"));
    }

    #[test]
    fn caps_at_max_symbols() {
        let filter = UniverseFilter {
            max_symbols: 2,
            ..UniverseFilter::default()
        };
        assert_eq!(filter.apply(&listing()).len(), 2);
    }
}
