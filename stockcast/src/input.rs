//! Ticker and horizon resolution for a dashboard request

use serde::{Deserialize, Serialize};

/// Tickers offered in the selection list. The first one is the default.
pub const DEFAULT_TICKERS: [&str; 10] = [
    "GOOG",
    "AAPL",
    "INTC",
    "NVDA",
    "MSFT",
    "TSLA",
    "RELIANCE.NS",
    "TATAMOTORS.NS",
    "TATASTEEL.NS",
    "ADANIENT.NS",
];

pub const DAYS_PER_YEAR: usize = 365;

/// Pick the ticker to load.
///
/// A non-blank free-text override wins over the list selection. The text is
/// only trimmed; an unknown symbol shows up later as an empty price series.
pub fn resolve_ticker(selected: Option<&str>, custom: Option<&str>) -> String {
    if let Some(custom) = custom.map(str::trim).filter(|s| !s.is_empty()) {
        return custom.to_string();
    }

    selected
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_TICKERS[0])
        .to_string()
}

/// Forecast horizon in whole years, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonYears(u32);

impl HorizonYears {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 5;

    /// Clamp `years` into the supported range
    pub fn new(years: u32) -> Self {
        Self(years.clamp(Self::MIN, Self::MAX))
    }

    pub fn years(&self) -> u32 {
        self.0
    }

    /// Horizon as a number of calendar days
    pub fn days(&self) -> usize {
        self.0 as usize * DAYS_PER_YEAR
    }
}

impl Default for HorizonYears {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        assert_eq!(resolve_ticker(Some("AAPL"), Some("IBM")), "IBM");
        assert_eq!(resolve_ticker(Some("AAPL"), Some("  brk-b ")), "brk-b");
    }

    #[test]
    fn test_blank_override_falls_back_to_selection() {
        assert_eq!(resolve_ticker(Some("NVDA"), Some("")), "NVDA");
        assert_eq!(resolve_ticker(Some("NVDA"), Some("   ")), "NVDA");
        assert_eq!(resolve_ticker(Some("NVDA"), None), "NVDA");
    }

    #[test]
    fn test_nothing_selected_uses_first_default() {
        assert_eq!(resolve_ticker(None, None), "GOOG");
    }

    #[test]
    fn test_horizon_days() {
        assert_eq!(HorizonYears::new(1).days(), 365);
        assert_eq!(HorizonYears::new(5).days(), 1825);
    }

    #[test]
    fn test_horizon_is_clamped() {
        assert_eq!(HorizonYears::new(0).years(), 1);
        assert_eq!(HorizonYears::new(9).years(), 5);
        assert_eq!(HorizonYears::default().years(), 1);
    }
}
