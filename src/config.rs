use chrono::Duration;

use crate::decimal::Money;
use crate::valuation::YieldConfig;

/// ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// smallest deposit accepted when opening an investment
    pub minimum_investment: Money,
    /// growth and tax parameters for valuations
    pub yield_config: YieldConfig,
    /// how long cached read results stay fresh
    pub cache_ttl: Duration,
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            minimum_investment: Money::from_major(50),
            yield_config: YieldConfig::default(),
            cache_ttl: Duration::seconds(30),
        }
    }
}
