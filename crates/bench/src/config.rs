use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Network descriptor threaded explicitly through every constructor.
/// No module-level shared state: two benchmarks against two targets can
/// run in the same process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_url: Url,
    pub chain_id: u64,
    pub native_currency: NativeCurrency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub chain: ChainConfig,
    /// Interval for the live elapsed-time display. Display only; the
    /// authoritative duration is measured by the runner.
    pub tick_interval_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_poll_retries: u64,
}

pub const TICK_INTERVAL_MS: u64 = 50;
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 250;
pub const RECEIPT_POLL_RETRIES: u64 = 240;

impl BenchmarkConfig {
    pub fn new(chain: ChainConfig) -> Self {
        Self {
            chain,
            tick_interval_ms: TICK_INTERVAL_MS,
            receipt_poll_interval_ms: RECEIPT_POLL_INTERVAL_MS,
            receipt_poll_retries: RECEIPT_POLL_RETRIES,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
