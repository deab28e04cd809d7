//! Gateway settings.

use std::time::Duration;

use mysgw_link::TransportConfig;
use serde::{Deserialize, Serialize};

/// Default health check period.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_metric() -> bool {
    true
}

/// Settings consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Where the gateway is.
    pub transport: TransportConfig,
    /// Health check period in milliseconds.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Answer `I_CONFIG` with metric (`M`) rather than imperial (`I`) units.
    #[serde(default = "default_metric")]
    pub metric: bool,
}

impl GatewaySettings {
    /// Settings for `transport` with defaults for everything else.
    pub fn new(transport: TransportConfig) -> Self {
        GatewaySettings {
            transport,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            metric: default_metric(),
        }
    }

    /// Health check period.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Unit system reply for `I_CONFIG`.
    pub fn unit_system(&self) -> &'static str {
        if self.metric {
            "M"
        } else {
            "I"
        }
    }
}
