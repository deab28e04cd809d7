//! Transport configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default serial speed of the gateway firmware.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default TCP port of an Ethernet gateway.
pub const DEFAULT_NETWORK_PORT: u16 = 5003;

/// Bytes are accumulated until the stream has been idle this long.
pub const QUIESCENCE: Duration = Duration::from_millis(100);

/// Upper bound on establishing a TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn default_baud() -> u32 {
    DEFAULT_BAUD
}

fn default_network_port() -> u16 {
    DEFAULT_NETWORK_PORT
}

/// Where the gateway lives.
///
/// ```yaml
/// kind: serial
/// port: /dev/ttyUSB0
/// baud: 115200
/// ```
///
/// ```yaml
/// kind: network      # or `ethernet`
/// host: 192.168.1.50
/// port: 5003
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Gateway attached to a serial device.
    Serial {
        /// Device path (`/dev/ttyUSB0`) or name (`COM3`).
        port: String,
        /// Line speed.
        #[serde(default = "default_baud")]
        baud: u32,
    },
    /// Gateway reachable over TCP.
    #[serde(alias = "ethernet")]
    Network {
        /// Host name or address.
        host: String,
        /// TCP port.
        #[serde(default = "default_network_port")]
        port: u16,
    },
}

impl TransportConfig {
    /// A serial configuration at the default speed.
    pub fn serial(port: impl Into<String>) -> Self {
        TransportConfig::Serial { port: port.into(), baud: DEFAULT_BAUD }
    }

    /// A network configuration.
    pub fn network(host: impl Into<String>, port: u16) -> Self {
        TransportConfig::Network { host: host.into(), port }
    }

    /// `serial` or `network`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TransportConfig::Serial { .. } => "serial",
            TransportConfig::Network { .. } => "network",
        }
    }

    /// Device path or `host:port`.
    pub fn endpoint(&self) -> String {
        match self {
            TransportConfig::Serial { port, .. } => port.clone(),
            TransportConfig::Network { host, port } => format!("{host}:{port}"),
        }
    }
}

impl fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportConfig::Serial { port, baud } => write!(f, "serial {port} @ {baud}"),
            TransportConfig::Network { host, port } => write!(f, "network {host}:{port}"),
        }
    }
}
