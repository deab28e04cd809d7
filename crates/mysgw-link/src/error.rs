//! Error types for opening a link.
//!
//! Once a link is open, I/O failures are never returned to callers; they set
//! the link's failing flag instead.

use std::io;

use thiserror::Error;

/// Failure to establish a link.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serial device does not exist.
    #[error("serial device {port} not found")]
    DeviceNotFound {
        /// Device path or name.
        port: String,
    },

    /// The serial device exists but could not be opened or configured.
    #[error("failed to open serial device {port}: {source}")]
    Open {
        /// Device path or name.
        port: String,
        /// Underlying driver error.
        #[source]
        source: serialport::Error,
    },

    /// The host name did not resolve to any address.
    #[error("could not resolve {host}")]
    Resolve {
        /// Host name as configured.
        host: String,
    },

    /// TCP connection failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// `host:port` that was tried.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure while setting the link up.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Map a serial driver error for `port`.
    pub(crate) fn from_serial(port: &str, source: serialport::Error) -> Self {
        match source.kind {
            serialport::ErrorKind::NoDevice
            | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
                TransportError::DeviceNotFound { port: port.to_string() }
            }
            _ => TransportError::Open { port: port.to_string(), source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_device_maps_to_not_found() {
        let err = TransportError::from_serial(
            "/dev/ttyNOPE",
            serialport::Error::new(serialport::ErrorKind::NoDevice, "gone"),
        );
        assert!(matches!(err, TransportError::DeviceNotFound { ref port } if port == "/dev/ttyNOPE"));
    }

    #[test]
    fn test_bad_parameters_map_to_open() {
        let err = TransportError::from_serial(
            "COM3",
            serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad baud"),
        );
        assert!(matches!(err, TransportError::Open { .. }));
        assert!(err.to_string().contains("COM3"));
    }
}
