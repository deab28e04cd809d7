//! Gateway reachable over TCP (Ethernet gateway).

use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;

use mysgw_metrics::LinkLabels;
use mysgw_protocol::Message;
use tracing::{debug, info};

use crate::config::{CONNECT_TIMEOUT, QUIESCENCE};
use crate::error::TransportError;
use crate::link::{Link, MessageHandler};
use crate::stream::{ShutdownFn, StreamLink};

/// A link over a TCP connection.
pub struct NetworkLink {
    inner: StreamLink<TcpStream>,
}

impl NetworkLink {
    /// Connect to `host:port` and start delivering frames to `handler`.
    ///
    /// Every resolved address is tried in turn.
    pub fn connect(host: &str, port: u16, handler: Arc<dyn MessageHandler>) -> Result<Self, TransportError> {
        let endpoint = format!("{host}:{port}");
        let addrs: Vec<_> = (host, port)
            .to_socket_addrs()
            .map_err(|_| TransportError::Resolve { host: host.to_string() })?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::Resolve { host: host.to_string() });
        }

        let mut last_err = None;
        let mut connected = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }
        let stream = match (connected, last_err) {
            (Some(stream), _) => stream,
            (None, Some(source)) => return Err(TransportError::Connect { addr: endpoint, source }),
            (None, None) => return Err(TransportError::Resolve { host: host.to_string() }),
        };

        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(QUIESCENCE))?;
        let reader = stream.try_clone()?;
        let control = stream.try_clone()?;
        let shutdown: ShutdownFn = Box::new(move || control.shutdown(Shutdown::Both));

        info!(endpoint = %endpoint, "network link open");
        let inner = StreamLink::start(LinkLabels::new("network", endpoint), reader, stream, Some(shutdown), handler)?;
        Ok(NetworkLink { inner })
    }
}

impl Link for NetworkLink {
    fn write(&self, message: &Message) -> bool {
        self.inner.write(message)
    }

    fn is_failing(&self) -> bool {
        self.inner.is_failing()
    }

    fn close(&self) {
        self.inner.close()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}
