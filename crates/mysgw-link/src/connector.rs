use std::sync::Arc;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::link::{Connector, Link, MessageHandler};
use crate::network::NetworkLink;
use crate::serial::SerialLink;

/// Opens a [`SerialLink`] or a [`NetworkLink`] depending on the configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamConnector;

impl Connector for StreamConnector {
    fn connect(
        &self,
        config: &TransportConfig,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Arc<dyn Link>, TransportError> {
        let link: Arc<dyn Link> = match config {
            TransportConfig::Serial { port, baud } => Arc::new(SerialLink::open(port, *baud, handler)?),
            TransportConfig::Network { host, port } => Arc::new(NetworkLink::connect(host, *port, handler)?),
        };
        Ok(link)
    }
}
