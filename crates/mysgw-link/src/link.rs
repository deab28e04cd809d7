//! The link abstraction shared by every transport.

use std::sync::Arc;

use mysgw_protocol::Message;

use crate::config::TransportConfig;
use crate::error::TransportError;

/// Receives every frame decoded by a link.
///
/// Called on the link's reader thread, one frame at a time.
pub trait MessageHandler: Send + Sync {
    /// Handle one decoded frame.
    fn handle_message(&self, message: Message);
}

impl<F> MessageHandler for F
where
    F: Fn(Message) + Send + Sync,
{
    fn handle_message(&self, message: Message) {
        self(message)
    }
}

/// An open connection to the gateway.
pub trait Link: Send + Sync {
    /// Write one frame.
    ///
    /// Returns `false` if the link is closed or the write failed; a failed
    /// write also raises the failing flag. Concurrent writes never interleave.
    fn write(&self, message: &Message) -> bool;

    /// Whether an I/O error has been seen since the link was opened.
    ///
    /// The flag is sticky: a failing link stays failing until it is replaced.
    fn is_failing(&self) -> bool;

    /// Stop delivering frames and release the underlying device.
    ///
    /// No frame is delivered after this returns. Calling it again is a no-op.
    fn close(&self);

    /// Short description for logs, e.g. `network 10.0.0.2:5003`.
    fn describe(&self) -> String;
}

/// Opens links from configuration.
pub trait Connector: Send + Sync {
    /// Open a link to `config`, delivering inbound frames to `handler`.
    fn connect(
        &self,
        config: &TransportConfig,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Arc<dyn Link>, TransportError>;
}
