//! Gateway attached to a serial device.

use std::sync::Arc;

use mysgw_metrics::LinkLabels;
use mysgw_protocol::Message;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::info;

use crate::config::QUIESCENCE;
use crate::error::TransportError;
use crate::link::{Link, MessageHandler};
use crate::stream::StreamLink;

/// A link over a serial port, 8N1 without flow control.
pub struct SerialLink {
    inner: StreamLink<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Open `port` at `baud` and start delivering frames to `handler`.
    pub fn open(port: &str, baud: u32, handler: Arc<dyn MessageHandler>) -> Result<Self, TransportError> {
        let device = serialport::new(port, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(QUIESCENCE)
            .open()
            .map_err(|err| TransportError::from_serial(port, err))?;
        let reader = device.try_clone().map_err(|err| TransportError::from_serial(port, err))?;

        info!(port, baud, "serial link open");
        let inner = StreamLink::start(LinkLabels::new("serial", port), reader, device, None, handler)?;
        Ok(SerialLink { inner })
    }
}

impl Link for SerialLink {
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
