//! Transport links to a sensor-network gateway.
//!
//! A [`Link`] carries gateway frames over either a serial device
//! ([`SerialLink`]) or a TCP connection ([`NetworkLink`]). Both variants share
//! the same discipline:
//!
//! - one reader thread per link accumulates bytes until the stream has been
//!   quiet for [`QUIESCENCE`], then splits complete lines, decodes them and
//!   hands each [`Message`](mysgw_protocol::Message) to the registered
//!   [`MessageHandler`];
//! - writes are serialized by a lock so frames never interleave;
//! - I/O errors never escape a write. They raise a sticky failing flag that
//!   the owner polls and answers by replacing the link.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mysgw_link::{Connector, Link, MessageHandler, StreamConnector, TransportConfig};
//! use mysgw_protocol::{InternalType, Message};
//!
//! let handler: Arc<dyn MessageHandler> = Arc::new(|msg: Message| println!("{msg}"));
//! let config = TransportConfig::network("192.168.1.50", 5003);
//! let link = StreamConnector.connect(&config, handler)?;
//! link.write(&Message::internal(0, 0, InternalType::Version, ""));
//! link.close();
//! # Ok::<(), mysgw_link::TransportError>(())
//! ```

mod config;
mod connector;
mod error;
mod link;
mod network;
mod serial;
mod stream;

pub use config::*;
pub use connector::StreamConnector;
pub use error::TransportError;
pub use link::{Connector, Link, MessageHandler};
pub use network::NetworkLink;
pub use serial::SerialLink;
