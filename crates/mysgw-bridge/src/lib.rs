//! Bridge between a sensor-network gateway link and host items.
//!
//! The [`Dispatcher`] owns at most one [`Link`](mysgw_link::Link). Every frame
//! the link delivers is routed by message type:
//!
//! - presentations are described in the log;
//! - housekeeping requests (`I_TIME`, `I_CONFIG`) are answered directly;
//! - values and the remaining internal frames are looked up in an
//!   [`ItemRegistry`], converted by [`from_payload`] and posted to a
//!   [`StateStore`]. `req` frames are answered from the store instead.
//!
//! Host commands travel the other way through [`Dispatcher::receive_command`].
//! A [`HealthMonitor`] pings the gateway periodically and replaces the link
//! when it has failed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mysgw_bridge::{BindingTable, Dispatcher, Disposition, GatewaySettings, ItemKind, MemoryStateStore};
//! use mysgw_link::{StreamConnector, TransportConfig};
//! use mysgw_protocol::{Message, ValueType};
//!
//! let mut items = BindingTable::new();
//! items.bind("Kitchen_Temp", ItemKind::Number, "5;3;V_TEMP").unwrap();
//! let state = Arc::new(MemoryStateStore::new());
//!
//! let dispatcher = Dispatcher::new(
//!     GatewaySettings::new(TransportConfig::serial("/dev/ttyUSB0")),
//!     Arc::new(items),
//!     state.clone(),
//!     Arc::new(StreamConnector),
//! );
//!
//! let disposition = dispatcher.handle_message(Message::set(5, 3, ValueType::Temp, "21.5"));
//! assert_eq!(disposition, Disposition::Forwarded { item: "Kitchen_Temp".into() });
//! ```

mod config;
mod dispatch;
mod health;
mod registry;
mod state;
mod value;

pub use config::*;
pub use dispatch::{CommandError, Dispatcher, Disposition, HealthStatus};
pub use health::HealthMonitor;
pub use registry::*;
pub use state::*;
pub use value::*;
