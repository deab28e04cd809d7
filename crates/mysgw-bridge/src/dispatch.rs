//! Protocol dispatcher.
//!
//! Routes every inbound frame either to a housekeeping handler or, through
//! the item registry, to value conversion and the state store. Also turns
//! host commands into `set` frames and keeps the link alive.
//!
//! The only state kept between frames is whether a link is present. Frames
//! from a link that has been replaced or stopped are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use chrono::Utc;
use mysgw_link::{Connector, Link, MessageHandler, TransportError};
use mysgw_metrics::metric_defs;
use mysgw_protocol::{
    presentation, ChannelType, InternalType, Message, MessageType, SubType, GATEWAY_NODE_ID,
};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GatewaySettings;
use crate::registry::{Binding, ItemRegistry};
use crate::state::StateStore;
use crate::value::{from_payload, to_payload, ConversionError, Value};

/// A host command could not be delivered.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No binding for the item.
    #[error("item {0} is not bound")]
    NotBound(String),

    /// The item does not accept values of this kind on its channel.
    #[error("item {item} does not accept {kind} values")]
    KindNotAccepted {
        /// Item name.
        item: String,
        /// Rejected kind.
        kind: mysgw_protocol::ValueKind,
    },

    /// The value could not be rendered for the channel.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// No link is open.
    #[error("gateway is not connected")]
    NotConnected,

    /// The link rejected the write.
    #[error("write to {link} failed")]
    WriteFailed {
        /// Link description.
        link: String,
    },
}

/// What happened to an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Presentation logged.
    Presented,
    /// Housekeeping message logged; nothing else to do.
    Informational,
    /// Housekeeping request answered.
    Replied,
    /// Node id request; automatic id assignment is not provided.
    Unimplemented,
    /// Stream frame dropped.
    Ignored,
    /// Value converted and posted to the state store.
    Forwarded {
        /// Receiving item.
        item: String,
    },
    /// `req` answered from the state store.
    Answered {
        /// Item the value came from.
        item: String,
    },
    /// `req` for an item that has no value yet.
    NoState {
        /// Item that was asked.
        item: String,
    },
    /// Payload could not be converted; nothing was forwarded.
    ConversionFailed {
        /// Item the value was meant for.
        item: String,
    },
    /// No item is bound to the frame's channel.
    NoDestination,
}

/// Outcome of one health check tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// The ping was written and the link is not failing.
    Healthy,
    /// The link failed and was replaced.
    Reconnected,
    /// There was no link and one was opened.
    Connected,
    /// There is no link and opening one failed.
    Disconnected,
}

// ============================================================================
// Dispatcher
// ============================================================================

struct Inner {
    settings: GatewaySettings,
    items: Arc<dyn ItemRegistry>,
    state: Arc<dyn StateStore>,
    connector: Arc<dyn Connector>,
    link: Mutex<Option<Attached>>,
}

/// The current link and the flag its handler checks.
struct Attached {
    link: Arc<dyn Link>,
    live: Arc<AtomicBool>,
}

impl Attached {
    /// Stop routing this link's frames and close it.
    fn retire(self) {
        self.live.store(false, Ordering::Release);
        self.link.close();
    }
}

/// Delivers link frames to the dispatcher without keeping it alive.
///
/// `live` is cleared once the link is replaced or stopped.
struct InboundHandler {
    inner: Weak<Inner>,
    live: Arc<AtomicBool>,
}

impl MessageHandler for InboundHandler {
    fn handle_message(&self, message: Message) {
        if !self.live.load(Ordering::Acquire) {
            debug!(%message, "dropping frame from retired link");
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_message(message);
        }
    }
}

/// Bridges a gateway link to the host's items.
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// A dispatcher with no link. Call [`Dispatcher::start`] to connect.
    pub fn new(
        settings: GatewaySettings,
        items: Arc<dyn ItemRegistry>,
        state: Arc<dyn StateStore>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Dispatcher {
            inner: Arc::new(Inner { settings, items, state, connector, link: Mutex::new(None) }),
        }
    }

    /// Settings this dispatcher was built with.
    pub fn settings(&self) -> &GatewaySettings {
        &self.inner.settings
    }

    /// Open the first link.
    pub fn start(&self) -> Result<(), TransportError> {
        self.inner.connect()
    }

    /// Close the link, if any.
    pub fn stop(&self) {
        let attached = self.inner.link.lock().take();
        if let Some(attached) = attached {
            info!(link = %attached.link.describe(), "stopping gateway link");
            attached.retire();
        }
        metrics::gauge!(metric_defs::LINK_UP.name).set(0.0);
    }

    /// Whether a link is present.
    pub fn is_connected(&self) -> bool {
        self.inner.link.lock().is_some()
    }

    /// Route one inbound frame.
    pub fn handle_message(&self, message: Message) -> Disposition {
        self.inner.handle_message(message)
    }

    /// Convert `value` for `binding` and write it as a `set` frame.
    pub fn send_value(&self, binding: &Binding, value: &Value) -> Result<(), CommandError> {
        self.inner.send_value(binding, value)
    }

    /// Deliver a host command for `item`.
    pub fn receive_command(&self, item: &str, value: &Value) -> Result<(), CommandError> {
        let inner = &self.inner;
        let binding = inner.items.binding(item).ok_or_else(|| CommandError::NotBound(item.to_string()))?;
        let kind = value.kind();
        if !inner.items.accepted_kinds(item).contains(&kind) {
            return Err(CommandError::KindNotAccepted { item: item.to_string(), kind });
        }
        debug!(item, value = %value, binding = %binding, "host command");
        inner.send_value(&binding, value)
    }

    /// Ping the gateway and replace the link if it has failed.
    ///
    /// A missing link is reopened from the stored configuration. When that
    /// fails the link stays absent until the next tick.
    pub fn health_check(&self) -> HealthStatus {
        let inner = &self.inner;
        let current = inner.current_link();

        let mut replaced = false;
        if let Some(link) = current {
            let ping = Message::internal(GATEWAY_NODE_ID, GATEWAY_NODE_ID, InternalType::Version, "");
            if link.write(&ping) && !link.is_failing() {
                debug!(link = %link.describe(), "gateway healthy");
                return HealthStatus::Healthy;
            }
            warn!(link = %link.describe(), "gateway link failed, reconnecting");
            if let Some(attached) = inner.detach(&link) {
                attached.retire();
            } else {
                link.close();
            }
            metrics::counter!(metric_defs::RECONNECTS.name).increment(1);
            replaced = true;
        }

        match inner.connect() {
            Ok(()) if replaced => HealthStatus::Reconnected,
            Ok(()) => HealthStatus::Connected,
            Err(err) => {
                warn!(transport = %inner.settings.transport, error = %err, "gateway unavailable, will retry");
                HealthStatus::Disconnected
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Routing
// ============================================================================

impl Inner {
    fn current_link(&self) -> Option<Arc<dyn Link>> {
        self.link.lock().as_ref().map(|attached| attached.link.clone())
    }

    /// Remove `link` from the slot if it is still the current one.
    fn detach(&self, link: &Arc<dyn Link>) -> Option<Attached> {
        let mut slot = self.link.lock();
        let same = slot.as_ref().is_some_and(|held| {
            Arc::as_ptr(&held.link) as *const () == Arc::as_ptr(link) as *const ()
        });
        if !same {
            return None;
        }
        metrics::gauge!(metric_defs::LINK_UP.name).set(0.0);
        slot.take()
    }

    fn connect(self: &Arc<Self>) -> Result<(), TransportError> {
        let live = Arc::new(AtomicBool::new(true));
        let handler: Arc<dyn MessageHandler> =
            Arc::new(InboundHandler { inner: Arc::downgrade(self), live: live.clone() });
        let link = self.connector.connect(&self.settings.transport, handler).inspect_err(|_| {
            metrics::counter!(metric_defs::CONNECT_FAILURES.name).increment(1);
        })?;
        info!(link = %link.describe(), "gateway link open");

        let previous = self.link.lock().replace(Attached { link, live });
        if let Some(previous) = previous {
            previous.retire();
        }
        metrics::gauge!(metric_defs::LINK_UP.name).set(1.0);
        Ok(())
    }

    fn handle_message(&self, message: Message) -> Disposition {
        let started = Instant::now();
        debug!(%message, "inbound");

        let disposition = match message.sub_type() {
            SubType::Presentation(_) => {
                if let Some(text) = presentation::describe(&message) {
                    info!("{text}");
                }
                Disposition::Presented
            }
            SubType::Stream(stream) => {
                debug!(node = message.node_id, %stream, "stream frames are not handled");
                Disposition::Ignored
            }
            SubType::Internal(internal) => self.handle_internal(&message, internal),
            SubType::Value(_) => self.route(&message),
        };

        metrics::histogram!(metric_defs::DISPATCH_TIME.name).record(started.elapsed().as_micros() as f64);
        disposition
    }

    fn handle_internal(&self, message: &Message, internal: InternalType) -> Disposition {
        let node = message.node_id;
        match internal {
            InternalType::Version => {
                debug!(version = %message.payload, "gateway version");
                Disposition::Informational
            }
            InternalType::GatewayReady => {
                info!(message = %message.payload, "gateway ready");
                Disposition::Informational
            }
            InternalType::LogMessage => {
                debug!(node, log = %message.payload, "gateway log");
                Disposition::Informational
            }
            InternalType::SketchName | InternalType::SketchVersion => {
                info!(node, field = %internal, value = %message.payload, "sketch info");
                Disposition::Informational
            }
            InternalType::Time => {
                let now = Utc::now().timestamp();
                self.write_reply(&message.reply(now.to_string()));
                Disposition::Replied
            }
            InternalType::Config => {
                self.write_reply(&message.reply(self.settings.unit_system()));
                Disposition::Replied
            }
            InternalType::IdRequest => {
                info!(node, "node id requested; automatic id assignment is not available");
                Disposition::Unimplemented
            }
            _ => self.route(message),
        }
    }

    /// Association path for `set`, `req` and the remaining internal frames.
    fn route(&self, message: &Message) -> Disposition {
        let channel = match message.sub_type() {
            SubType::Value(value_type) => ChannelType::Value(value_type),
            SubType::Internal(internal) => ChannelType::Internal(internal),
            _ => return Disposition::Ignored,
        };
        let Some(item) = self.items.item_for(message.node_id, message.sensor_id, channel.name()) else {
            debug!(node = message.node_id, sensor = message.sensor_id, %channel, "no destination");
            metrics::counter!(metric_defs::UNROUTED.name).increment(1);
            return Disposition::NoDestination;
        };

        let disposition = if message.message_type() == MessageType::Req {
            self.answer_request(message, channel, item)
        } else {
            self.forward(message, channel, item)
        };

        if message.ack {
            self.write_reply(&message.acknowledgement());
        }
        disposition
    }

    fn answer_request(&self, message: &Message, channel: ChannelType, item: String) -> Disposition {
        let Some(value) = self.state.current(&item) else {
            debug!(item = %item, "request for item without state");
            return Disposition::NoState { item };
        };
        match to_payload(&value, channel) {
            Ok(payload) => {
                self.write_reply(&message.reply(payload));
                Disposition::Answered { item }
            }
            Err(err) => {
                warn!(item = %item, error = %err, "cannot answer request");
                self.count_conversion_failure(channel, "outbound");
                Disposition::ConversionFailed { item }
            }
        }
    }

    fn forward(&self, message: &Message, channel: ChannelType, item: String) -> Disposition {
        let kinds = self.items.accepted_kinds(&item);
        let Some(kind) = kinds.first().copied() else {
            warn!(item = %item, "item accepts no value kinds");
            return Disposition::ConversionFailed { item };
        };
        match from_payload(kind, &message.payload) {
            Ok(value) => {
                self.state.post_update(&item, value);
                metrics::counter!(metric_defs::VALUES_FORWARDED.name, "value_type" => channel.name())
                    .increment(1);
                Disposition::Forwarded { item }
            }
            Err(err) => {
                warn!(item = %item, error = %err, "dropping inbound value");
                self.count_conversion_failure(channel, "inbound");
                Disposition::ConversionFailed { item }
            }
        }
    }

    fn count_conversion_failure(&self, channel: ChannelType, direction: &'static str) {
        metrics::counter!(
            metric_defs::CONVERSION_FAILURES.name,
            "value_type" => channel.name(),
            "direction" => direction
        )
        .increment(1);
    }

    fn write_reply(&self, reply: &Message) -> bool {
        let Some(link) = self.current_link() else {
            debug!(%reply, "no link for reply");
            return false;
        };
        let written = link.write(reply);
        if written {
            metrics::counter!(metric_defs::REPLIES_SENT.name, "sub_type" => reply.sub_type().name())
                .increment(1);
        }
        written
    }

    fn send_value(&self, binding: &Binding, value: &Value) -> Result<(), CommandError> {
        let payload = to_payload(value, binding.channel).inspect_err(|_| {
            self.count_conversion_failure(binding.channel, "outbound");
        })?;
        let message = match binding.channel {
            ChannelType::Value(value_type) => Message::set(binding.node_id, binding.sensor_id, value_type, payload),
            ChannelType::Internal(internal) => {
                Message::internal(binding.node_id, binding.sensor_id, internal, payload)
            }
        };

        let link = self.current_link().ok_or(CommandError::NotConnected)?;
        if !link.write(&message) {
            return Err(CommandError::WriteFailed { link: link.describe() });
        }
        metrics::counter!(metric_defs::COMMANDS_SENT.name).increment(1);
        Ok(())
    }
}
