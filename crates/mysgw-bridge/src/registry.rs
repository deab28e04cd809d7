//! Item associations.
//!
//! The host application owns a set of named items. Each bound item is
//! associated with one gateway channel through a binding string of the form
//! `node;sensor;TYPE`, for example `5;3;V_TEMP` or `7;255;I_BATTERY_LEVEL`.
//!
//! The dispatcher only queries associations through [`ItemRegistry`];
//! [`BindingTable`] is the in-memory implementation used by the runner.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use mysgw_protocol::{ChannelType, ValueKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest numeric field in a binding string.
const MAX_ID_DIGITS: usize = 3;

/// An association declaration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The binding string does not match `node;sensor;TYPE`.
    #[error("invalid binding {binding:?}: {reason}")]
    InvalidBinding {
        /// Binding text as given.
        binding: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The type name is well formed but not in the tables.
    #[error("unknown type {0} in binding")]
    UnknownType(String),

    /// The item kind and the channel have no value kind in common.
    #[error("{kind} item {item} cannot be bound to {channel}")]
    UnsupportedItemKind {
        /// Item name.
        item: String,
        /// Item kind.
        kind: ItemKind,
        /// Channel type name.
        channel: &'static str,
    },

    /// The item is bound twice.
    #[error("item {0} is already bound")]
    DuplicateItem(String),

    /// The channel is already bound to another item.
    #[error("binding {binding} is already used by item {existing}")]
    DuplicateBinding {
        /// The contested binding.
        binding: Binding,
        /// Item that holds it.
        existing: String,
    },
}

// ============================================================================
// Binding
// ============================================================================

/// A gateway channel: node, child sensor and channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    /// Node id.
    pub node_id: u8,
    /// Child sensor id.
    pub sensor_id: u8,
    /// Channel type (`V_*` or `I_*`).
    pub channel: ChannelType,
}

impl Binding {
    /// A binding from its parts.
    pub fn new(node_id: u8, sensor_id: u8, channel: ChannelType) -> Self {
        Binding { node_id, sensor_id, channel }
    }

    /// Channel type name, e.g. `V_TEMP`.
    pub fn type_name(&self) -> &'static str {
        self.channel.name()
    }
}

fn parse_id(binding: &str, field: &str) -> Result<u8, ConfigurationError> {
    let invalid = |reason| ConfigurationError::InvalidBinding { binding: binding.to_string(), reason };
    if field.is_empty() || field.len() > MAX_ID_DIGITS || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("ids must be 1 to 3 decimal digits"));
    }
    field.parse::<u8>().map_err(|_| invalid("ids must be at most 255"))
}

impl FromStr for Binding {
    type Err = ConfigurationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let invalid = |reason| ConfigurationError::InvalidBinding { binding: text.to_string(), reason };

        let fields: Vec<&str> = trimmed.split(';').collect();
        let [node, sensor, type_name] = fields.as_slice() else {
            return Err(invalid("expected node;sensor;TYPE"));
        };
        let node_id = parse_id(text, node)?;
        let sensor_id = parse_id(text, sensor)?;

        let well_formed = (type_name.starts_with("V_") || type_name.starts_with("I_"))
            && type_name.len() > 2
            && type_name[2..].bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
        if !well_formed {
            return Err(invalid("type must look like V_NAME or I_NAME"));
        }
        let channel = ChannelType::from_name(type_name)
            .map_err(|_| ConfigurationError::UnknownType(type_name.to_string()))?;

        Ok(Binding { node_id, sensor_id, channel })
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.node_id, self.sensor_id, self.channel)
    }
}

// ============================================================================
// Item Kinds
// ============================================================================

/// Host item kinds, each accepting an ordered list of value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// On/off switch.
    Switch,
    /// Door or window contact.
    Contact,
    /// Number.
    Number,
    /// Dimmable light.
    Dimmer,
    /// Color light.
    Color,
    /// Text.
    String,
    /// Date and time.
    DateTime,
    /// Geographic location.
    Location,
    /// Blinds and shutters.
    Rollershutter,
}

impl ItemKind {
    /// Value kinds the item accepts, in preference order.
    pub const fn accepted_kinds(self) -> &'static [ValueKind] {
        match self {
            ItemKind::Switch => &[ValueKind::OnOff],
            ItemKind::Contact => &[ValueKind::OpenClosed],
            ItemKind::Number => &[ValueKind::Decimal],
            ItemKind::Dimmer => &[ValueKind::Percent, ValueKind::OnOff, ValueKind::IncreaseDecrease],
            ItemKind::Color => {
                &[ValueKind::Color, ValueKind::Percent, ValueKind::OnOff, ValueKind::IncreaseDecrease]
            }
            ItemKind::String => &[ValueKind::Text],
            ItemKind::DateTime => &[ValueKind::DateTime],
            ItemKind::Location => &[ValueKind::Point],
            ItemKind::Rollershutter => &[ValueKind::Percent, ValueKind::IncreaseDecrease],
        }
    }

    /// Lowercase name, as used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            ItemKind::Switch => "switch",
            ItemKind::Contact => "contact",
            ItemKind::Number => "number",
            ItemKind::Dimmer => "dimmer",
            ItemKind::Color => "color",
            ItemKind::String => "string",
            ItemKind::DateTime => "datetime",
            ItemKind::Location => "location",
            ItemKind::Rollershutter => "rollershutter",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Association lookups the dispatcher needs.
pub trait ItemRegistry: Send + Sync {
    /// Item bound to `type_name` on `node`/`sensor`, if any.
    fn item_for(&self, node_id: u8, sensor_id: u8, type_name: &str) -> Option<String>;

    /// The binding of `item`.
    fn binding(&self, item: &str) -> Option<Binding>;

    /// Value kinds usable for `item` on its channel, in preference order.
    ///
    /// Empty if the item is not bound.
    fn accepted_kinds(&self, item: &str) -> Vec<ValueKind>;
}

#[derive(Debug, Clone)]
struct BoundItem {
    kind: ItemKind,
    binding: Binding,
    kinds: Vec<ValueKind>,
}

/// In-memory association table.
///
/// Filled at configuration time, then shared read-only.
#[derive(Debug, Default, Clone)]
pub struct BindingTable {
    items: HashMap<String, BoundItem>,
    by_channel: HashMap<(u8, u8, &'static str), String>,
}

impl BindingTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `item` of `kind` to the channel described by `binding`.
    ///
    /// The usable value kinds are the item's accepted kinds that the channel
    /// can carry, in the item's order; an empty result is rejected.
    pub fn bind(&mut self, item: &str, kind: ItemKind, binding: &str) -> Result<Binding, ConfigurationError> {
        let binding: Binding = binding.parse()?;
        if self.items.contains_key(item) {
            return Err(ConfigurationError::DuplicateItem(item.to_string()));
        }
        let key = (binding.node_id, binding.sensor_id, binding.type_name());
        if let Some(existing) = self.by_channel.get(&key) {
            return Err(ConfigurationError::DuplicateBinding { binding, existing: existing.clone() });
        }

        let supported = binding.channel.kinds();
        let kinds: Vec<ValueKind> =
            kind.accepted_kinds().iter().copied().filter(|k| supported.contains(k)).collect();
        if kinds.is_empty() {
            return Err(ConfigurationError::UnsupportedItemKind {
                item: item.to_string(),
                kind,
                channel: binding.type_name(),
            });
        }

        self.by_channel.insert(key, item.to_string());
        self.items.insert(item.to_string(), BoundItem { kind, binding, kinds });
        Ok(binding)
    }

    /// Kind of `item`, if bound.
    pub fn item_kind(&self, item: &str) -> Option<ItemKind> {
        self.items.get(item).map(|bound| bound.kind)
    }

    /// Number of bound items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bound item names, sorted.
    pub fn item_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.items.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ItemRegistry for BindingTable {
    fn item_for(&self, node_id: u8, sensor_id: u8, type_name: &str) -> Option<String> {
        // Keys hold the table's own `&'static str`; resolve the name to it first.
        let channel = ChannelType::from_name(type_name).ok()?;
        self.by_channel.get(&(node_id, sensor_id, channel.name())).cloned()
    }

    fn binding(&self, item: &str) -> Option<Binding> {
        self.items.get(item).map(|bound| bound.binding)
    }

    fn accepted_kinds(&self, item: &str) -> Vec<ValueKind> {
        self.items.get(item).map(|bound| bound.kinds.clone()).unwrap_or_default()
    }
}
