//! Subtype tables.
//!
//! Every frame carries a message type and a subtype ordinal whose meaning
//! depends on the message type. The ordinals are the wire contract shared
//! with the node firmware, so each table below is written out explicitly as
//! `code -> name -> description -> capabilities`. Codes are never reordered;
//! new entries are appended at the end of a table.

use std::fmt;

use crate::error::ProtocolError;

// ============================================================================
// Table Plumbing
// ============================================================================

/// Identifies which table a code was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtypeTable {
    /// The message type field itself.
    MessageType,
    /// Sensor profiles announced by `presentation` messages.
    Presentation,
    /// Measurement/actuator channels used by `set` and `req`.
    Value,
    /// Protocol housekeeping used by `internal`.
    Internal,
    /// Bulk transfer used by `stream`.
    Stream,
}

impl fmt::Display for SubtypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubtypeTable::MessageType => "message type",
            SubtypeTable::Presentation => "presentation type",
            SubtypeTable::Value => "value type",
            SubtypeTable::Internal => "internal type",
            SubtypeTable::Stream => "stream type",
        };
        f.write_str(name)
    }
}

/// One row of a subtype table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRow<C: 'static> {
    /// Wire ordinal.
    pub code: u8,
    /// Protocol name, e.g. `V_TEMP`.
    pub name: &'static str,
    /// Human readable description.
    pub description: &'static str,
    /// Capability list (accepted value kinds, or advertised value types).
    pub capabilities: &'static [C],
}

/// Semantic value kinds a channel can be represented as on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Switch state (`ON`/`OFF`).
    OnOff,
    /// Contact state (`OPEN`/`CLOSED`).
    OpenClosed,
    /// Plain number.
    Decimal,
    /// Number in 0..=100.
    Percent,
    /// Relative step (`INCREASE`/`DECREASE`).
    IncreaseDecrease,
    /// RGB color.
    Color,
    /// Geographic position.
    Point,
    /// Point in time.
    DateTime,
    /// Free text.
    Text,
}

impl ValueKind {
    /// Short lowercase name used in logs and configuration.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::OnOff => "onoff",
            ValueKind::OpenClosed => "openclosed",
            ValueKind::Decimal => "decimal",
            ValueKind::Percent => "percent",
            ValueKind::IncreaseDecrease => "increasedecrease",
            ValueKind::Color => "color",
            ValueKind::Point => "point",
            ValueKind::DateTime => "datetime",
            ValueKind::Text => "text",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares a wire enum together with its table.
///
/// The enum discriminant, the position in `ALL` and the row code are all
/// written from the same literal, and the table tests check that they agree
/// with the row index.
macro_rules! wire_table {
    (
        $(#[$meta:meta])*
        pub enum $name:ident in $table:ident ($kind:expr) of $cap:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal, $wire:literal, $desc:literal, [$($item:ident),* $(,)?];
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $code,
            )+
        }

        #[doc = concat!("Wire table backing [`", stringify!($name), "`], indexed by code.")]
        pub static $table: &[TableRow<$cap>] = &[
            $(
                TableRow {
                    code: $code,
                    name: $wire,
                    description: $desc,
                    capabilities: &[$($cap::$item),*],
                },
            )+
        ];

        impl $name {
            /// Every entry, in wire order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The table this type lives in.
            pub const TABLE: SubtypeTable = $kind;

            /// Resolve a wire ordinal.
            pub fn from_code(code: u8) -> Result<Self, ProtocolError> {
                Self::ALL
                    .get(code as usize)
                    .copied()
                    .ok_or(ProtocolError::UnknownSubtype { table: $kind, code })
            }

            /// Resolve a protocol name such as `V_TEMP`.
            pub fn from_name(name: &str) -> Result<Self, ProtocolError> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|entry| entry.name() == name)
                    .ok_or_else(|| ProtocolError::UnknownTypeName(name.to_string()))
            }

            /// The table row for this entry.
            pub fn row(self) -> &'static TableRow<$cap> {
                &$table[self as usize]
            }

            /// Wire ordinal.
            pub fn code(self) -> u8 {
                self as u8
            }

            /// Protocol name.
            pub fn name(self) -> &'static str {
                self.row().name
            }

            /// Human readable description.
            pub fn description(self) -> &'static str {
                self.row().description
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

// ============================================================================
// Message Type
// ============================================================================

/// The message type field. Its discriminant is its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Node/sensor announcement.
    Presentation = 0,
    /// Value push.
    Set = 1,
    /// Value pull request.
    Req = 2,
    /// Protocol housekeeping.
    Internal = 3,
    /// Bulk data (firmware, images).
    Stream = 4,
}

impl MessageType {
    /// Every message type, in wire order.
    pub const ALL: [MessageType; 5] = [
        MessageType::Presentation,
        MessageType::Set,
        MessageType::Req,
        MessageType::Internal,
        MessageType::Stream,
    ];

    /// Resolve a wire ordinal.
    pub fn from_code(code: u8) -> Result<Self, ProtocolError> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(ProtocolError::UnknownSubtype { table: SubtypeTable::MessageType, code })
    }

    /// Wire ordinal.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Lowercase protocol name.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::Presentation => "presentation",
            MessageType::Set => "set",
            MessageType::Req => "req",
            MessageType::Internal => "internal",
            MessageType::Stream => "stream",
        }
    }

    /// The table that interprets subtype codes for this message type.
    pub fn subtype_table(self) -> SubtypeTable {
        match self {
            MessageType::Presentation => SubtypeTable::Presentation,
            MessageType::Set | MessageType::Req => SubtypeTable::Value,
            MessageType::Internal => SubtypeTable::Internal,
            MessageType::Stream => SubtypeTable::Stream,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Presentation Types
// ============================================================================

wire_table! {
    /// Sensor profiles. The value type list is advisory.
    pub enum PresentationType in PRESENTATION_TYPES (SubtypeTable::Presentation) of ValueType {
        Door = 0, "S_DOOR", "Door and window sensor", [Tripped, Armed];
        Motion = 1, "S_MOTION", "Motion sensor", [Tripped, Armed];
        Smoke = 2, "S_SMOKE", "Smoke sensor", [Tripped, Armed];
        Binary = 3, "S_BINARY", "Binary device (on/off)", [Status, Watt];
        Dimmer = 4, "S_DIMMER", "Dimmable device of some kind", [Status, Percentage, Watt];
        Cover = 5, "S_COVER", "Window covers or shades", [Up, Down, Stop, Percentage];
        Temp = 6, "S_TEMP", "Temperature sensor", [Temp, Id];
        Hum = 7, "S_HUM", "Humidity sensor", [Hum];
        Baro = 8, "S_BARO", "Barometer sensor (Pressure)", [Pressure, Forecast];
        Wind = 9, "S_WIND", "Wind sensor", [Wind, Direction, Gust];
        Rain = 10, "S_RAIN", "Rain sensor", [Rain, RainRate];
        Uv = 11, "S_UV", "UV sensor", [Uv];
        Weight = 12, "S_WEIGHT", "Weight sensor for scales etc.", [Weight, Impedance];
        Power = 13, "S_POWER", "Power measuring device, like power meters", [Watt, Kwh];
        Heater = 14, "S_HEATER", "Heater device", [HvacSetpointHeat, HvacFlowState, Temp];
        Distance = 15, "S_DISTANCE", "Distance sensor", [Distance, UnitPrefix];
        LightLevel = 16, "S_LIGHT_LEVEL", "Light sensor", [LightLevel, Level];
        ArduinoNode = 17, "S_ARDUINO_NODE", "Arduino node device", [];
        ArduinoRepeaterNode = 18, "S_ARDUINO_REPEATER_NODE", "Arduino repeating node device", [];
        Lock = 19, "S_LOCK", "Lock device", [LockStatus];
        Ir = 20, "S_IR", "Ir sender/receiver device", [IrSend, IrReceive, IrRecord];
        Water = 21, "S_WATER", "Water meter", [Flow, Volume];
        AirQuality = 22, "S_AIR_QUALITY", "Air quality sensor e.g. MQ-2", [Level, UnitPrefix];
        Custom = 23, "S_CUSTOM", "Unknown custom sensor", [Var1, Var2, Var3, Var4, Var5];
        Dust = 24, "S_DUST", "Dust level sensor", [Level, UnitPrefix];
        SceneController = 25, "S_SCENE_CONTROLLER", "Scene controller device", [SceneOn, SceneOff];
        RgbLight = 26, "S_RGB_LIGHT", "RGB light", [Rgb, Watt];
        RgbwLight = 27, "S_RGBW_LIGHT", "RGBW light (with separate white component)", [Rgbw, Watt];
        ColorSensor = 28, "S_COLOR_SENSOR", "Color sensor", [Rgb];
        Hvac = 29, "S_HVAC", "Thermostat/HVAC device", [HvacSetpointHeat, HvacSetpointCool, HvacFlowState, HvacFlowMode, HvacSpeed];
        Multimeter = 30, "S_MULTIMETER", "Multimeter device", [Voltage, Current, Impedance];
        Sprinkler = 31, "S_SPRINKLER", "Sprinkler device", [Status, Tripped];
        WaterLeak = 32, "S_WATER_LEAK", "Water leak sensor", [Tripped, Armed];
        Sound = 33, "S_SOUND", "Sound sensor", [Level, Tripped, Armed];
        Vibration = 34, "S_VIBRATION", "Vibration sensor", [Level, Tripped, Armed];
        Moisture = 35, "S_MOISTURE", "Moisture sensor", [Level, Tripped, Armed];
        Info = 36, "S_INFO", "LCD text device / Simple information device on controller", [Text];
        Gas = 37, "S_GAS", "Gas meter", [Flow, Volume];
        Gps = 38, "S_GPS", "GPS Sensor", [Position];
    }
}

impl PresentationType {
    /// Value types this profile typically exposes.
    pub fn value_types(self) -> &'static [ValueType] {
        self.row().capabilities
    }

    /// Whether this presentation describes a whole node rather than a child sensor.
    pub fn is_node(self) -> bool {
        matches!(self, PresentationType::ArduinoNode | PresentationType::ArduinoRepeaterNode)
    }
}

// ============================================================================
// Value Types
// ============================================================================

wire_table! {
    /// Measurement and actuator channels used by `set` and `req`.
    pub enum ValueType in VALUE_TYPES (SubtypeTable::Value) of ValueKind {
        Temp = 0, "V_TEMP", "Temperature", [Decimal, Text];
        Hum = 1, "V_HUM", "Humidity", [Decimal, Text];
        Status = 2, "V_STATUS", "Binary status. (on/off)", [OpenClosed, OnOff, Decimal, Text];
        Percentage = 3, "V_PERCENTAGE", "Percentage value. 0-100 (%)", [Percent, Decimal, Text];
        Pressure = 4, "V_PRESSURE", "Atmospheric Pressure", [Decimal, Text];
        Forecast = 5, "V_FORECAST", "Weather forecast. One of \"stable\", \"sunny\", \"cloudy\", \"unstable\", \"thunderstorm\" or \"unknown\"", [Text];
        Rain = 6, "V_RAIN", "Amount of rain", [Decimal, Text];
        RainRate = 7, "V_RAINRATE", "Rate of rain", [Decimal, Text];
        Wind = 8, "V_WIND", "Windspeed", [Decimal, Text];
        Gust = 9, "V_GUST", "Gust", [Decimal, Text];
        Direction = 10, "V_DIRECTION", "Wind direction", [Decimal, Text];
        Uv = 11, "V_UV", "UV light level", [Decimal, Text];
        Weight = 12, "V_WEIGHT", "Weight", [Decimal, Text];
        Distance = 13, "V_DISTANCE", "Distance", [Decimal, Text];
        Impedance = 14, "V_IMPEDANCE", "Impedance value", [Decimal, Text];
        Armed = 15, "V_ARMED", "Armed status of a security sensor. (Armed/Bypassed)", [OpenClosed, OnOff, Decimal, Text];
        Tripped = 16, "V_TRIPPED", "Tripped status of a security sensor. (Tripped/Untripped)", [OpenClosed, OnOff, Decimal, Text];
        Watt = 17, "V_WATT", "Watt value for power meters", [Decimal, Text];
        Kwh = 18, "V_KWH", "Accumulated number of KWH for a power meter", [Decimal, Text];
        SceneOn = 19, "V_SCENE_ON", "Turn on a scene", [OpenClosed, OnOff, Decimal, Text];
        SceneOff = 20, "V_SCENE_OFF", "Turn off a scene", [OpenClosed, OnOff, Decimal, Text];
        HvacFlowState = 21, "V_HVAC_FLOW_STATE", "Mode of heater. One of \"Off\", \"HeatOn\", \"CoolOn\", or \"AutoChangeOver\"", [Text];
        HvacSpeed = 22, "V_HVAC_SPEED", "HVAC/Heater fan speed (\"Min\", \"Normal\", \"Max\", \"Auto\")", [Text];
        LightLevel = 23, "V_LIGHT_LEVEL", "Uncalibrated light level. 0-100 (%)", [Percent, Decimal, Text];
        Var1 = 24, "V_VAR1", "Custom value", [Point, DateTime, IncreaseDecrease, Percent, OpenClosed, OnOff, Decimal, Text];
        Var2 = 25, "V_VAR2", "Custom value", [Point, DateTime, IncreaseDecrease, Percent, OpenClosed, OnOff, Decimal, Text];
        Var3 = 26, "V_VAR3", "Custom value", [Point, DateTime, IncreaseDecrease, Percent, OpenClosed, OnOff, Decimal, Text];
        Var4 = 27, "V_VAR4", "Custom value", [Point, DateTime, IncreaseDecrease, Percent, OpenClosed, OnOff, Decimal, Text];
        Var5 = 28, "V_VAR5", "Custom value", [Point, DateTime, IncreaseDecrease, Percent, OpenClosed, OnOff, Decimal, Text];
        Up = 29, "V_UP", "Window covering. Up.", [OpenClosed, OnOff, Decimal, Text];
        Down = 30, "V_DOWN", "Window covering. Down.", [OpenClosed, OnOff, Decimal, Text];
        Stop = 31, "V_STOP", "Window covering. Stop.", [OpenClosed, OnOff, Decimal, Text];
        IrSend = 32, "V_IR_SEND", "Send out an IR-command", [Text];
        IrReceive = 33, "V_IR_RECEIVE", "This message contains a received IR-command", [Text];
        Flow = 34, "V_FLOW", "Flow of water (in meter)", [Decimal, Text];
        Volume = 35, "V_VOLUME", "Water volume", [Decimal, Text];
        LockStatus = 36, "V_LOCK_STATUS", "Set or get lock status. (Locked/Unlocked)", [OnOff, Decimal, Text];
        Level = 37, "V_LEVEL", "Used for sending level-value", [Percent, Decimal, Text];
        Voltage = 38, "V_VOLTAGE", "Voltage level", [Percent, Decimal, Text];
        Current = 39, "V_CURRENT", "Current level", [Percent, Decimal, Text];
        Rgb = 40, "V_RGB", "RGB value transmitted as ASCII hex string (I.e \"ff0000\" for red)", [OnOff, Color, Text];
        Rgbw = 41, "V_RGBW", "RGBW value transmitted as ASCII hex string (I.e \"ff0000ff\" for red + full white)", [OnOff, Percent, Color, Text];
        Id = 42, "V_ID", "Optional unique sensor id (e.g. OneWire DS1820b ids)", [Decimal, Text];
        UnitPrefix = 43, "V_UNIT_PREFIX", "Unit prefix string displayed by the controller, e.g. cm, m, km, inch. Not parsed.", [Text];
        HvacSetpointCool = 44, "V_HVAC_SETPOINT_COOL", "HVAC cold setpoint", [];
        HvacSetpointHeat = 45, "V_HVAC_SETPOINT_HEAT", "HVAC/Heater setpoint", [];
        HvacFlowMode = 46, "V_HVAC_FLOW_MODE", "Flow mode for HVAC (\"Auto\", \"ContinuousOn\", \"PeriodicOn\")", [Text];
        Text = 47, "V_TEXT", "Text message to display on LCD or controller device", [Text];
        Custom = 48, "V_CUSTOM", "Custom messages used for controller/inter node specific commands", [Point, DateTime, IncreaseDecrease, Percent, OpenClosed, OnOff, Decimal, Text];
        Position = 49, "V_POSITION", "GPS position and altitude. Payload: latitude;longitude;altitude(m). E.g. \"55.722526;13.017972;18\"", [Point, Text];
        IrRecord = 50, "V_IR_RECORD", "Record IR codes", [];
    }
}

impl ValueType {
    /// Accepted value kinds, in preference order.
    pub fn kinds(self) -> &'static [ValueKind] {
        self.row().capabilities
    }

    /// Full-color channels carry `rrggbb` hex instead of a boolean.
    pub fn is_color(self) -> bool {
        matches!(self, ValueType::Rgb | ValueType::Rgbw)
    }
}

// ============================================================================
// Internal Types
// ============================================================================

wire_table! {
    /// Protocol housekeeping subtypes.
    pub enum InternalType in INTERNAL_TYPES (SubtypeTable::Internal) of ValueKind {
        BatteryLevel = 0, "I_BATTERY_LEVEL", "Use this to report the battery level 0-100 (%)", [Percent, Decimal, Text];
        Time = 1, "I_TIME", "Sensors can request the current time from the Controller using this message. The time will be reported as the seconds since 1970", [];
        Version = 2, "I_VERSION", "Used to request gateway version from controller.", [];
        IdRequest = 3, "I_ID_REQUEST", "Use this to request a unique node id from the controller.", [];
        IdResponse = 4, "I_ID_RESPONSE", "Id response back to sensor. Payload contains sensor id", [];
        InclusionMode = 5, "I_INCLUSION_MODE", "Start/stop inclusion mode of the Controller (1=start, 0=stop)", [OnOff, Text, Decimal];
        Config = 6, "I_CONFIG", "Config request from node. Reply with (M)etric or (I)mperial back to sensor", [];
        FindParent = 7, "I_FIND_PARENT", "When a sensor starts up, it broadcast a search request to all neighbor nodes. They reply with a I_FIND_PARENT_RESPONSE", [];
        FindParentResponse = 8, "I_FIND_PARENT_RESPONSE", "Reply message type to I_FIND_PARENT request", [];
        LogMessage = 9, "I_LOG_MESSAGE", "Sent by the gateway to the Controller to trace-log a message", [Text];
        Children = 10, "I_CHILDREN", "A message that can be used to transfer child sensors (from EEPROM routing table) of a repeating node.", [];
        SketchName = 11, "I_SKETCH_NAME", "Sketch name that can be used to identify sensor", [Text];
        SketchVersion = 12, "I_SKETCH_VERSION", "Sketch version that can be reported to keep track of the version of sensor", [Text];
        Reboot = 13, "I_REBOOT", "Used by OTA firmware updates. Request for node to reboot.", [];
        GatewayReady = 14, "I_GATEWAY_READY", "Send by gateway to controller when startup is complete.", [Text];
        RequestSigning = 15, "I_REQUEST_SIGNING", "Used between sensors when initiating signing.", [];
        GetNonce = 16, "I_GET_NONCE", "Used between sensors when requesting nonce.", [];
        GetNonceResponse = 17, "I_GET_NONCE_RESPONSE", "Used between sensors for nonce response.", [];
        Heartbeat = 18, "I_HEARTBEAT", "Heartbeat request or response", [];
        Presentation = 19, "I_PRESENTATION", "Request a node to present itself", [];
        Discover = 20, "I_DISCOVER", "Discover nodes in the network", [];
        DiscoverResponse = 21, "I_DISCOVER_RESPONSE", "Reply to a discover request", [];
    }
}

impl InternalType {
    /// Accepted value kinds when an internal channel is bound to an item.
    pub fn kinds(self) -> &'static [ValueKind] {
        self.row().capabilities
    }
}

// ============================================================================
// Stream Types
// ============================================================================

wire_table! {
    /// Bulk transfer subtypes. Listed for decoding only.
    pub enum StreamType in STREAM_TYPES (SubtypeTable::Stream) of ValueKind {
        FirmwareConfigRequest = 0, "ST_FIRMWARE_CONFIG_REQUEST", "Request new firmware configuration", [];
        FirmwareConfigResponse = 1, "ST_FIRMWARE_CONFIG_RESPONSE", "Firmware configuration for a node", [];
        FirmwareRequest = 2, "ST_FIRMWARE_REQUEST", "Request a firmware block", [];
        FirmwareResponse = 3, "ST_FIRMWARE_RESPONSE", "Firmware block", [];
        Sound = 4, "ST_SOUND", "Sound data", [];
        Image = 5, "ST_IMAGE", "Image data", [];
    }
}

// ============================================================================
// Subtype
// ============================================================================

/// A subtype resolved against the table its message type selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubType {
    /// Subtype of a `presentation` message.
    Presentation(PresentationType),
    /// Subtype of a `set` or `req` message.
    Value(ValueType),
    /// Subtype of an `internal` message.
    Internal(InternalType),
    /// Subtype of a `stream` message.
    Stream(StreamType),
}

impl SubType {
    /// Resolve `code` in the table selected by `message_type`.
    pub fn resolve(message_type: MessageType, code: u8) -> Result<Self, ProtocolError> {
        Ok(match message_type {
            MessageType::Presentation => SubType::Presentation(PresentationType::from_code(code)?),
            MessageType::Set | MessageType::Req => SubType::Value(ValueType::from_code(code)?),
            MessageType::Internal => SubType::Internal(InternalType::from_code(code)?),
            MessageType::Stream => SubType::Stream(StreamType::from_code(code)?),
        })
    }

    /// Wire ordinal.
    pub fn code(self) -> u8 {
        match self {
            SubType::Presentation(t) => t.code(),
            SubType::Value(t) => t.code(),
            SubType::Internal(t) => t.code(),
            SubType::Stream(t) => t.code(),
        }
    }

    /// Protocol name.
    pub fn name(self) -> &'static str {
        match self {
            SubType::Presentation(t) => t.name(),
            SubType::Value(t) => t.name(),
            SubType::Internal(t) => t.name(),
            SubType::Stream(t) => t.name(),
        }
    }

    /// Human readable description.
    pub fn description(self) -> &'static str {
        match self {
            SubType::Presentation(t) => t.description(),
            SubType::Value(t) => t.description(),
            SubType::Internal(t) => t.description(),
            SubType::Stream(t) => t.description(),
        }
    }

    /// The table this subtype was resolved in.
    pub fn table(self) -> SubtypeTable {
        match self {
            SubType::Presentation(_) => SubtypeTable::Presentation,
            SubType::Value(_) => SubtypeTable::Value,
            SubType::Internal(_) => SubtypeTable::Internal,
            SubType::Stream(_) => SubtypeTable::Stream,
        }
    }

    /// Whether this subtype may travel with `message_type`.
    pub fn fits(self, message_type: MessageType) -> bool {
        self.table() == message_type.subtype_table()
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Bindable Types
// ============================================================================

/// A type name that an application item can be bound to (`V_*` or `I_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// A `set`/`req` channel.
    Value(ValueType),
    /// An internal channel such as `I_BATTERY_LEVEL`.
    Internal(InternalType),
}

impl ChannelType {
    /// Resolve a binding type name.
    pub fn from_name(name: &str) -> Result<Self, ProtocolError> {
        if name.starts_with("V_") {
            ValueType::from_name(name).map(ChannelType::Value)
        } else if name.starts_with("I_") {
            InternalType::from_name(name).map(ChannelType::Internal)
        } else {
            Err(ProtocolError::UnknownTypeName(name.to_string()))
        }
    }

    /// Wire ordinal.
    pub fn code(self) -> u8 {
        match self {
            ChannelType::Value(t) => t.code(),
            ChannelType::Internal(t) => t.code(),
        }
    }

    /// Protocol name.
    pub fn name(self) -> &'static str {
        match self {
            ChannelType::Value(t) => t.name(),
            ChannelType::Internal(t) => t.name(),
        }
    }

    /// Capability list.
    pub fn kinds(self) -> &'static [ValueKind] {
        match self {
            ChannelType::Value(t) => t.kinds(),
            ChannelType::Internal(t) => t.kinds(),
        }
    }

    /// Whether this channel is a full-color light channel.
    pub fn is_color(self) -> bool {
        matches!(self, ChannelType::Value(t) if t.is_color())
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rows_match_index<C>(table: &[TableRow<C>]) {
        for (index, row) in table.iter().enumerate() {
            assert_eq!(row.code as usize, index, "row {} has code {}", row.name, row.code);
        }
    }

    #[test]
    fn test_table_codes_equal_position() {
        assert_rows_match_index(PRESENTATION_TYPES);
        assert_rows_match_index(VALUE_TYPES);
        assert_rows_match_index(INTERNAL_TYPES);
        assert_rows_match_index(STREAM_TYPES);
    }

    #[test]
    fn test_enum_discriminants_equal_position() {
        for (index, t) in ValueType::ALL.iter().enumerate() {
            assert_eq!(t.code() as usize, index);
        }
        for (index, t) in PresentationType::ALL.iter().enumerate() {
            assert_eq!(t.code() as usize, index);
        }
        for (index, t) in InternalType::ALL.iter().enumerate() {
            assert_eq!(t.code() as usize, index);
        }
        for (index, t) in StreamType::ALL.iter().enumerate() {
            assert_eq!(t.code() as usize, index);
        }
        for (index, t) in MessageType::ALL.iter().enumerate() {
            assert_eq!(t.code() as usize, index);
        }
        assert_eq!(ValueType::ALL.len(), VALUE_TYPES.len());
        assert_eq!(PresentationType::ALL.len(), PRESENTATION_TYPES.len());
        assert_eq!(InternalType::ALL.len(), INTERNAL_TYPES.len());
        assert_eq!(StreamType::ALL.len(), STREAM_TYPES.len());
    }

    #[test]
    fn test_pinned_wire_codes() {
        // Codes shared with the node firmware.
        assert_eq!(ValueType::Temp.code(), 0);
        assert_eq!(ValueType::Status.code(), 2);
        assert_eq!(ValueType::Tripped.code(), 16);
        assert_eq!(ValueType::Rgb.code(), 40);
        assert_eq!(ValueType::Text.code(), 47);
        assert_eq!(ValueType::Position.code(), 49);
        assert_eq!(InternalType::Time.code(), 1);
        assert_eq!(InternalType::Version.code(), 2);
        assert_eq!(InternalType::IdRequest.code(), 3);
        assert_eq!(InternalType::Config.code(), 6);
        assert_eq!(InternalType::GatewayReady.code(), 14);
        assert_eq!(PresentationType::ArduinoNode.code(), 17);
        assert_eq!(PresentationType::Gps.code(), 38);
        assert_eq!(MessageType::Internal.code(), 3);
    }

    #[test]
    fn test_names_are_unique_and_resolve_back() {
        for t in ValueType::ALL {
            assert_eq!(ValueType::from_name(t.name()).unwrap(), *t);
        }
        for t in InternalType::ALL {
            assert_eq!(InternalType::from_name(t.name()).unwrap(), *t);
        }
        for t in PresentationType::ALL {
            assert_eq!(PresentationType::from_name(t.name()).unwrap(), *t);
        }
    }

    #[test]
    fn test_out_of_range_code_is_unknown_subtype() {
        let err = ValueType::from_code(VALUE_TYPES.len() as u8).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownSubtype { table: SubtypeTable::Value, code: VALUE_TYPES.len() as u8 }
        );
        assert!(MessageType::from_code(5).is_err());
        assert!(StreamType::from_code(200).is_err());
    }

    #[test]
    fn test_subtype_resolution_follows_message_type() {
        assert_eq!(
            SubType::resolve(MessageType::Req, 0).unwrap(),
            SubType::Value(ValueType::Temp)
        );
        assert_eq!(
            SubType::resolve(MessageType::Internal, 0).unwrap(),
            SubType::Internal(InternalType::BatteryLevel)
        );
        assert_eq!(
            SubType::resolve(MessageType::Presentation, 0).unwrap(),
            SubType::Presentation(PresentationType::Door)
        );
        // 22 is a valid value type but not a valid internal type.
        assert!(SubType::resolve(MessageType::Set, 22).is_ok());
        assert!(SubType::resolve(MessageType::Internal, 22).is_err());
    }

    #[test]
    fn test_channel_type_resolution() {
        let channel = ChannelType::from_name("V_RGB").unwrap();
        assert_eq!(channel, ChannelType::Value(ValueType::Rgb));
        assert!(channel.is_color());
        assert_eq!(channel.kinds(), &[ValueKind::OnOff, ValueKind::Color, ValueKind::Text]);

        let battery = ChannelType::from_name("I_BATTERY_LEVEL").unwrap();
        assert_eq!(battery.code(), 0);

        assert!(ChannelType::from_name("S_DOOR").is_err());
        assert!(ChannelType::from_name("V_NOPE").is_err());
    }

    #[test]
    fn test_presentation_value_types() {
        assert_eq!(PresentationType::Gps.value_types(), &[ValueType::Position]);
        assert!(PresentationType::ArduinoNode.is_node());
        assert!(!PresentationType::Door.is_node());
    }
}
