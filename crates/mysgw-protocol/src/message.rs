//! The gateway frame.
//!
//! ```text
//! node-id ; child-sensor-id ; message-type ; ack ; sub-type ; payload \n
//! ```
//!
//! The first five fields are decimal numbers. The payload is everything after
//! the fifth `;` and may itself contain `;` (GPS positions are sent as
//! `lat;lon;alt`), but never `\n` or `\r`.

use std::fmt;

use crate::error::{DecodeResult, ParseError, ProtocolError};
use crate::types::{InternalType, MessageType, PresentationType, StreamType, SubType, ValueType};

/// Field separator.
pub const FIELD_SEPARATOR: char = ';';

/// Number of fields in a frame, payload included.
pub const FIELD_COUNT: usize = 6;

/// Node id of the gateway itself.
pub const GATEWAY_NODE_ID: u8 = 0;

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    /// Originating (inbound) or destination (outbound) node.
    pub node_id: u8,
    /// Child sensor within the node.
    pub sensor_id: u8,
    /// Message type; selects the table `sub_type` comes from.
    message_type: MessageType,
    /// Whether the sender asks for an echo.
    pub ack: bool,
    sub_type: SubType,
    /// Raw payload text.
    pub payload: String,
}

impl Message {
    /// Build a frame from raw codes, validating the subtype against the
    /// table its message type selects.
    pub fn new(
        node_id: u8,
        sensor_id: u8,
        message_type: MessageType,
        ack: bool,
        sub_type_code: u8,
        payload: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let sub_type = SubType::resolve(message_type, sub_type_code)?;
        let payload = checked_payload(payload.into())?;
        Ok(Message { node_id, sensor_id, message_type, ack, sub_type, payload })
    }

    /// Build a frame from an already resolved subtype.
    ///
    /// `req` and `set` share the value table, so the subtype alone does not
    /// determine the message type.
    pub fn with_sub_type(
        node_id: u8,
        sensor_id: u8,
        message_type: MessageType,
        sub_type: SubType,
        payload: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        if !sub_type.fits(message_type) {
            return Err(ProtocolError::MismatchedSubtype {
                message_type: message_type.name(),
                sub_type: sub_type.name(),
            });
        }
        let payload = checked_payload(payload.into())?;
        Ok(Message { node_id, sensor_id, message_type, ack: false, sub_type, payload })
    }

    // The typed constructors below do not inspect the payload. A payload with
    // a line break produces a frame that fails `is_encodable` and is refused
    // by links.

    /// A `presentation` frame.
    pub fn presentation(node_id: u8, sensor_id: u8, t: PresentationType, payload: impl Into<String>) -> Self {
        Self::unchecked(node_id, sensor_id, MessageType::Presentation, SubType::Presentation(t), payload)
    }

    /// A `set` frame.
    pub fn set(node_id: u8, sensor_id: u8, t: ValueType, payload: impl Into<String>) -> Self {
        Self::unchecked(node_id, sensor_id, MessageType::Set, SubType::Value(t), payload)
    }

    /// A `req` frame.
    pub fn request(node_id: u8, sensor_id: u8, t: ValueType) -> Self {
        Self::unchecked(node_id, sensor_id, MessageType::Req, SubType::Value(t), String::new())
    }

    /// An `internal` frame.
    pub fn internal(node_id: u8, sensor_id: u8, t: InternalType, payload: impl Into<String>) -> Self {
        Self::unchecked(node_id, sensor_id, MessageType::Internal, SubType::Internal(t), payload)
    }

    /// A `stream` frame.
    pub fn stream(node_id: u8, sensor_id: u8, t: StreamType, payload: impl Into<String>) -> Self {
        Self::unchecked(node_id, sensor_id, MessageType::Stream, SubType::Stream(t), payload)
    }

    /// Whether the payload can travel in a single line.
    pub fn is_encodable(&self) -> bool {
        !has_line_break(&self.payload)
    }

    /// Set the ack flag.
    pub fn with_ack(mut self, ack: bool) -> Self {
        self.ack = ack;
        self
    }

    fn unchecked(
        node_id: u8,
        sensor_id: u8,
        message_type: MessageType,
        sub_type: SubType,
        payload: impl Into<String>,
    ) -> Self {
        Message { node_id, sensor_id, message_type, ack: false, sub_type, payload: payload.into() }
    }

    /// Message type.
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Resolved subtype.
    pub fn sub_type(&self) -> SubType {
        self.sub_type
    }

    // ========================================================================
    // Wire Format
    // ========================================================================

    /// Decode one line. A single trailing `\n` or `\r\n` is ignored.
    pub fn decode(line: &str) -> DecodeResult<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let fields: Vec<&str> = line.splitn(FIELD_COUNT, FIELD_SEPARATOR).collect();
        if fields.len() < FIELD_COUNT {
            return Err(ParseError::FieldCount { found: fields.len() }.into());
        }

        let node_id = parse_number("node-id", fields[0])?;
        let sensor_id = parse_number("child-sensor-id", fields[1])?;
        let type_code = parse_number("message-type", fields[2])?;
        let ack = parse_ack(fields[3])?;
        let sub_type_code = parse_number("sub-type", fields[4])?;

        let message_type = MessageType::from_code(type_code)?;
        let message = Message::new(node_id, sensor_id, message_type, ack, sub_type_code, fields[5])?;
        Ok(message)
    }

    /// Encode as a newline-terminated line.
    pub fn encode(&self) -> String {
        format!(
            "{};{};{};{};{};{}\n",
            self.node_id,
            self.sensor_id,
            self.message_type.code(),
            u8::from(self.ack),
            self.sub_type.code(),
            self.payload
        )
    }

    // ========================================================================
    // Replies
    // ========================================================================

    /// A response addressed back to this message's node and sensor.
    ///
    /// `req` answers as `set` and `I_ID_REQUEST` answers as `I_ID_RESPONSE`;
    /// everything else keeps its type. The ack flag is cleared.
    pub fn reply(&self, payload: impl Into<String>) -> Message {
        let (message_type, sub_type) = match (self.message_type, self.sub_type) {
            (MessageType::Req, sub_type) => (MessageType::Set, sub_type),
            (MessageType::Internal, SubType::Internal(InternalType::IdRequest)) => {
                (MessageType::Internal, SubType::Internal(InternalType::IdResponse))
            }
            other => other,
        };
        Self::unchecked(self.node_id, self.sensor_id, message_type, sub_type, payload)
    }

    /// Delivery acknowledgement: the same frame with the ack flag cleared.
    pub fn acknowledgement(&self) -> Message {
        Message { ack: false, ..self.clone() }
    }
}

fn has_line_break(payload: &str) -> bool {
    payload.contains(['\n', '\r'])
}

fn checked_payload(payload: String) -> Result<String, ProtocolError> {
    if has_line_break(&payload) {
        return Err(ProtocolError::LineBreakInPayload);
    }
    Ok(payload)
}

fn parse_number(field: &'static str, value: &str) -> Result<u8, ParseError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidNumber { field, value: value.to_string() });
    }
    value
        .parse::<u8>()
        .map_err(|_| ParseError::InvalidNumber { field, value: value.to_string() })
}

fn parse_ack(value: &str) -> Result<bool, ParseError> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(ParseError::InvalidAck(other.to_string())),
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node-id={}, child-sensor-id={}, message-type={}, ack={}, sub-type={}, payload={}",
            self.node_id, self.sensor_id, self.message_type, self.ack, self.sub_type, self.payload
        )
    }
}
