//! Error types for the wire protocol.

use thiserror::Error;

use crate::types::SubtypeTable;

/// A frame that is not syntactically a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line has fewer than six `;`-separated fields.
    #[error("expected 6 fields, found {found}")]
    FieldCount {
        /// Number of fields actually present.
        found: usize,
    },

    /// A numeric header field is not a decimal integer in `0..=255`.
    #[error("field `{field}` is not a valid number: {value:?}")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
        /// Raw field text.
        value: String,
    },

    /// The ack field is neither `0` nor `1`.
    #[error("ack flag must be 0 or 1, got {0:?}")]
    InvalidAck(String),
}

/// A frame that is well formed but breaks a protocol rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Ordinal outside the bounds of its table.
    #[error("unknown {table} {code}")]
    UnknownSubtype {
        /// Table the code was looked up in.
        table: SubtypeTable,
        /// The rejected ordinal.
        code: u8,
    },

    /// Type name that is not in any table.
    #[error("unknown type name {0:?}")]
    UnknownTypeName(String),

    /// Subtype from a table the message type does not select.
    #[error("{sub_type} cannot travel in a {message_type} message")]
    MismatchedSubtype {
        /// Name of the message type.
        message_type: &'static str,
        /// Name of the subtype.
        sub_type: &'static str,
    },

    /// Payload containing `\n` or `\r`, which would end the frame early.
    #[error("payload contains a line break")]
    LineBreakInPayload,
}

/// Any reason a received line could not become a [`crate::Message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Malformed frame.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Unknown ordinal.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Result type alias for frame decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;
