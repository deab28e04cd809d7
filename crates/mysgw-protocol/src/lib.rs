//! MySensors Serial Gateway Protocol
//!
//! This crate provides the frame model, the subtype tables and the line
//! framing used to talk to a MySensors-style gateway over a serial port or a
//! TCP connection.
//!
//! # Protocol Overview
//!
//! The gateway speaks a newline-terminated text protocol:
//!
//! ```text
//! node-id;child-sensor-id;message-type;ack;sub-type;payload\n
//! ```
//!
//! - **presentation** (0): a node or sensor announces its profile
//! - **set** (1): a value is pushed to or from a sensor channel
//! - **req** (2): a value is requested; answered with `set`
//! - **internal** (3): housekeeping (time, config, version, log, ids)
//! - **stream** (4): bulk data such as firmware blocks
//!
//! The sub-type ordinal is interpreted in the table the message type selects.
//! Ordinals are shared with the node firmware and never change.
//!
//! # Example
//!
//! ```rust
//! use mysgw_protocol::{LineCodec, Message, MessageType, SubType, ValueType};
//!
//! let mut codec = LineCodec::new();
//! codec.push(b"5;3;1;0;2;1\n");
//! let line = codec.decode_line().unwrap();
//!
//! let msg = Message::decode(&line).unwrap();
//! assert_eq!(msg.message_type(), MessageType::Set);
//! assert_eq!(msg.sub_type(), SubType::Value(ValueType::Status));
//! assert_eq!(msg.encode(), "5;3;1;0;2;1\n");
//! ```

mod codec;
mod error;
mod message;
pub mod presentation;
mod types;

pub use codec::*;
pub use error::*;
pub use message::*;
pub use types::*;
