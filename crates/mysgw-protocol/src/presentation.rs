//! Discovery text for `presentation` frames.
//!
//! When a node or sensor presents itself the gateway logs a short report
//! with ready-to-paste binding strings for the channels it exposes.

use std::fmt::Write;

use crate::message::Message;
use crate::types::{InternalType, PresentationType, SubType};

/// Internal channels every node can report on its own sensor id.
const NODE_CHANNELS: [InternalType; 3] =
    [InternalType::BatteryLevel, InternalType::SketchName, InternalType::SketchVersion];

/// Human readable discovery report for a presentation frame.
///
/// Returns `None` for any other message type.
pub fn describe(msg: &Message) -> Option<String> {
    let SubType::Presentation(kind) = msg.sub_type() else {
        return None;
    };

    let mut out = String::new();
    if kind.is_node() {
        let _ = write!(out, "node discovered: node-id={}", msg.node_id);
        if kind == PresentationType::ArduinoRepeaterNode {
            out.push_str(" (repeater)");
        }
        for channel in NODE_CHANNELS {
            binding_line(&mut out, msg.node_id, msg.sensor_id, channel.name(), channel.description());
        }
        let inclusion = InternalType::InclusionMode;
        binding_line(&mut out, msg.node_id, 0, inclusion.name(), inclusion.description());
    } else {
        let label = if msg.payload.is_empty() { kind.description() } else { msg.payload.as_str() };
        let _ = write!(
            out,
            "sensor discovered ({label}): node-id={}, sensor-id={} with type {}",
            msg.node_id,
            msg.sensor_id,
            kind.name()
        );
        for value_type in kind.value_types() {
            binding_line(&mut out, msg.node_id, msg.sensor_id, value_type.name(), value_type.description());
        }
    }
    Some(out)
}

fn binding_line(out: &mut String, node: u8, sensor: u8, type_name: &str, description: &str) {
    let _ = write!(out, "\n * binding: {node};{sensor};{type_name:<20} - {description}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    #[test]
    fn test_describe_repeater_node() {
        let msg = Message::presentation(7, 255, PresentationType::ArduinoRepeaterNode, "1.5");
        let text = describe(&msg).unwrap();
        assert!(text.starts_with("node discovered: node-id=7 (repeater)"));
        assert!(text.contains("7;255;I_BATTERY_LEVEL"));
        assert!(text.contains("7;0;I_INCLUSION_MODE"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_describe_sensor_uses_payload_label() {
        let msg = Message::presentation(3, 1, PresentationType::Door, "front door");
        let text = describe(&msg).unwrap();
        assert!(text.starts_with("sensor discovered (front door): node-id=3, sensor-id=1 with type S_DOOR"));
        assert!(text.contains("3;1;V_TRIPPED"));
        assert!(text.contains("3;1;V_ARMED"));
    }

    #[test]
    fn test_describe_sensor_without_payload() {
        let msg = Message::presentation(3, 2, PresentationType::Hum, "");
        let text = describe(&msg).unwrap();
        assert!(text.contains("(Humidity sensor)"));
    }

    #[test]
    fn test_describe_ignores_other_messages() {
        assert!(describe(&Message::set(1, 1, ValueType::Temp, "1")).is_none());
    }
}
