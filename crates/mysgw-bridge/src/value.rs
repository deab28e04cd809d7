//! Semantic values and their wire payloads.
//!
//! Each [`ValueKind`] has one parse rule for wire payloads
//! ([`from_payload`]), one for host command text ([`Value::parse_command`])
//! and one render rule ([`to_payload`]). The rules are fixed:
//!
//! | Kind | Wire form |
//! |---|---|
//! | on/off, open/closed | `1` / `0` (`ffffff` / `000000` on full-color channels) |
//! | color | `rrggbb` |
//! | point | `lat;lon;alt` |
//! | date-time | Unix seconds |
//! | everything else | natural text |

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use mysgw_protocol::{ChannelType, ValueKind};
use thiserror::Error;

/// Payload sent for "on" on a full-color channel.
pub const COLOR_ON: &str = "ffffff";

/// Payload sent for "off" on a full-color channel.
pub const COLOR_OFF: &str = "000000";

/// A value could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The text is not a valid representation of the kind.
    #[error("cannot read {text:?} as {kind}")]
    InvalidPayload {
        /// Kind that was expected.
        kind: ValueKind,
        /// Offending text.
        text: String,
    },

    /// The value cannot be carried by the channel.
    #[error("{kind} value cannot be sent on {channel}")]
    Unrepresentable {
        /// Kind of the value.
        kind: ValueKind,
        /// Target channel name.
        channel: &'static str,
    },
}

impl ConversionError {
    fn invalid(kind: ValueKind, text: &str) -> Self {
        ConversionError::InvalidPayload { kind, text: text.to_string() }
    }
}

// ============================================================================
// Value Types
// ============================================================================

/// Switch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnOff {
    /// On.
    On,
    /// Off.
    Off,
}

/// Contact state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenClosed {
    /// Open.
    Open,
    /// Closed.
    Closed,
}

/// Relative step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncreaseDecrease {
    /// One step up.
    Increase,
    /// One step down.
    Decrease,
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Rgb {
    /// Full white.
    pub const WHITE: Rgb = Rgb { red: 0xff, green: 0xff, blue: 0xff };

    /// Black.
    pub const BLACK: Rgb = Rgb { red: 0, green: 0, blue: 0 };

    /// A color from its channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Rgb { red, green, blue }
    }

    /// Lowercase `rrggbb`.
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Parse `rrggbb`. An `rrggbbww` payload from an RGBW channel is accepted
    /// and its white byte ignored.
    pub fn from_hex(text: &str) -> Option<Rgb> {
        if !(text.len() == 6 || text.len() == 8) || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&text[i..i + 2], 16).ok();
        Some(Rgb { red: channel(0)?, green: channel(2)?, blue: channel(4)? })
    }
}

/// Geographic position. Altitude is in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters, `0` when unknown.
    pub altitude: f64,
}

impl GeoPoint {
    /// Parse 2 or 3 decimal components separated by `;` or `,`.
    fn parse(text: &str) -> Option<GeoPoint> {
        let parts: Vec<f64> = text
            .split([';', ','])
            .map(|part| parse_finite(part.trim()))
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [latitude, longitude] => Some(GeoPoint { latitude: *latitude, longitude: *longitude, altitude: 0.0 }),
            [latitude, longitude, altitude] => {
                Some(GeoPoint { latitude: *latitude, longitude: *longitude, altitude: *altitude })
            }
            _ => None,
        }
    }
}

/// A value as the host application sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Switch state.
    OnOff(OnOff),
    /// Contact state.
    OpenClosed(OpenClosed),
    /// Plain number.
    Decimal(f64),
    /// Number in `0..=100`.
    Percent(u8),
    /// Relative step.
    IncreaseDecrease(IncreaseDecrease),
    /// Color.
    Color(Rgb),
    /// Position.
    Point(GeoPoint),
    /// Point in time.
    DateTime(DateTime<Utc>),
    /// Free text.
    Text(String),
}

impl Value {
    /// The semantic kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::OnOff(_) => ValueKind::OnOff,
            Value::OpenClosed(_) => ValueKind::OpenClosed,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Percent(_) => ValueKind::Percent,
            Value::IncreaseDecrease(_) => ValueKind::IncreaseDecrease,
            Value::Color(_) => ValueKind::Color,
            Value::Point(_) => ValueKind::Point,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Parse host command text as `kind`.
    ///
    /// Accepts the spellings a user types: `ON`/`OFF`, `OPEN`/`CLOSED`,
    /// `INCREASE`/`DECREASE`, `255,0,0` or `#ff0000` for colors,
    /// `lat,lon[,alt]` for points, RFC 3339 or Unix seconds for time.
    pub fn parse_command(text: &str, kind: ValueKind) -> Result<Value, ConversionError> {
        let trimmed = text.trim();
        let upper = trimmed.to_ascii_uppercase();
        let parsed = match kind {
            ValueKind::OnOff => match upper.as_str() {
                "ON" | "1" => Some(Value::OnOff(OnOff::On)),
                "OFF" | "0" => Some(Value::OnOff(OnOff::Off)),
                _ => None,
            },
            ValueKind::OpenClosed => match upper.as_str() {
                "OPEN" | "1" => Some(Value::OpenClosed(OpenClosed::Open)),
                "CLOSED" | "0" => Some(Value::OpenClosed(OpenClosed::Closed)),
                _ => None,
            },
            ValueKind::Color => parse_color_command(trimmed).map(Value::Color),
            ValueKind::Text => Some(Value::Text(text.to_string())),
            _ => return from_payload(kind, trimmed),
        };
        parsed.ok_or_else(|| ConversionError::invalid(kind, text))
    }

    /// Parse host command text as the first of `kinds` that accepts it.
    pub fn parse_any(text: &str, kinds: &[ValueKind]) -> Result<Value, ConversionError> {
        let mut last = None;
        for kind in kinds {
            match Value::parse_command(text, *kind) {
                Ok(value) => return Ok(value),
                Err(err) => last = Some(err),
            }
        }
        Err(last.unwrap_or_else(|| ConversionError::invalid(ValueKind::Text, text)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::OnOff(OnOff::On) => f.write_str("ON"),
            Value::OnOff(OnOff::Off) => f.write_str("OFF"),
            Value::OpenClosed(OpenClosed::Open) => f.write_str("OPEN"),
            Value::OpenClosed(OpenClosed::Closed) => f.write_str("CLOSED"),
            Value::Decimal(number) => write!(f, "{number}"),
            Value::Percent(percent) => write!(f, "{percent}%"),
            Value::IncreaseDecrease(IncreaseDecrease::Increase) => f.write_str("INCREASE"),
            Value::IncreaseDecrease(IncreaseDecrease::Decrease) => f.write_str("DECREASE"),
            Value::Color(rgb) => write!(f, "#{}", rgb.to_hex()),
            Value::Point(p) => write!(f, "{},{},{}", p.latitude, p.longitude, p.altitude),
            Value::DateTime(at) => write!(f, "{}", at.to_rfc3339()),
            Value::Text(text) => f.write_str(text),
        }
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Render `value` as the payload for `channel`.
///
/// The value's kind must be one the channel can carry.
pub fn to_payload(value: &Value, channel: ChannelType) -> Result<String, ConversionError> {
    let kind = value.kind();
    if !channel.kinds().contains(&kind) {
        return Err(ConversionError::Unrepresentable { kind, channel: channel.name() });
    }

    let payload = match value {
        Value::OnOff(state) if channel.is_color() => match state {
            OnOff::On => COLOR_ON.to_string(),
            OnOff::Off => COLOR_OFF.to_string(),
        },
        Value::OnOff(state) => bit(*state == OnOff::On),
        Value::OpenClosed(state) => bit(*state == OpenClosed::Open),
        Value::Decimal(number) => number.to_string(),
        Value::Percent(percent) => percent.to_string(),
        Value::IncreaseDecrease(IncreaseDecrease::Increase) => "INCREASE".to_string(),
        Value::IncreaseDecrease(IncreaseDecrease::Decrease) => "DECREASE".to_string(),
        Value::Color(rgb) => rgb.to_hex(),
        Value::Point(p) => format!("{};{};{}", p.latitude, p.longitude, p.altitude),
        Value::DateTime(at) => at.timestamp().to_string(),
        Value::Text(text) => {
            // A line break would end the frame early.
            if text.contains(['\n', '\r']) {
                return Err(ConversionError::Unrepresentable { kind, channel: channel.name() });
            }
            text.clone()
        }
    };
    Ok(payload)
}

/// Parse a wire payload as `kind`.
pub fn from_payload(kind: ValueKind, payload: &str) -> Result<Value, ConversionError> {
    let parsed = match kind {
        ValueKind::OnOff => match payload {
            "1" => Some(Value::OnOff(OnOff::On)),
            "0" => Some(Value::OnOff(OnOff::Off)),
            _ => None,
        },
        ValueKind::OpenClosed => match payload {
            "1" => Some(Value::OpenClosed(OpenClosed::Open)),
            "0" => Some(Value::OpenClosed(OpenClosed::Closed)),
            _ => None,
        },
        ValueKind::Decimal => parse_finite(payload.trim()).map(Value::Decimal),
        ValueKind::Percent => parse_finite(payload.trim())
            .filter(|p| (0.0..=100.0).contains(p))
            .map(|p| Value::Percent(p.round() as u8)),
        ValueKind::IncreaseDecrease => match payload.trim().to_ascii_uppercase().as_str() {
            "INCREASE" => Some(Value::IncreaseDecrease(IncreaseDecrease::Increase)),
            "DECREASE" => Some(Value::IncreaseDecrease(IncreaseDecrease::Decrease)),
            _ => None,
        },
        ValueKind::Color => Rgb::from_hex(payload.trim()).map(Value::Color),
        ValueKind::Point => GeoPoint::parse(payload).map(Value::Point),
        ValueKind::DateTime => parse_date_time(payload.trim()).map(Value::DateTime),
        ValueKind::Text => Some(Value::Text(payload.to_string())),
    };
    parsed.ok_or_else(|| ConversionError::invalid(kind, payload))
}

fn bit(set: bool) -> String {
    String::from(if set { "1" } else { "0" })
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(seconds) = text.parse::<i64>() {
        return Utc.timestamp_opt(seconds, 0).single();
    }
    DateTime::parse_from_rfc3339(text).ok().map(|at| at.with_timezone(&Utc))
}

fn parse_color_command(text: &str) -> Option<Rgb> {
    let channels: Vec<&str> = text.split(',').map(str::trim).collect();
    if let [red, green, blue] = channels.as_slice() {
        return Some(Rgb::new(red.parse().ok()?, green.parse().ok()?, blue.parse().ok()?));
    }
    let hex = text.strip_prefix('#').unwrap_or(text);
    if hex.len() == 6 {
        Rgb::from_hex(hex)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysgw_protocol::{InternalType, ValueType};

    fn channel(name: &str) -> ChannelType {
        ChannelType::from_name(name).unwrap()
    }

    #[test]
    fn test_on_off_payloads() {
        let on = Value::OnOff(OnOff::On);
        let off = Value::OnOff(OnOff::Off);
        assert_eq!(to_payload(&on, channel("V_STATUS")).unwrap(), "1");
        assert_eq!(to_payload(&off, channel("V_STATUS")).unwrap(), "0");
        assert_eq!(to_payload(&on, channel("V_RGB")).unwrap(), "ffffff");
        assert_eq!(to_payload(&off, channel("V_RGBW")).unwrap(), "000000");
    }

    #[test]
    fn test_structured_payloads() {
        let color = Value::Color(Rgb::new(255, 8, 0));
        assert_eq!(to_payload(&color, channel("V_RGB")).unwrap(), "ff0800");

        let point = Value::Point(GeoPoint { latitude: 55.7, longitude: 13.0, altitude: 18.0 });
        assert_eq!(to_payload(&point, channel("V_POSITION")).unwrap(), "55.7;13;18");

        let at = Value::DateTime(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        assert_eq!(to_payload(&at, channel("V_VAR1")).unwrap(), "1700000000");

        assert_eq!(to_payload(&Value::Decimal(21.5), channel("V_TEMP")).unwrap(), "21.5");
        assert_eq!(to_payload(&Value::Percent(40), channel("V_PERCENTAGE")).unwrap(), "40");
        assert_eq!(
            to_payload(&Value::OpenClosed(OpenClosed::Open), channel("V_TRIPPED")).unwrap(),
            "1"
        );
    }

    #[test]
    fn test_unrepresentable() {
        let err = to_payload(&Value::Color(Rgb::WHITE), channel("V_TEMP")).unwrap_err();
        assert_eq!(err, ConversionError::Unrepresentable { kind: ValueKind::Color, channel: "V_TEMP" });

        let multi_line = Value::Text("a\nb".to_string());
        assert!(to_payload(&multi_line, channel("V_TEXT")).is_err());

        // Setpoints carry no kinds at all.
        assert!(to_payload(&Value::Decimal(20.0), ChannelType::Value(ValueType::HvacSetpointHeat)).is_err());
    }

    #[test]
    fn test_internal_channel_payload() {
        let battery = ChannelType::Internal(InternalType::BatteryLevel);
        assert_eq!(to_payload(&Value::Percent(87), battery).unwrap(), "87");
    }

    #[test]
    fn test_from_payload_booleans_are_strict() {
        assert_eq!(from_payload(ValueKind::OnOff, "1").unwrap(), Value::OnOff(OnOff::On));
        assert_eq!(from_payload(ValueKind::OnOff, "0").unwrap(), Value::OnOff(OnOff::Off));
        assert!(from_payload(ValueKind::OnOff, "2").is_err());
        assert!(from_payload(ValueKind::OnOff, "ON").is_err());
        assert_eq!(
            from_payload(ValueKind::OpenClosed, "1").unwrap(),
            Value::OpenClosed(OpenClosed::Open)
        );
    }

    #[test]
    fn test_from_payload_color() {
        assert_eq!(from_payload(ValueKind::Color, "00ff7f").unwrap(), Value::Color(Rgb::new(0, 255, 127)));
        assert_eq!(from_payload(ValueKind::Color, "ff0000ff").unwrap(), Value::Color(Rgb::new(255, 0, 0)));
        assert!(from_payload(ValueKind::Color, "fff").is_err());
        assert!(from_payload(ValueKind::Color, "gg0000").is_err());
    }

    #[test]
    fn test_from_payload_point() {
        let Value::Point(p) = from_payload(ValueKind::Point, "55.722526;13.017972;18").unwrap() else {
            panic!("expected a point");
        };
        assert_eq!((p.latitude, p.longitude, p.altitude), (55.722526, 13.017972, 18.0));

        let Value::Point(p) = from_payload(ValueKind::Point, "1.5,2.5").unwrap() else {
            panic!("expected a point");
        };
        assert_eq!(p.altitude, 0.0);
        assert!(from_payload(ValueKind::Point, "1;2;3;4").is_err());
        assert!(from_payload(ValueKind::Point, "north;south").is_err());
    }

    #[test]
    fn test_from_payload_numbers() {
        assert_eq!(from_payload(ValueKind::Decimal, "10.5").unwrap(), Value::Decimal(10.5));
        assert!(from_payload(ValueKind::Decimal, "NaN").is_err());
        assert!(from_payload(ValueKind::Decimal, "").is_err());
        assert_eq!(from_payload(ValueKind::Percent, "99.6").unwrap(), Value::Percent(100));
        assert!(from_payload(ValueKind::Percent, "101").is_err());
        assert!(from_payload(ValueKind::Percent, "-1").is_err());
    }

    #[test]
    fn test_from_payload_date_time() {
        let expected = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(from_payload(ValueKind::DateTime, "1700000000").unwrap(), Value::DateTime(expected));
        assert_eq!(
            from_payload(ValueKind::DateTime, "2023-11-14T22:13:20Z").unwrap(),
            Value::DateTime(expected)
        );
        assert!(from_payload(ValueKind::DateTime, "yesterday").is_err());
    }

    #[test]
    fn test_from_payload_text_is_verbatim() {
        assert_eq!(from_payload(ValueKind::Text, " a;b ").unwrap(), Value::Text(" a;b ".to_string()));
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(Value::parse_command("on", ValueKind::OnOff).unwrap(), Value::OnOff(OnOff::On));
        assert_eq!(
            Value::parse_command("CLOSED", ValueKind::OpenClosed).unwrap(),
            Value::OpenClosed(OpenClosed::Closed)
        );
        assert_eq!(
            Value::parse_command("255, 0, 0", ValueKind::Color).unwrap(),
            Value::Color(Rgb::new(255, 0, 0))
        );
        assert_eq!(
            Value::parse_command("#00FF00", ValueKind::Color).unwrap(),
            Value::Color(Rgb::new(0, 255, 0))
        );
        assert_eq!(Value::parse_command(" 12.5 ", ValueKind::Decimal).unwrap(), Value::Decimal(12.5));
        assert_eq!(
            Value::parse_command("increase", ValueKind::IncreaseDecrease).unwrap(),
            Value::IncreaseDecrease(IncreaseDecrease::Increase)
        );
        assert!(Value::parse_command("maybe", ValueKind::OnOff).is_err());
        assert!(Value::parse_command("256,0,0", ValueKind::Color).is_err());
    }

    #[test]
    fn test_parse_any_uses_kind_order() {
        let dimmer = [ValueKind::Percent, ValueKind::OnOff, ValueKind::IncreaseDecrease];
        assert_eq!(Value::parse_any("40", &dimmer).unwrap(), Value::Percent(40));
        assert_eq!(Value::parse_any("OFF", &dimmer).unwrap(), Value::OnOff(OnOff::Off));
        assert!(Value::parse_any("purple", &dimmer).is_err());
        assert!(Value::parse_any("x", &[]).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::OnOff(OnOff::On).to_string(), "ON");
        assert_eq!(Value::Color(Rgb::new(1, 2, 3)).to_string(), "#010203");
        assert_eq!(Value::Percent(5).to_string(), "5%");
    }
}
