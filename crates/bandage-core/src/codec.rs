//! Telemetry frame codec.
//!
//! The device pushes one line of ASCII text per notification:
//!
//! ```text
//! <temperature>,<humidity>\n
//! ```
//!
//! There is no length prefix, checksum, or sequence number. A frame either
//! decodes completely or is rejected; the caller discards rejected frames
//! and waits for the next one.
//!
//! # Example
//!
//! ```
//! use bandage_core::codec;
//!
//! let (t, h) = codec::decode(b"23.4,85.0\n").unwrap();
//! assert_eq!(t.value(), 23.4);
//! assert_eq!(h.value(), 85.0);
//! ```

use bandage_types::{Command, ParseError, ParseResult, Reading};

/// Field separator within a frame.
pub const FIELD_SEPARATOR: char = ',';

/// Number of fields in a valid frame.
pub const FIELD_COUNT: usize = 2;

/// Decode a raw notification into a temperature and a humidity reading.
///
/// The bytes are read as UTF-8 and trimmed of surrounding whitespace. The
/// remainder must be exactly two comma-separated decimal numbers. Values
/// are returned as parsed.
///
/// # Errors
///
/// - [`ParseError::InvalidUtf8`] if the bytes are not text
/// - [`ParseError::FieldCount`] if there are not exactly two fields
/// - [`ParseError::InvalidNumber`] if a field is not a decimal number
/// - [`ParseError::InvalidValue`] if a field is NaN or infinite
pub fn decode(raw: &[u8]) -> ParseResult<(Reading, Reading)> {
    let text = std::str::from_utf8(raw).map_err(|_| ParseError::InvalidUtf8)?;
    let fields: Vec<&str> = text.trim().split(FIELD_SEPARATOR).collect();

    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount {
            expected: FIELD_COUNT,
            actual: fields.len(),
        });
    }

    let temperature = parse_field(0, fields[0])?;
    let humidity = parse_field(1, fields[1])?;

    Ok((Reading::temperature(temperature), Reading::humidity(humidity)))
}

fn parse_field(field: usize, text: &str) -> ParseResult<f64> {
    let value: f64 = text.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: text.to_string(),
    })?;

    if !value.is_finite() {
        return Err(ParseError::InvalidValue(format!(
            "field {} is not finite: {}",
            field, text
        )));
    }

    Ok(value)
}

/// Build the textual frame the device would send for these values.
///
/// Used by the mock adapter and by tests; `decode(encode(t, h))` yields
/// `(t, h)` for every pair of finite values.
pub fn encode(temperature: f64, humidity: f64) -> String {
    format!("{}{}{}\n", temperature, FIELD_SEPARATOR, humidity)
}

/// Encode a command as the bytes written to the device.
pub fn encode_command(command: Command) -> Vec<u8> {
    command.as_frame().to_vec()
}
