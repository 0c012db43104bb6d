//! Core types for Smart Bandage telemetry and control.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A quantity measured by the bandage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Metric {
    /// Skin-side temperature in degrees Celsius.
    Temperature,
    /// Relative humidity under the dressing, in percent.
    Humidity,
}

impl Metric {
    /// All metrics in frame order.
    pub const ALL: [Metric; 2] = [Metric::Temperature, Metric::Humidity];

    /// Display unit for this metric.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
        }
    }

    /// Lowercase name, as used in logs and JSON output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single decoded sensor value.
///
/// Readings carry no timestamp: arrival order is time order for this
/// stream, so ordering is kept by the history buffer instead.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    metric: Metric,
    value: f64,
}

impl Reading {
    /// Create a reading for the given metric.
    #[must_use]
    pub fn new(metric: Metric, value: f64) -> Self {
        Self { metric, value }
    }

    /// Create a temperature reading.
    #[must_use]
    pub fn temperature(value: f64) -> Self {
        Self::new(Metric::Temperature, value)
    }

    /// Create a humidity reading.
    #[must_use]
    pub fn humidity(value: f64) -> Self {
        Self::new(Metric::Humidity, value)
    }

    /// The metric this reading belongs to.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// The value as decoded, without unit conversion or rounding.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.metric.unit())
    }
}

/// Actuator command accepted by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Command {
    /// Start the vibration motor.
    MotorOn,
    /// Stop the vibration motor.
    MotorOff,
}

impl Command {
    /// The wire frame for this command: a bare ASCII token and a newline.
    #[must_use]
    pub fn as_frame(&self) -> &'static [u8] {
        match self {
            Command::MotorOn => b"ON\n",
            Command::MotorOff => b"OFF\n",
        }
    }

    /// The token without its line terminator.
    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            Command::MotorOn => "ON",
            Command::MotorOff => "OFF",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "motor-on" | "start" => Ok(Command::MotorOn),
            "off" | "motor-off" | "stop" => Ok(Command::MotorOff),
            other => Err(ParseError::InvalidValue(format!(
                "unknown command '{}' (expected 'on' or 'off')",
                other
            ))),
        }
    }
}

/// Display language selected by the presentation layer.
///
/// The core only carries this flag; text selection happens in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Language {
    /// Japanese (`ja`).
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "ja"))]
    Japanese,
    /// English (`en`).
    #[cfg_attr(feature = "serde", serde(rename = "en"))]
    English,
}

impl Language {
    /// Switch to the other language.
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Language::Japanese => Language::English,
            Language::English => Language::Japanese,
        }
    }

    /// ISO 639-1 code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Language::Japanese => "ja",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ja" | "jp" | "japanese" => Ok(Language::Japanese),
            "en" | "english" => Ok(Language::English),
            other => Err(ParseError::InvalidValue(format!(
                "unknown language '{}' (expected 'ja' or 'en')",
                other
            ))),
        }
    }
}

/// Connection state of the device session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SessionState {
    /// No device associated, radio not scanning.
    #[default]
    Idle,
    /// Scanning for the target device.
    Scanning,
    /// Target found, link being established.
    Connecting,
    /// Link up, looking for the UART service.
    DiscoveringServices,
    /// Service found, looking for the notify and write characteristics.
    DiscoveringCharacteristics,
    /// Subscribed to telemetry, commands accepted.
    Ready,
    /// Disconnect requested, waiting for the adapter to confirm.
    Disconnecting,
}

impl SessionState {
    /// Whether a radio link to the device is up.
    ///
    /// True from link-up (service discovery) through `Ready`.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            SessionState::DiscoveringServices
                | SessionState::DiscoveringCharacteristics
                | SessionState::Ready
        )
    }

    /// Whether a connection attempt is underway but not yet usable.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            SessionState::Connecting
                | SessionState::DiscoveringServices
                | SessionState::DiscoveringCharacteristics
        )
    }

    /// Whether the session is doing anything at all.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        *self != SessionState::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Scanning => "scanning",
            SessionState::Connecting => "connecting",
            SessionState::DiscoveringServices => "discovering services",
            SessionState::DiscoveringCharacteristics => "discovering characteristics",
            SessionState::Ready => "ready",
            SessionState::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}
