//! Error types for bandage-core.
//!
//! Connection-lifecycle failures reset the session to `Idle` and are
//! observable through [`crate::SessionSnapshot::last_error`]. Data-path
//! failures (malformed frames) stay local to the session loop.
//!
//! | Error | Surfaced as | Recovery |
//! |-------|-------------|----------|
//! | [`Error::AdapterUnavailable`] | `SessionError::AdapterUnavailable` | Next explicit `start_session` |
//! | [`Error::ConnectFailed`] | `SessionError::ConnectFailed` | Manual re-trigger |
//! | [`Error::DiscoveryIncomplete`] | `SessionError::DiscoveryIncomplete` | Disconnect and restart |
//! | [`Error::MalformedFrame`] | nothing (counted) | Next frame |
//! | [`Error::DeviceNotReady`] | returned to caller | None, command dropped |
//! | [`Error::WriteFailed`] | `SessionError::WriteFailed` | Caller decides |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bandage_types::{ParseError, SessionState};

/// Errors that can occur while managing a device session.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error from the platform stack.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Radio powered off or absent.
    #[error("Bluetooth adapter unavailable")]
    AdapterUnavailable,

    /// Connection to the device could not be established.
    #[error("Connection failed: {reason}")]
    ConnectFailed {
        /// The device identifier that failed to connect.
        device_id: Option<String>,
        /// Why the connection failed.
        reason: String,
    },

    /// Required service or characteristics were not found.
    #[error("Discovery incomplete: {missing} not found")]
    DiscoveryIncomplete {
        /// What was missing (service or characteristic UUIDs).
        missing: String,
    },

    /// A telemetry frame could not be decoded.
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] ParseError),

    /// A command was issued while the session was not ready.
    #[error("Device not ready (session is {state})")]
    DeviceNotReady {
        /// The session state at the time of the request.
        state: SessionState,
    },

    /// The adapter rejected a write.
    #[error("Write failed to characteristic {uuid}: {reason}")]
    WriteFailed {
        /// The characteristic UUID.
        uuid: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The session loop has stopped.
    #[error("Session closed")]
    SessionClosed,
}

impl Error {
    /// Create a connection failure error.
    pub fn connect_failed(device_id: Option<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            device_id,
            reason: reason.into(),
        }
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a write failure error.
    pub fn write_failed(uuid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            uuid: uuid.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// The surfaced session error this maps to, if any.
    pub fn session_error(&self) -> Option<SessionError> {
        match self {
            Error::AdapterUnavailable | Error::Bluetooth(_) => Some(SessionError::AdapterUnavailable),
            Error::ConnectFailed { .. } => Some(SessionError::ConnectFailed),
            Error::DiscoveryIncomplete { .. } => Some(SessionError::DiscoveryIncomplete),
            Error::WriteFailed { .. } => Some(SessionError::WriteFailed),
            _ => None,
        }
    }
}

/// Session-level error surfaced to consumers through the observable state.
///
/// Unlike [`Error`] this carries no text, so presentation layers can pick
/// their own wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionError {
    /// Radio powered off or absent.
    AdapterUnavailable,
    /// The last connection attempt failed.
    ConnectFailed,
    /// Required service or characteristics were not found.
    DiscoveryIncomplete,
    /// The device did not acknowledge a command write.
    WriteFailed,
    /// Too many consecutive telemetry frames were malformed.
    TooManyMalformedFrames,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdapterUnavailable => write!(f, "Bluetooth adapter unavailable"),
            Self::ConnectFailed => write!(f, "connection failed"),
            Self::DiscoveryIncomplete => write!(f, "device not ready (discovery incomplete)"),
            Self::WriteFailed => write!(f, "command write failed"),
            Self::TooManyMalformedFrames => write!(f, "too many malformed telemetry frames"),
        }
    }
}

/// Result type alias using bandage-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DeviceNotReady {
            state: SessionState::Scanning,
        };
        assert_eq!(err.to_string(), "Device not ready (session is scanning)");

        let err = Error::connect_failed(Some("AA:BB".into()), "out of range");
        assert_eq!(err.to_string(), "Connection failed: out of range");

        let err = Error::timeout("discover services", Duration::from_secs(10));
        assert!(err.to_string().contains("discover services"));
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = ParseError::InvalidUtf8.into();
        assert!(matches!(err, Error::MalformedFrame(ParseError::InvalidUtf8)));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_session_error_mapping() {
        assert_eq!(
            Error::AdapterUnavailable.session_error(),
            Some(SessionError::AdapterUnavailable)
        );
        assert_eq!(
            Error::write_failed("6e400002", "rejected").session_error(),
            Some(SessionError::WriteFailed)
        );
        assert_eq!(Error::MalformedFrame(ParseError::InvalidUtf8).session_error(), None);
        assert_eq!(
            Error::DeviceNotReady {
                state: SessionState::Idle
            }
            .session_error(),
            None
        );
    }

    #[test]
    fn test_btleplug_error_conversion() {
        fn _assert_from_impl<T: From<btleplug::Error>>() {}
        _assert_from_impl::<Error>();
    }
}
