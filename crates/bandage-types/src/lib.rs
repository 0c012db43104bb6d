//! Platform-agnostic types for the Smart Bandage wireless sensor.
//!
//! This crate provides the shared vocabulary used by the session manager
//! (bandage-core) and by presentation layers such as the CLI.
//!
//! # Features
//!
//! - Telemetry readings and the metrics they belong to
//! - Actuator commands and their wire frames
//! - Session state and the presentation language flag
//! - UUID constants for the device's BLE service
//! - Error types for frame parsing
//!
//! # Example
//!
//! ```
//! use bandage_types::{Command, Reading, Metric};
//!
//! let reading = Reading::temperature(36.4);
//! assert_eq!(reading.metric(), Metric::Temperature);
//! assert_eq!(Command::MotorOn.as_frame(), b"ON\n");
//! ```

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use types::{Command, Language, Metric, Reading, SessionState};
pub use uuid as uuids;

#[cfg(test)]
mod tests {
    use super::*;

    // --- Command tests ---

    #[test]
    fn test_command_frames() {
        assert_eq!(Command::MotorOn.as_frame(), b"ON\n");
        assert_eq!(Command::MotorOff.as_frame(), b"OFF\n");
    }

    #[test]
    fn test_command_from_str() {
        assert_eq!("on".parse::<Command>().unwrap(), Command::MotorOn);
        assert_eq!("OFF".parse::<Command>().unwrap(), Command::MotorOff);
        assert_eq!(" Stop ".parse::<Command>().unwrap(), Command::MotorOff);
        assert!("vibrate".parse::<Command>().is_err());
    }

    #[test]
    fn test_command_display_matches_token() {
        assert_eq!(Command::MotorOn.to_string(), "ON");
        assert_eq!(Command::MotorOff.to_string(), "OFF");
    }

    // --- Reading tests ---

    #[test]
    fn test_reading_constructors() {
        let t = Reading::temperature(23.4);
        assert_eq!(t.metric(), Metric::Temperature);
        assert_eq!(t.value(), 23.4);

        let h = Reading::humidity(85.0);
        assert_eq!(h.metric(), Metric::Humidity);
        assert_eq!(h.value(), 85.0);
    }

    #[test]
    fn test_reading_display() {
        assert_eq!(Reading::temperature(23.4).to_string(), "23.4°C");
        assert_eq!(Reading::humidity(85.5).to_string(), "85.5%");
    }

    // --- Language tests ---

    #[test]
    fn test_language_defaults_to_japanese() {
        assert_eq!(Language::default(), Language::Japanese);
    }

    #[test]
    fn test_language_toggle() {
        assert_eq!(Language::Japanese.toggle(), Language::English);
        assert_eq!(Language::English.toggle(), Language::Japanese);
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("ja".parse::<Language>().unwrap(), Language::Japanese);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert!("fr".parse::<Language>().is_err());
    }

    // --- SessionState tests ---

    #[test]
    fn test_session_state_connected() {
        assert!(!SessionState::Idle.is_connected());
        assert!(!SessionState::Scanning.is_connected());
        assert!(!SessionState::Connecting.is_connected());
        assert!(SessionState::DiscoveringServices.is_connected());
        assert!(SessionState::DiscoveringCharacteristics.is_connected());
        assert!(SessionState::Ready.is_connected());
        assert!(!SessionState::Disconnecting.is_connected());
    }

    #[test]
    fn test_session_state_connecting() {
        assert!(SessionState::Connecting.is_connecting());
        assert!(SessionState::DiscoveringServices.is_connecting());
        assert!(!SessionState::Ready.is_connecting());
        assert!(!SessionState::Scanning.is_connecting());
    }

    #[test]
    fn test_session_state_busy() {
        assert!(!SessionState::Idle.is_busy());
        assert!(SessionState::Scanning.is_busy());
        assert!(SessionState::Disconnecting.is_busy());
    }

    // --- Serialization tests ---

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_representations() {
        assert_eq!(
            serde_json::to_string(&SessionState::DiscoveringServices).unwrap(),
            "\"discovering_services\""
        );
        assert_eq!(serde_json::to_string(&Language::English).unwrap(), "\"en\"");
        assert_eq!(
            serde_json::to_string(&Command::MotorOn).unwrap(),
            "\"motor_on\""
        );

        let reading: Reading =
            serde_json::from_str(r#"{"metric":"humidity","value":72.5}"#).unwrap();
        assert_eq!(reading, Reading::humidity(72.5));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_command() -> impl Strategy<Value = Command> {
        prop_oneof![Just(Command::MotorOn), Just(Command::MotorOff)]
    }

    fn any_language() -> impl Strategy<Value = Language> {
        prop_oneof![Just(Language::Japanese), Just(Language::English)]
    }

    proptest! {
        /// Displayed tokens parse back regardless of case and padding.
        #[test]
        fn command_display_parses_back(
            command in any_command(),
            upper in any::<bool>(),
            pad in "[ \t]{0,3}",
        ) {
            let token = command.to_string();
            let token = if upper { token } else { token.to_lowercase() };
            let input = format!("{pad}{token}{pad}");
            prop_assert_eq!(input.parse::<Command>().unwrap(), command);
        }

        #[test]
        fn language_display_parses_back(language in any_language(), upper in any::<bool>()) {
            let code = language.to_string();
            let code = if upper { code.to_uppercase() } else { code };
            prop_assert_eq!(code.parse::<Language>().unwrap(), language);
        }

        #[test]
        fn language_toggle_is_an_involution(language in any_language()) {
            prop_assert_ne!(language.toggle(), language);
            prop_assert_eq!(language.toggle().toggle(), language);
        }

        /// Parsing arbitrary text never panics.
        #[test]
        fn command_parse_never_panics(s in "\\PC{0,16}") {
            let _ = s.parse::<Command>();
            let _ = s.parse::<Language>();
        }
    }
}
