//! Output formatting for text and JSON output.
//!
//! All user-facing wording lives here. The core crate only reports status
//! bands; this module picks the message for the active language.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

use bandage_core::{SessionEvent, SessionSnapshot, StatusBand};
use bandage_types::{Language, Metric, Reading};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, compact: bool) -> Self {
        Self { no_color, compact }
    }

    /// Serialize to JSON honoring the compact flag.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

/// Metric label in the given language.
pub fn metric_label(metric: Metric, language: Language) -> &'static str {
    match (metric, language) {
        (Metric::Temperature, Language::Japanese) => "温度",
        (Metric::Temperature, Language::English) => "Temperature",
        (Metric::Humidity, Language::Japanese) => "湿度",
        (Metric::Humidity, Language::English) => "Humidity",
    }
}

/// Status message for a metric's band in the given language.
pub fn band_message(metric: Metric, band: StatusBand, language: Language) -> &'static str {
    let ja = language == Language::Japanese;
    match (metric, band) {
        (Metric::Temperature, StatusBand::CriticalLow) => {
            if ja {
                "⚠️ 注意: 体温が低すぎます。"
            } else {
                "⚠️ Warning: Temperature is too low."
            }
        }
        (Metric::Temperature, StatusBand::WarningLow) => {
            if ja {
                "体温が少し低いです。"
            } else {
                "Temperature is slightly low."
            }
        }
        (Metric::Temperature, StatusBand::Normal) => {
            if ja {
                "体温は正常です"
            } else {
                "Temperature is normal"
            }
        }
        (Metric::Temperature, StatusBand::WarningHigh | StatusBand::CriticalHigh) => {
            if ja {
                "体温は高すぎです"
            } else {
                "Temperature is too high!"
            }
        }
        (Metric::Humidity, StatusBand::CriticalLow | StatusBand::WarningLow) => {
            if ja {
                "湿度が低すぎます"
            } else {
                "Humidity is too low"
            }
        }
        (Metric::Humidity, StatusBand::Normal) => {
            if ja {
                "湿度が正常です"
            } else {
                "Humidity is normal"
            }
        }
        (Metric::Humidity, StatusBand::WarningHigh | StatusBand::CriticalHigh) => {
            if ja {
                "湿度が高すぎます"
            } else {
                "Humidity is too high!"
            }
        }
    }
}

/// Color a message by band severity.
fn colorize_band(text: &str, band: StatusBand, opts: &FormatOptions) -> String {
    if opts.no_color {
        return text.to_string();
    }
    if band.is_critical() {
        text.red().bold().to_string()
    } else if band.is_alert() {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}

fn format_metric_line(
    metric: Metric,
    value: Option<f64>,
    band: Option<StatusBand>,
    language: Language,
    opts: &FormatOptions,
) -> String {
    let label = metric_label(metric, language);
    match (value, band) {
        (Some(value), Some(band)) => {
            let reading = Reading::new(metric, value).to_string();
            let message = colorize_band(band_message(metric, band, language), band, opts);
            format!("{}: {}  {}", label, reading, message)
        }
        _ => format!("{}: --", label),
    }
}

/// Overlay the values of a telemetry event on a snapshot.
///
/// The snapshot may already hold a later frame when events arrive back to
/// back, so the printed values come from the event itself.
pub fn telemetry_frame(mut snapshot: SessionSnapshot, event: &SessionEvent) -> SessionSnapshot {
    if let SessionEvent::Telemetry {
        temperature,
        humidity,
        temperature_band,
        humidity_band,
    } = *event
    {
        snapshot.temperature = Some(temperature);
        snapshot.humidity = Some(humidity);
        snapshot.temperature_band = Some(temperature_band);
        snapshot.humidity_band = Some(humidity_band);
    }
    snapshot
}

/// Human-readable rendering of the latest telemetry.
pub fn format_telemetry_text(snapshot: &SessionSnapshot, opts: &FormatOptions) -> String {
    let language = snapshot.language;
    format!(
        "{}\n{}\n",
        format_metric_line(
            Metric::Temperature,
            snapshot.temperature,
            snapshot.temperature_band,
            language,
            opts
        ),
        format_metric_line(
            Metric::Humidity,
            snapshot.humidity,
            snapshot.humidity_band,
            language,
            opts
        ),
    )
}

#[derive(Serialize)]
struct TelemetryJson<'a> {
    temperature: Option<f64>,
    humidity: Option<f64>,
    temperature_band: Option<StatusBand>,
    humidity_band: Option<StatusBand>,
    temperature_message: Option<&'static str>,
    humidity_message: Option<&'static str>,
    language: Language,
    history: &'a bandage_core::HistorySnapshot,
}

/// JSON rendering of the latest telemetry.
pub fn format_telemetry_json(snapshot: &SessionSnapshot, opts: &FormatOptions) -> Result<String> {
    let language = snapshot.language;
    let output = TelemetryJson {
        temperature: snapshot.temperature,
        humidity: snapshot.humidity,
        temperature_band: snapshot.temperature_band,
        humidity_band: snapshot.humidity_band,
        temperature_message: snapshot
            .temperature_band
            .map(|b| band_message(Metric::Temperature, b, language)),
        humidity_message: snapshot
            .humidity_band
            .map(|b| band_message(Metric::Humidity, b, language)),
        language,
        history: &snapshot.history,
    };
    opts.as_json(&output)
}

/// A device seen during a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScannedDevice {
    pub id: String,
    pub name: Option<String>,
    pub target: bool,
}

/// Human-readable scan results.
pub fn format_scan_text(devices: &[ScannedDevice], opts: &FormatOptions) -> String {
    if devices.is_empty() {
        return "No devices found.\n".to_string();
    }
    let mut out = format!("Found {} device(s):\n", devices.len());
    for device in devices {
        let name = device.name.as_deref().unwrap_or("Unknown");
        let line = format!("  {:<24} {}", name, device.id);
        if device.target && !opts.no_color {
            out.push_str(&format!("{}  {}\n", line.green().bold(), "<- target".dimmed()));
        } else if device.target {
            out.push_str(&format!("{}  <- target\n", line));
        } else {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// JSON scan results.
pub fn format_scan_json(devices: &[ScannedDevice], opts: &FormatOptions) -> Result<String> {
    opts.as_json(&devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandage_core::HistorySnapshot;
    use bandage_types::SessionState;

    fn plain() -> FormatOptions {
        FormatOptions::new(true, true)
    }

    fn snapshot(temperature: Option<f64>, humidity: Option<f64>) -> SessionSnapshot {
        SessionSnapshot {
            state: SessionState::Ready,
            connected: true,
            adapter_available: true,
            device_id: None,
            device_name: Some("Smart Bandage".to_string()),
            language: Language::English,
            temperature,
            humidity,
            temperature_band: temperature.map(|_| StatusBand::Normal),
            humidity_band: humidity.map(|_| StatusBand::WarningHigh),
            history: HistorySnapshot::default(),
            last_error: None,
            frames_decoded: 1,
            frames_dropped: 0,
        }
    }

    #[test]
    fn test_band_messages_both_languages() {
        assert_eq!(
            band_message(Metric::Temperature, StatusBand::CriticalLow, Language::Japanese),
            "⚠️ 注意: 体温が低すぎます。"
        );
        assert_eq!(
            band_message(Metric::Temperature, StatusBand::Normal, Language::English),
            "Temperature is normal"
        );
        assert_eq!(
            band_message(Metric::Humidity, StatusBand::WarningHigh, Language::Japanese),
            "湿度が高すぎます"
        );
        assert_eq!(
            band_message(Metric::Humidity, StatusBand::WarningLow, Language::English),
            "Humidity is too low"
        );
    }

    #[test]
    fn test_telemetry_text() {
        let text = format_telemetry_text(&snapshot(Some(36.5), Some(95.0)), &plain());
        assert_eq!(
            text,
            "Temperature: 36.5°C  Temperature is normal\nHumidity: 95%  Humidity is too high!\n"
        );
    }

    #[test]
    fn test_telemetry_text_before_first_frame() {
        let text = format_telemetry_text(&snapshot(None, None), &plain());
        assert_eq!(text, "Temperature: --\nHumidity: --\n");
    }

    #[test]
    fn test_telemetry_frame_uses_event_values() {
        let latest = snapshot(Some(36.5), Some(95.0));
        let event = SessionEvent::Telemetry {
            temperature: 23.4,
            humidity: 85.0,
            temperature_band: StatusBand::CriticalLow,
            humidity_band: StatusBand::Normal,
        };
        let frame = telemetry_frame(latest.clone(), &event);
        assert_eq!(frame.temperature, Some(23.4));
        assert_eq!(frame.humidity, Some(85.0));
        assert_eq!(frame.temperature_band, Some(StatusBand::CriticalLow));
        assert_eq!(frame.humidity_band, Some(StatusBand::Normal));
        assert_eq!(frame.language, latest.language);

        let text = format_telemetry_text(&frame, &plain());
        assert!(text.starts_with("Temperature: 23.4°C"));

        let unchanged = telemetry_frame(latest.clone(), &SessionEvent::CommandAcknowledged);
        assert_eq!(unchanged, latest);
    }

    #[test]
    fn test_telemetry_json() {
        let json = format_telemetry_json(&snapshot(Some(36.5), Some(95.0)), &plain()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["temperature"], 36.5);
        assert_eq!(value["humidity_band"], "warning_high");
        assert_eq!(value["humidity_message"], "Humidity is too high!");
        assert_eq!(value["language"], "en");
    }

    #[test]
    fn test_scan_text_marks_target() {
        let devices = vec![
            ScannedDevice {
                id: "AA:BB".to_string(),
                name: Some("Smart Bandage".to_string()),
                target: true,
            },
            ScannedDevice {
                id: "CC:DD".to_string(),
                name: None,
                target: false,
            },
        ];
        let text = format_scan_text(&devices, &plain());
        assert!(text.starts_with("Found 2 device(s):"));
        assert!(text.contains("<- target"));
        assert!(text.contains("Unknown"));
        assert_eq!(format_scan_text(&[], &plain()), "No devices found.\n");
    }
}
