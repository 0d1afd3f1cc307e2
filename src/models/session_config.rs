//! Session setup chosen by the user before a session opens.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

pub const MIN_DURATION_MINUTES: u32 = 30;
pub const MAX_DURATION_MINUTES: u32 = 360;
pub const MAX_STRICTNESS: u8 = 100;

/// Read once when the session opens and never mutated afterwards.
///
/// Field names on the wire match what the setup form writes into the config
/// store (`sessionTitle`, `duration`, `breaks`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(rename = "sessionTitle")]
    pub title: String,
    #[serde(default)]
    pub goal: String,
    /// Planned length in minutes.
    #[serde(rename = "duration", deserialize_with = "saturating_u32")]
    pub duration_minutes: u32,
    #[serde(rename = "breaks")]
    pub breaks_enabled: bool,
    #[serde(default)]
    pub workplace: String,
    /// 0 (chill) to 100 (insane).
    #[serde(deserialize_with = "saturating_u8")]
    pub strictness: u8,
}

// A hand-edited file may hold negatives, fractions or huge values. Those
// still load, rounded and saturated, and `sanitized` clamps them afterwards.
fn saturating_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(value.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}

fn saturating_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(value.round().clamp(0.0, f64::from(u8::MAX)) as u8)
}

impl SessionConfig {
    /// Returns a copy with duration and strictness clamped into their valid
    /// ranges. The setup form validates already; this only guards against a
    /// hand-edited settings file.
    pub fn sanitized(&self) -> Self {
        let duration_minutes = self
            .duration_minutes
            .clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES);
        let strictness = self.strictness.min(MAX_STRICTNESS);

        if duration_minutes != self.duration_minutes {
            warn!(
                "session duration {} min out of range, clamped to {} min",
                self.duration_minutes, duration_minutes
            );
        }
        if strictness != self.strictness {
            warn!(
                "strictness {} out of range, clamped to {}",
                self.strictness, strictness
            );
        }

        Self {
            duration_minutes,
            strictness,
            ..self.clone()
        }
    }

    pub fn total_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(duration_minutes: u32, strictness: u8) -> SessionConfig {
        SessionConfig {
            title: "Thesis".into(),
            goal: "Finish chapter 3".into(),
            duration_minutes,
            breaks_enabled: true,
            workplace: "library".into(),
            strictness,
        }
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let short = config(5, 250).sanitized();
        assert_eq!(short.duration_minutes, MIN_DURATION_MINUTES);
        assert_eq!(short.strictness, MAX_STRICTNESS);

        let long = config(1_000, 10).sanitized();
        assert_eq!(long.duration_minutes, MAX_DURATION_MINUTES);
        assert_eq!(long.strictness, 10);
    }

    #[test]
    fn sanitized_keeps_valid_config_untouched() {
        let original = config(90, 80);
        assert_eq!(original.sanitized(), original);
    }

    #[test]
    fn deserializes_setup_form_field_names() {
        let raw = r#"{
            "sessionTitle": "Deep work",
            "goal": "Ship it",
            "duration": 150,
            "breaks": true,
            "workplace": "home",
            "strictness": 50
        }"#;
        let parsed: SessionConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.title, "Deep work");
        assert_eq!(parsed.duration_minutes, 150);
        assert!(parsed.breaks_enabled);
        assert_eq!(parsed.total_secs(), 9_000);
    }

    #[test]
    fn hand_edited_numbers_still_parse() {
        let raw = r#"{
            "sessionTitle": "Deep work",
            "duration": -5,
            "breaks": false,
            "strictness": 300
        }"#;
        let parsed: SessionConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.duration_minutes, 0);
        assert_eq!(parsed.strictness, u8::MAX);

        let raw = r#"{
            "sessionTitle": "Deep work",
            "duration": 90.4,
            "breaks": false,
            "strictness": 72.5
        }"#;
        let parsed: SessionConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.duration_minutes, 90);
        assert_eq!(parsed.strictness, 73);
    }

    #[test]
    fn non_numeric_duration_is_still_rejected() {
        let raw = r#"{ "sessionTitle": "x", "duration": "long", "breaks": true, "strictness": 1 }"#;
        assert!(serde_json::from_str::<SessionConfig>(raw).is_err());
    }
}
