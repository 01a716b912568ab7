//! Recorder configuration.

use serde::Deserialize;

use crate::error::RecorderError;
use crate::resolve::CompiledRules;

/// Host-facing recorder configuration.
///
/// Read once at startup, treated as immutable afterwards. Path rules are
/// compiled when the recorder is built, so pattern errors surface there
/// rather than per request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Master switch, checked by the host adapter before observing.
    pub enabled: bool,
    /// Probability in (0, 1] that an eligible event is processed at all.
    pub sample_rate: f64,
    /// Append the human-readable message to each entry key. More detail on
    /// the card, higher key cardinality, and messages may carry user input.
    pub capture_messages: bool,
    /// Regexes matched against resolved paths; matching requests are
    /// dropped.
    pub ignore: Vec<String>,
    /// `(pattern, replacement)` rewrites collapsing path variants the route
    /// template did not already parameterize.
    pub groups: Vec<(String, String)>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 1.0,
            capture_messages: true,
            ignore: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl RecorderConfig {
    /// Read configuration from `VALIDATION_RECORDER_*` environment
    /// variables, falling back to the defaults for anything unset.
    ///
    /// `VALIDATION_RECORDER_IGNORE` holds `;`-separated patterns and
    /// `VALIDATION_RECORDER_GROUPS` holds `;`-separated
    /// `pattern=>replacement` pairs.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = std::env::var("VALIDATION_RECORDER_ENABLED")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.enabled);

        let sample_rate = std::env::var("VALIDATION_RECORDER_SAMPLE_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.sample_rate);

        let capture_messages = std::env::var("VALIDATION_RECORDER_CAPTURE_MESSAGES")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.capture_messages);

        let ignore = std::env::var("VALIDATION_RECORDER_IGNORE")
            .map(|v| {
                v.split(';')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.ignore);

        let groups = std::env::var("VALIDATION_RECORDER_GROUPS")
            .map(|v| {
                v.split(';')
                    .filter_map(|pair| pair.split_once("=>"))
                    .map(|(pattern, replacement)| {
                        (pattern.trim().to_string(), replacement.trim().to_string())
                    })
                    .collect()
            })
            .unwrap_or(defaults.groups);

        Self {
            enabled,
            sample_rate,
            capture_messages,
            ignore,
            groups,
        }
    }

    /// Compile the ignore and grouping patterns.
    pub fn compile(&self) -> Result<CompiledRules, RecorderError> {
        CompiledRules::compile(self)
    }
}
