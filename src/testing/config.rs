//! Suite configuration types
//!
//! A suite is an ordered list of scenarios, declared in YAML. The built-in
//! suites live under `suites/` and are embedded at compile time; custom
//! suites can be loaded from any file with the same schema.

use std::path::Path;

use base64::Engine;
use serde::Deserialize;

use crate::common::{Error, Result};

/// Built-in suites, in `list` order
pub const BUILTIN_SUITES: &[(&str, &str)] = &[
    ("full", include_str!("../../suites/full.yaml")),
    ("complete", include_str!("../../suites/complete.yaml")),
    ("final", include_str!("../../suites/final.yaml")),
    ("extension", include_str!("../../suites/extension.yaml")),
    ("simple", include_str!("../../suites/simple.yaml")),
];

/// A complete suite loaded from YAML
#[derive(Deserialize, Debug, Clone)]
pub struct Suite {
    /// Name shown in the run header
    pub name: String,
    /// Optional description of what the suite certifies
    pub description: Option<String>,
    /// User id for every message and the user fixture (overrides config)
    pub user_id: Option<String>,
    /// Scenarios, run in this order
    pub scenarios: Vec<ScenarioSpec>,
    /// Checklist printed when every scenario passes
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl Suite {
    /// Parse a suite from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        let suite: Suite = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse suite: {}", e)))?;
        if suite.scenarios.is_empty() {
            return Err(Error::Config(format!(
                "Suite '{}' declares no scenarios",
                suite.name
            )));
        }
        Ok(suite)
    }

    /// Load a suite file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read suite '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Look up a built-in suite by name
    pub fn builtin(name: &str) -> Result<Self> {
        let (_, content) = BUILTIN_SUITES
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| {
                let known: Vec<&str> = BUILTIN_SUITES.iter().map(|(n, _)| *n).collect();
                Error::Config(format!(
                    "Unknown suite '{}'. Available: {}",
                    name,
                    known.join(", ")
                ))
            })?;
        Self::parse(content)
    }
}

/// One scenario in a suite, with optional per-scenario parameters
///
/// Timeouts are in seconds and fall back to `[timeouts]` in the config;
/// chunk counts and intervals fall back to `[streaming]`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum ScenarioSpec {
    /// `GET /api/health` answers 200
    BackendHealth,
    /// `GET /api/audio/websocket` answers 200 with JSON
    AudioEndpoint,
    /// Store accepts a connection and a trivial read
    DatabaseConnection,
    /// WebSocket opens and accepts `test_connection`
    WebsocketConnection {
        /// Wait for a reply (absence is only a warning)
        #[serde(default)]
        await_response: bool,
        timeout: Option<u64>,
    },
    /// User fixture exists or is created
    UserCreation,
    /// `recording_started` is answered by `meeting_created` with an id
    MeetingCreation { timeout: Option<u64> },
    /// Audio chunks and `recording_stopped` for the captured meeting
    AudioStreaming {
        chunks: Option<usize>,
        interval_ms: Option<u64>,
        #[serde(default)]
        padding: usize,
        #[serde(default)]
        payload: PayloadFormat,
    },
    /// Meeting row exists for the captured meeting id
    DatabaseStorage,
    /// Full recording session as the browser extension performs it
    ExtensionSimulation {
        timeout: Option<u64>,
        chunks: Option<usize>,
        interval_ms: Option<u64>,
        #[serde(default = "default_simulation_padding")]
        padding: usize,
        /// Meeting id used when the backend never confirms the meeting
        #[serde(default = "default_fallback_meeting_id")]
        fallback_meeting_id: String,
    },
    /// `test_connection` then `recording_started` on one socket
    BasicSession {
        timeout: Option<u64>,
        #[serde(default)]
        payload: PayloadFormat,
    },
}

fn default_simulation_padding() -> usize {
    200
}

fn default_fallback_meeting_id() -> String {
    "simulation-meeting".to_string()
}

impl ScenarioSpec {
    /// Display name used in progress output and results
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioSpec::BackendHealth => "Backend Health",
            ScenarioSpec::AudioEndpoint => "Audio Endpoint",
            ScenarioSpec::DatabaseConnection => "Database Connection",
            ScenarioSpec::WebsocketConnection { .. } => "WebSocket Connection",
            ScenarioSpec::UserCreation => "User Creation",
            ScenarioSpec::MeetingCreation { .. } => "Meeting Creation",
            ScenarioSpec::AudioStreaming { .. } => "Audio Streaming",
            ScenarioSpec::DatabaseStorage => "Database Storage",
            ScenarioSpec::ExtensionSimulation { .. } => "Extension Simulation",
            ScenarioSpec::BasicSession { .. } => "Basic WebSocket",
        }
    }

    /// Scenarios that start a recording and therefore establish a new
    /// meeting id; later scenarios see whatever these captured
    pub fn creates_meeting(&self) -> bool {
        matches!(
            self,
            ScenarioSpec::MeetingCreation { .. }
                | ScenarioSpec::ExtensionSimulation { .. }
                | ScenarioSpec::BasicSession { .. }
        )
    }

    /// Scenarios that consume the meeting id captured earlier in the run
    pub fn uses_meeting(&self) -> bool {
        matches!(
            self,
            ScenarioSpec::AudioStreaming { .. } | ScenarioSpec::DatabaseStorage
        )
    }
}

/// Shape of the synthetic audio payload
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// Plain placeholder text
    #[default]
    Text,
    /// `data:audio/webm;base64,...` as the extension sends it
    DataUrl,
}

impl PayloadFormat {
    /// Render the payload for chunk `index`
    pub fn render(&self, prefix: &str, index: usize, padding: usize) -> String {
        let mut text = format!("{}_{}", prefix, index);
        if padding > 0 {
            text.push('_');
            text.push_str(&"x".repeat(padding));
        }
        match self {
            PayloadFormat::Text => text,
            PayloadFormat::DataUrl => format!(
                "data:audio/webm;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_suites_parse() {
        for (name, _) in BUILTIN_SUITES {
            let suite = Suite::builtin(name).unwrap();
            assert!(!suite.scenarios.is_empty(), "suite {} is empty", name);
            assert!(
                !suite.next_steps.is_empty(),
                "suite {} has no success checklist",
                name
            );
        }
    }

    #[test]
    fn test_unknown_builtin() {
        let err = Suite::builtin("nope").unwrap_err();
        assert!(err.to_string().contains("Available: full"));
    }

    #[test]
    fn test_parse_scenarios_with_params() {
        let suite = Suite::parse(
            r#"
name: Custom
user_id: u1
scenarios:
  - scenario: backend_health
  - scenario: meeting_creation
    timeout: 3
  - scenario: audio_streaming
    chunks: 5
    padding: 100
    payload: data_url
next_steps:
  - Load the extension
"#,
        )
        .unwrap();

        assert_eq!(suite.user_id.as_deref(), Some("u1"));
        assert_eq!(suite.scenarios[0], ScenarioSpec::BackendHealth);
        assert_eq!(
            suite.scenarios[1],
            ScenarioSpec::MeetingCreation { timeout: Some(3) }
        );
        assert_eq!(
            suite.scenarios[2],
            ScenarioSpec::AudioStreaming {
                chunks: Some(5),
                interval_ms: None,
                padding: 100,
                payload: PayloadFormat::DataUrl,
            }
        );
        assert_eq!(suite.next_steps.len(), 1);
    }

    #[test]
    fn test_simulation_defaults() {
        let suite = Suite::parse(
            "name: s\nscenarios:\n  - scenario: extension_simulation\n",
        )
        .unwrap();
        match &suite.scenarios[0] {
            ScenarioSpec::ExtensionSimulation {
                padding,
                fallback_meeting_id,
                ..
            } => {
                assert_eq!(*padding, 200);
                assert_eq!(fallback_meeting_id, "simulation-meeting");
            }
            other => panic!("Expected ExtensionSimulation, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        let err = Suite::parse("name: s\nscenarios:\n  - scenario: teleport\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_suite_rejected() {
        assert!(Suite::parse("name: s\nscenarios: []\n").is_err());
    }

    #[test]
    fn test_payload_render() {
        assert_eq!(
            PayloadFormat::Text.render("fake_audio_data_chunk", 0, 0),
            "fake_audio_data_chunk_0"
        );
        assert_eq!(PayloadFormat::Text.render("c", 2, 3), "c_2_xxx");

        let url = PayloadFormat::DataUrl.render("c", 1, 0);
        let encoded = url.strip_prefix("data:audio/webm;base64,").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"c_1");
    }

    #[test]
    fn test_meeting_flow_flags() {
        assert!(ScenarioSpec::MeetingCreation { timeout: None }.creates_meeting());
        assert!(ScenarioSpec::DatabaseStorage.uses_meeting());
        assert!(!ScenarioSpec::BackendHealth.creates_meeting());
        assert!(!ScenarioSpec::BackendHealth.uses_meeting());
    }
}
