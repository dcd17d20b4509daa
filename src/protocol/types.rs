//! Audio protocol message types
//!
//! Every frame is a JSON object with a `type` tag, the sender's `userId`, an
//! optional `meetingId`, an optional opaque `data` payload and a Unix
//! `timestamp` in seconds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::unix_timestamp;

/// Message type tag
///
/// Unknown tags received from the backend are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    TestConnection,
    RecordingStarted,
    AudioChunk,
    RecordingStopped,
    MeetingCreated,
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::TestConnection => "test_connection",
            MessageKind::RecordingStarted => "recording_started",
            MessageKind::AudioChunk => "audio_chunk",
            MessageKind::RecordingStopped => "recording_stopped",
            MessageKind::MeetingCreated => "meeting_created",
            MessageKind::Other(s) => s,
        }
    }
}

impl From<String> for MessageKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "test_connection" => MessageKind::TestConnection,
            "recording_started" => MessageKind::RecordingStarted,
            "audio_chunk" => MessageKind::AudioChunk,
            "recording_stopped" => MessageKind::RecordingStopped,
            "meeting_created" => MessageKind::MeetingCreated,
            _ => MessageKind::Other(s),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One protocol frame
///
/// Only `type` is required on receipt; replies such as `meeting_created` may
/// omit the user id or timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub user_id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub meeting_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
}

/// Accept ids sent as JSON strings or integers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "meetingId must be a string or number, got {}",
            other
        ))),
    }
}

/// Timestamps in replies are informational; anything non-numeric reads as 0
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    })
}

impl ProtocolMessage {
    fn new(kind: MessageKind, user_id: &str) -> Self {
        Self {
            kind,
            user_id: user_id.to_string(),
            meeting_id: None,
            data: None,
            timestamp: unix_timestamp(),
        }
    }

    pub fn test_connection(user_id: &str) -> Self {
        Self::new(MessageKind::TestConnection, user_id)
    }

    pub fn recording_started(user_id: &str) -> Self {
        Self::new(MessageKind::RecordingStarted, user_id)
    }

    pub fn audio_chunk(user_id: &str, meeting_id: &str, data: String) -> Self {
        Self {
            meeting_id: Some(meeting_id.to_string()),
            data: Some(data),
            ..Self::new(MessageKind::AudioChunk, user_id)
        }
    }

    pub fn recording_stopped(user_id: &str, meeting_id: Option<&str>) -> Self {
        Self {
            meeting_id: meeting_id.map(str::to_string),
            ..Self::new(MessageKind::RecordingStopped, user_id)
        }
    }

    /// Reply sent by a backend once a meeting row exists
    pub fn meeting_created(user_id: &str, meeting_id: &str) -> Self {
        Self {
            meeting_id: Some(meeting_id.to_string()),
            ..Self::new(MessageKind::MeetingCreated, user_id)
        }
    }

    /// Non-empty meeting id carried by this message, if any
    pub fn meeting_id(&self) -> Option<&str> {
        self.meeting_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_unknown_tag() {
        assert_eq!(
            MessageKind::from("transcript_ready".to_string()),
            MessageKind::Other("transcript_ready".to_string())
        );
        assert_eq!(
            MessageKind::from("audio_chunk".to_string()),
            MessageKind::AudioChunk
        );
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let msg = ProtocolMessage {
            timestamp: 1_700_000_000,
            ..ProtocolMessage::recording_started("u1")
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "recording_started",
                "userId": "u1",
                "timestamp": 1_700_000_000
            })
        );
    }

    #[test]
    fn test_audio_chunk_fields() {
        let msg = ProtocolMessage::audio_chunk("u1", "m-42", "chunk".to_string());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "audio_chunk");
        assert_eq!(json["meetingId"], "m-42");
        assert_eq!(json["data"], "chunk");
    }

    #[test]
    fn test_empty_meeting_id_is_absent() {
        let msg: ProtocolMessage =
            serde_json::from_str(r#"{"type":"meeting_created","meetingId":""}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::MeetingCreated);
        assert_eq!(msg.meeting_id(), None);
    }

    #[test]
    fn test_numeric_meeting_id() {
        let msg: ProtocolMessage =
            serde_json::from_str(r#"{"type":"meeting_created","meetingId":17}"#).unwrap();
        assert_eq!(msg.meeting_id(), Some("17"));
    }
}
