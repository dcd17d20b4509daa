//! JSON text-frame codec
//!
//! A frame must be a JSON object with a string `type`. Anything else is a
//! decode error; unknown `type` values decode fine and are classified by the
//! caller.

use serde_json::Value;

use crate::common::{Error, Result};

use super::types::ProtocolMessage;

/// Longest frame excerpt quoted in error messages
const EXCERPT_LEN: usize = 200;

/// Serialize a message to its wire form
pub fn encode(message: &ProtocolMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Parse a received frame
pub fn decode(text: &str) -> Result<ProtocolMessage> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::Decode(format!("not JSON ({}): {}", e, excerpt(text))))?;

    match value.get("type") {
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(Error::Decode(format!(
                "'type' is not a string: {}",
                excerpt(text)
            )))
        }
        None => {
            return Err(Error::Decode(format!(
                "missing 'type' field: {}",
                excerpt(text)
            )))
        }
    }

    serde_json::from_value(value).map_err(|e| Error::Decode(format!("{}: {}", e, excerpt(text))))
}

/// Shorten a frame for inclusion in diagnostics
pub fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_LEN {
        text.to_string()
    } else {
        let head: String = text.chars().take(EXCERPT_LEN).collect();
        format!("{}…", head)
    }
}
