//! Control message codec
//!
//! A control message is a map with a single boolean entry, either
//! `startRecording` or `stopRecording`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire form of a control message
pub type ControlMessage = Map<String, Value>;

/// Key carried by a start message
pub const START_RECORDING_KEY: &str = "startRecording";

/// Key carried by a stop message
pub const STOP_RECORDING_KEY: &str = "stopRecording";

/// What the sender wants the peer to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlIntent {
    StartRecording,
    StopRecording,
}

impl ControlIntent {
    pub fn key(&self) -> &'static str {
        match self {
            ControlIntent::StartRecording => START_RECORDING_KEY,
            ControlIntent::StopRecording => STOP_RECORDING_KEY,
        }
    }

    pub fn to_message(&self) -> ControlMessage {
        let mut message = Map::new();
        message.insert(self.key().to_string(), Value::Bool(true));
        message
    }

    /// Decode a received message.
    ///
    /// `startRecording: false` is read as a stop and `stopRecording: false`
    /// carries no intent. Anything other than exactly one known boolean
    /// entry yields `None`.
    pub fn from_message(message: &ControlMessage) -> Option<Self> {
        if message.len() != 1 {
            return None;
        }
        let (key, value) = message.iter().next()?;
        let flag = value.as_bool()?;
        match (key.as_str(), flag) {
            (START_RECORDING_KEY, true) => Some(ControlIntent::StartRecording),
            (START_RECORDING_KEY, false) => Some(ControlIntent::StopRecording),
            (STOP_RECORDING_KEY, true) => Some(ControlIntent::StopRecording),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: Value) -> ControlMessage {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_encode_start() {
        let encoded = Value::Object(ControlIntent::StartRecording.to_message());
        assert_eq!(encoded, json!({ "startRecording": true }));
    }

    #[test]
    fn test_decode_known_intents() {
        assert_eq!(
            ControlIntent::from_message(&message(json!({ "startRecording": true }))),
            Some(ControlIntent::StartRecording)
        );
        assert_eq!(
            ControlIntent::from_message(&message(json!({ "stopRecording": true }))),
            Some(ControlIntent::StopRecording)
        );
    }

    #[test]
    fn test_start_false_means_stop() {
        assert_eq!(
            ControlIntent::from_message(&message(json!({ "startRecording": false }))),
            Some(ControlIntent::StopRecording)
        );
        assert_eq!(
            ControlIntent::from_message(&message(json!({ "stopRecording": false }))),
            None
        );
    }

    #[test]
    fn test_malformed_messages_are_ignored() {
        for value in [
            json!({}),
            json!({ "startRecording": "yes" }),
            json!({ "pauseRecording": true }),
            json!({ "startRecording": true, "stopRecording": true }),
        ] {
            assert_eq!(ControlIntent::from_message(&message(value)), None);
        }
    }
}
