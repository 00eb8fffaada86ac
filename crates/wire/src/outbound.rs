// SPDX-License-Identifier: MIT

//! Messages a worker may send to a client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    ClassificationResult {
        data: ClassificationResult,
        timestamp: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        frame_index: Option<u64>,
    },
    ClassificationLog {
        data: ClassificationResult,
        timestamp: f64,
    },
    Pong,
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub prediction: String,
    pub confidence: f32,
    pub probabilities: BTreeMap<String, f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
}

impl Outbound {
    pub fn error(message: impl Into<String>) -> Self {
        Outbound::Error { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_result_omits_absent_frame_index() {
        let msg = Outbound::ClassificationResult {
            data: ClassificationResult {
                prediction: "hello".into(),
                confidence: 0.92,
                probabilities: BTreeMap::new(),
                buffer_size: None,
            },
            timestamp: 1.0,
            frame_index: None,
        };
        let json = serde_json::to_value(&msg).expect("serializes");
        assert!(json.get("frame_index").is_none());
    }

    #[test]
    fn error_tag_round_trips() {
        let msg = Outbound::error("binary frames are not accepted");
        let json = serde_json::to_string(&msg).expect("serializes");
        let back: Outbound = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, msg);
    }
}
