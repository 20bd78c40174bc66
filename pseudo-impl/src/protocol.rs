//! Inbound host messages.

use serde::{Deserialize, Serialize};

/// The literal `"input-response"` type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseTag {
    #[serde(rename = "input-response")]
    InputResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    /// `{ "type": "input-response", "id": ..., "value": ... }`
    InputResponse {
        #[serde(rename = "type")]
        tag: ResponseTag,
        id: String,
        value: String,
    },
    /// `{ "code": ..., "timeout"?: ms }`
    Start {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<u64>,
    },
}

impl Inbound {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub fn input_response(id: impl Into<String>, value: impl Into<String>) -> Self {
        Inbound::InputResponse {
            tag: ResponseTag::InputResponse,
            id: id.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_requests() {
        assert_eq!(
            Inbound::parse(r#"{"code": "Algorithm A\nEndAlgorithm", "timeout": 2000}"#).unwrap(),
            Inbound::Start {
                code: "Algorithm A\nEndAlgorithm".to_string(),
                timeout: Some(2000)
            }
        );
        assert_eq!(
            Inbound::parse(r#"{"code": ""}"#).unwrap(),
            Inbound::Start {
                code: String::new(),
                timeout: None
            }
        );
    }

    #[test]
    fn parses_input_responses() {
        assert_eq!(
            Inbound::parse(r#"{"type": "input-response", "id": "42", "value": "Ada"}"#).unwrap(),
            Inbound::input_response("42", "Ada")
        );
    }

    #[test]
    fn rejects_unknown_messages() {
        assert!(Inbound::parse(r#"{"type": "stdout", "text": "x"}"#).is_err());
        assert!(Inbound::parse("not json").is_err());
    }
}
