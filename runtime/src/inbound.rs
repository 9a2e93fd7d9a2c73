//! Inbound events for local runs
//!
//! The driver reads one JSON object per line and dispatches it to the
//! module:
//!
//! ```text
//! {"kind":"message","input":"input1","body":{"machine":{"temperature":30}},"properties":{"k":"v"}}
//! {"kind":"message","text":"not a byte body"}
//! {"kind":"twin","state":"partial","payload":{"TemperatureThreshold":30}}
//! {"kind":"method","name":"heartbeat","payload":{}}
//! ```
//!
//! A string `body` is sent as its raw bytes; any other JSON value is
//! serialized.

use edgefilter_gateway::{
    Disposition, FilterModule, Message, MethodResponse, ThresholdUpdate, TwinUpdateState,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// One line of driver input
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InboundEvent {
    /// Telemetry message
    Message {
        /// Input name; the module's configured input when absent
        #[serde(default)]
        input: Option<String>,
        /// Byte body
        #[serde(default)]
        body: Option<Value>,
        /// Text body (not readable as a byte array)
        #[serde(default)]
        text: Option<String>,
        /// Application properties
        #[serde(default)]
        properties: HashMap<String, String>,
        /// System content type
        #[serde(default)]
        content_type: Option<String>,
        /// System content encoding
        #[serde(default)]
        content_encoding: Option<String>,
    },
    /// Twin update
    Twin {
        /// Full document or delta
        #[serde(default = "partial")]
        state: TwinUpdateState,
        /// Twin document
        payload: Value,
    },
    /// Direct method invocation
    Method {
        /// Method name
        name: String,
        /// Method payload
        #[serde(default)]
        payload: Value,
    },
}

fn partial() -> TwinUpdateState {
    TwinUpdateState::Partial
}

/// What the module returned for an event
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Message disposition
    Message(Disposition),
    /// Twin update result
    Twin(ThresholdUpdate),
    /// Method response
    Method(MethodResponse),
}

impl InboundEvent {
    /// Parse one line
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Hand the event to `module`
    pub fn dispatch(self, module: &FilterModule) -> Outcome {
        match self {
            InboundEvent::Message {
                input,
                body,
                text,
                properties,
                content_type,
                content_encoding,
            } => {
                let mut message = match (body, text) {
                    (Some(body), _) => Message::from_bytes(to_bytes(&body)),
                    (None, Some(text)) => Message::from_text(text),
                    (None, None) => Message::from_bytes(Vec::new()),
                };
                for (key, value) in properties {
                    message.set_property(key, value);
                }
                if let Some(content_type) = content_type {
                    message.set_content_type(content_type);
                }
                if let Some(content_encoding) = content_encoding {
                    message.set_content_encoding(content_encoding);
                }

                let input = input.unwrap_or_else(|| module.input().to_string());
                let disposition = module.on_input_message(&input, &message);
                debug!(input = %input, ?disposition, "Message dispatched");
                Outcome::Message(disposition)
            }
            InboundEvent::Twin { state, payload } => {
                Outcome::Twin(module.on_twin_update(state, &to_bytes(&payload)))
            }
            InboundEvent::Method { name, payload } => {
                let response = module.on_method(&name, &to_bytes(&payload));
                info!(
                    method = %name,
                    status = response.status,
                    body = %String::from_utf8_lossy(&response.body),
                    "Method response"
                );
                Outcome::Method(response)
            }
        }
    }
}

/// Parse and dispatch one line; blank and unparseable lines are skipped
pub fn dispatch_line(module: &FilterModule, line: &str) -> Option<Outcome> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match InboundEvent::parse(line) {
        Ok(event) => Some(event.dispatch(module)),
        Err(e) => {
            warn!(error = %e, "Skipping unparseable inbound event");
            None
        }
    }
}

fn to_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::String(raw) => raw.as_bytes().to_vec(),
        other => serde_json::to_vec(other).unwrap_or_default(),
    }
}
