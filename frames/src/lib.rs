//! Shared message model and JSON codec for the overlay WS transport.
//!
//! This crate owns the wire representation exchanged between the overlay and
//! the remote controller. Every frame is a single newline-free JSON object with
//! a `"type"` discriminator. Inbound payloads that the overlay only forwards
//! (wheel action payloads) stay as `serde_json::Value`; everything the overlay
//! acts on is decoded into typed structs here so malformed input is rejected at
//! the boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action type carried by `trigger_action` frames that start a spin.
pub const SPIN_WHEEL_ACTION: &str = "spin_wheel";

/// Error returned by [`decode_message`] and the payload parsers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The JSON value is not an object.
    #[error("message is not a JSON object")]
    NotAnObject,
    /// The object has no string `type` field.
    #[error("message has no string `type` field")]
    MissingType,
    /// A field required by a known message type is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// A field is present but has the wrong shape.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

// =============================================================================
// INBOUND
// =============================================================================

/// A message sent by the controller to the overlay.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// Start an action on the overlay (currently only `spin_wheel`).
    TriggerAction(TriggerAction),
    /// Full replacement of one or more widget layouts.
    ConfigUpdate(ConfigUpdate),
    /// Keep-alive.
    Ping,
    /// A chat command ran on the bot.
    CommandExecuted(CommandExecuted),
    /// A TTS message is being played.
    TtsMessage(TtsMessage),
    /// A sound effect is being played.
    SoundPlayed(SoundPlayed),
    /// Well-formed envelope with a `type` this overlay does not know.
    Unknown { kind: String },
}

impl InboundMessage {
    /// The wire `type` string of this message.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::TriggerAction(_) => "trigger_action",
            Self::ConfigUpdate(_) => "config_update",
            Self::Ping => "ping",
            Self::CommandExecuted(_) => "command_executed",
            Self::TtsMessage(_) => "tts_message",
            Self::SoundPlayed(_) => "sound_played",
            Self::Unknown { kind } => kind,
        }
    }
}

/// `trigger_action` payload. `data` is interpreted per `action_type`.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerAction {
    pub action_type: String,
    pub data: Value,
}

/// Items and per-label actions parsed from a `spin_wheel` trigger's `data`.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SpinRequest {
    /// Slice labels in wheel order.
    pub items: Vec<String>,
    /// Action payload keyed by slice label.
    pub actions: Map<String, Value>,
}

impl SpinRequest {
    /// Parse the `data` object of a `spin_wheel` trigger.
    ///
    /// String items are taken as-is; numbers and booleans are stringified;
    /// nulls, arrays, and objects are skipped. A non-object `actions` field is
    /// treated as empty.
    ///
    /// # Errors
    ///
    /// [`CodecError::MissingField`] when `items` is absent and
    /// [`CodecError::InvalidField`] when it is not a list or holds no usable
    /// labels.
    pub fn from_data(data: &Value) -> Result<Self, CodecError> {
        let items = data.get("items").ok_or(CodecError::MissingField("items"))?;
        let Value::Array(raw_items) = items else {
            return Err(CodecError::InvalidField { field: "items", reason: "expected a list".into() });
        };

        let items = raw_items
            .iter()
            .filter_map(|item| match item {
                Value::String(label) => Some(label.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect::<Vec<_>>();
        if items.is_empty() {
            return Err(CodecError::InvalidField { field: "items", reason: "no usable labels".into() });
        }

        let actions = data
            .get("actions")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(Self { items, actions })
    }

    /// Action payload associated with `label`, if any.
    #[must_use]
    pub fn action_for(&self, label: &str) -> Option<&Value> {
        self.actions.get(label).filter(|v| !v.is_null())
    }
}

/// `config_update` payload.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ConfigUpdate {
    /// One entry per widget, ordered by widget name.
    pub positions: Vec<WidgetPosition>,
}

/// Server-side layout for one widget. `scale` may be omitted by the server.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetPosition {
    pub element: String,
    pub x: f64,
    pub y: f64,
    pub scale: Option<f64>,
}

#[derive(Deserialize)]
struct RawPosition {
    x: f64,
    y: f64,
    #[serde(default)]
    scale: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CommandExecuted {
    pub command: String,
    pub user_name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TtsMessage {
    pub user_name: String,
    pub message: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SoundPlayed {
    pub sound_name: String,
}

/// Decode one inbound text frame.
///
/// # Errors
///
/// Returns a [`CodecError`] for invalid JSON, a non-object envelope, a missing
/// `type`, or a known type whose required fields are absent or malformed.
/// Unknown types decode successfully as [`InboundMessage::Unknown`].
pub fn decode_message(text: &str) -> Result<InboundMessage, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut obj) = value else {
        return Err(CodecError::NotAnObject);
    };
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?
        .to_owned();

    let message = match kind.as_str() {
        "trigger_action" => {
            let action_type = obj
                .get("action_type")
                .and_then(Value::as_str)
                .ok_or(CodecError::MissingField("action_type"))?
                .to_owned();
            let data = obj.remove("data").unwrap_or(Value::Null);
            InboundMessage::TriggerAction(TriggerAction { action_type, data })
        }
        "config_update" => {
            let positions = obj.remove("positions").ok_or(CodecError::MissingField("positions"))?;
            InboundMessage::ConfigUpdate(parse_positions(positions)?)
        }
        "ping" => InboundMessage::Ping,
        "command_executed" => InboundMessage::CommandExecuted(parse_body(obj, "command_executed")?),
        "tts_message" => InboundMessage::TtsMessage(parse_body(obj, "tts_message")?),
        "sound_played" => InboundMessage::SoundPlayed(parse_body(obj, "sound_played")?),
        _ => InboundMessage::Unknown { kind },
    };
    Ok(message)
}

fn parse_positions(positions: Value) -> Result<ConfigUpdate, CodecError> {
    let raw = serde_json::from_value::<BTreeMap<String, RawPosition>>(positions)
        .map_err(|e| CodecError::InvalidField { field: "positions", reason: e.to_string() })?;
    let positions = raw
        .into_iter()
        .map(|(element, p)| WidgetPosition { element, x: p.x, y: p.y, scale: p.scale })
        .collect();
    Ok(ConfigUpdate { positions })
}

fn parse_body<T: serde::de::DeserializeOwned>(obj: Map<String, Value>, field: &'static str) -> Result<T, CodecError> {
    serde_json::from_value(Value::Object(obj)).map_err(|e| CodecError::InvalidField { field, reason: e.to_string() })
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// A message sent by the overlay to the controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Ask the controller for the current layout; sent on every connect.
    RequestConfig,
    /// A widget's final position and scale after a local edit or reset.
    PositionUpdate { element: String, x: f64, y: f64, scale: f64 },
    /// Outcome of a completed spin. `action` is omitted when the winning
    /// label carried no payload.
    WheelResult {
        result: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<Value>,
    },
}

impl OutboundMessage {
    /// The wire `type` string of this message.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestConfig => "request_config",
            Self::PositionUpdate { .. } => "position_update",
            Self::WheelResult { .. } => "wheel_result",
        }
    }
}

/// Encode an outbound message as a single JSON text frame.
#[must_use]
pub fn encode_message(message: &OutboundMessage) -> String {
    // Every variant serializes to a string-keyed object; serde_json only fails
    // on non-string map keys, which cannot occur here.
    serde_json::to_string(message).unwrap_or_default()
}

// =============================================================================
// WHEEL ACTIONS
// =============================================================================

/// Wheel action payloads the controller knows how to execute.
///
/// The overlay never interprets these; it echoes the payload back verbatim in
/// `wheel_result`. The typed view exists for log summaries.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WheelAction {
    Ban { username: String, reason: String },
    Timeout { username: String, duration: u32, reason: String },
    Unban { username: String },
    RunCommand { command: String },
    Nothing,
}

impl WheelAction {
    /// Interpret an opaque payload, if it matches a known shape.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }
}

impl fmt::Display for WheelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ban { username, reason } => write!(f, "ban {username} ({reason})"),
            Self::Timeout { username, duration, reason } => {
                write!(f, "timeout {username} for {duration}s ({reason})")
            }
            Self::Unban { username } => write!(f, "unban {username}"),
            Self::RunCommand { command } => write!(f, "run command {command}"),
            Self::Nothing => f.write_str("nothing"),
        }
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
