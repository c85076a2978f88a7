//! Socket.IO v5 framing over Engine.IO v4 websocket frames
//!
//! Only the subset the dashboard uses is understood: the engine handshake,
//! ping/pong, namespace connect and events on the default namespace.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConsoleError, Result};
use crate::model::SensorReading;

/// Engine.IO `pong`, the reply to a server ping
pub const PONG: &str = "3";

/// Event carrying one sensor reading
pub const SENSOR_DATA: &str = "sensor-data";
pub const JOIN_PROJECT: &str = "join-project";
pub const LEAVE_PROJECT: &str = "leave-project";
pub const SENSOR_COMMAND: &str = "sensor-command";

/// Parameters from the engine `open` packet
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// One decoded websocket frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connected { sid: Option<String> },
    ConnectError { message: String },
    Disconnect,
    Event { name: String, args: Vec<Value> },
    /// Socket packets the client has no use for, such as acks
    Ignored,
}

/// Decode one text frame
pub fn decode(text: &str) -> Result<Frame> {
    let mut chars = text.chars();
    let engine = chars
        .next()
        .ok_or_else(|| ConsoleError::Protocol("Empty frame".to_string()))?;
    let rest = chars.as_str();

    match engine {
        '0' => Ok(Frame::Open(serde_json::from_str(rest).map_err(|e| {
            ConsoleError::Protocol(format!("Invalid open packet: {}", e))
        })?)),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping),
        '3' => Ok(Frame::Pong),
        '4' => decode_socket_packet(rest),
        '6' => Ok(Frame::Noop),
        other => Err(ConsoleError::Protocol(format!(
            "Unknown engine packet type '{}'",
            other
        ))),
    }
}

fn decode_socket_packet(text: &str) -> Result<Frame> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ConsoleError::Protocol("Empty socket packet".to_string()))?;
    let payload = strip_ack_id(strip_namespace(chars.as_str()));

    match kind {
        '0' => {
            let sid = serde_json::from_str::<Value>(payload)
                .ok()
                .and_then(|v| v.get("sid").and_then(Value::as_str).map(str::to_string));
            Ok(Frame::Connected { sid })
        }
        '1' => Ok(Frame::Disconnect),
        '2' => {
            let mut items: Vec<Value> = serde_json::from_str(payload)
                .map_err(|e| ConsoleError::Protocol(format!("Invalid event payload: {}", e)))?;
            if items.is_empty() {
                return Err(ConsoleError::Protocol("Event without a name".to_string()));
            }
            let name = match items.remove(0) {
                Value::String(name) => name,
                other => {
                    return Err(ConsoleError::Protocol(format!(
                        "Event name is not a string: {}",
                        other
                    )))
                }
            };
            Ok(Frame::Event { name, args: items })
        }
        '4' => {
            let message = serde_json::from_str::<Value>(payload)
                .ok()
                .and_then(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Object(map) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .unwrap_or_else(|| payload.to_string());
            Ok(Frame::ConnectError { message })
        }
        _ => Ok(Frame::Ignored),
    }
}

/// Drop a leading `/namespace,` if present
fn strip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        match text.find(',') {
            Some(idx) => &text[idx + 1..],
            None => "",
        }
    } else {
        text
    }
}

fn strip_ack_id(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_ascii_digit())
}

/// Namespace connect packet authenticating with `token`
pub fn connect_frame(token: Option<&str>) -> String {
    match token {
        Some(token) => format!("40{}", serde_json::json!({ "token": token })),
        None => "40".to_string(),
    }
}

/// Event packet on the default namespace
pub fn event_frame(name: &str, arg: &Value) -> String {
    format!("42{}", serde_json::json!([name, arg]))
}

/// Extract the reading from a `sensor-data` event
pub fn sensor_reading(args: &[Value]) -> Result<SensorReading> {
    let payload = args
        .first()
        .ok_or_else(|| ConsoleError::Protocol("sensor-data without payload".to_string()))?;
    serde_json::from_value(payload.clone())
        .map_err(|e| ConsoleError::Protocol(format!("Invalid sensor-data payload: {}", e)))
}
