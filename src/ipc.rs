//! Wire types for the JSON Lines protocol over TCP.
//!
//! Two directions share one socket:
//! - commands from clients (`UPDATE`, `GET`, `SUB`, `STATUS`) answered by an
//!   [`IpcResponse`] envelope;
//! - `drill_state` messages pushed to subscribers:
//!   `{"type":"drill_state","payload":{"bit":[lon,lat,h],"path":[[lon,lat,h],...],"md":0.0}}`.
//!
//! Positions travel as `[lon, lat]` or `[lon, lat, height]` arrays; a missing
//! or `null` height means 0 and entries past the third are ignored.

use crate::geo::Position;
use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// IPC protocol version. Included in every command and response.
pub const IPC_VERSION: u32 = 1;

/// `type` tag of the drill state message.
pub const DRILL_STATE_TYPE: &str = "drill_state";

/// Errors raised while decoding wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The line is not valid JSON or does not match the expected shape.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// A command named a verb the server does not know.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A command carried a protocol version this build does not speak.
    #[error("unsupported protocol version {got} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the command.
        got: u32,
        /// Version this build speaks.
        expected: u32,
    },
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(3)?;
        tup.serialize_element(&self.lon)?;
        tup.serialize_element(&self.lat)?;
        tup.serialize_element(&self.height)?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionVisitor;

        impl<'de> Visitor<'de> for PositionVisitor {
            type Value = Position;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array [lon, lat] or [lon, lat, height]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Position, A::Error> {
                let lon: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let lat: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let height: Option<f64> = seq.next_element::<Option<f64>>()?.flatten();
                // Trailing entries (e.g. a per-point md) are ignored.
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                let p = Position::new(lon, lat, height.unwrap_or(0.0));
                if ![p.lon, p.lat, p.height].iter().all(|v| v.is_finite()) {
                    return Err(de::Error::custom(format!(
                        "non-finite position: lon={lon}, lat={lat}"
                    )));
                }
                Ok(p)
            }
        }

        deserializer.deserialize_seq(PositionVisitor)
    }
}

/// Payload of a `drill_state` message.
///
/// Every field is optional: receivers apply what is present and keep the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillState {
    /// Current bit position.
    #[serde(default)]
    pub bit: Option<Position>,
    /// Recorded trajectory, first point at the surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Position>>,
    /// Measured depth in metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<f64>,
}

/// Envelope pushed from server to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillStateMessage {
    /// Message type tag, always [`DRILL_STATE_TYPE`] when produced here.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Drill state payload.
    pub payload: DrillState,
}

impl DrillStateMessage {
    pub fn new(payload: DrillState) -> Self {
        Self {
            message_type: DRILL_STATE_TYPE.to_string(),
            payload,
        }
    }

    /// Serializes to a JSON line (with trailing newline).
    pub fn to_json_line(&self) -> String {
        let json = serde_json::to_string(self).expect("failed to serialize DrillStateMessage");
        format!("{}\n", json)
    }
}

/// A decoded server push.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// A `drill_state` message. `None` when the payload is absent or null.
    DrillState(Option<DrillState>),
    /// Any other message type; receivers ignore it.
    Other(String),
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

/// Parses one line pushed by the server.
///
/// Only the `drill_state` payload is decoded; other types are reported as
/// [`ServerMessage::Other`] without looking at their payload.
pub fn parse_server_message(line: &str) -> Result<ServerMessage, ProtocolError> {
    let raw: RawEnvelope = serde_json::from_str(line)?;
    if raw.message_type != DRILL_STATE_TYPE {
        return Ok(ServerMessage::Other(raw.message_type));
    }
    let payload = match raw.payload {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => Some(serde_json::from_value::<DrillState>(value)?),
    };
    Ok(ServerMessage::DrillState(payload))
}

/// Command verbs understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcCommandKind {
    /// Merge a partial drill state and broadcast it.
    Update,
    /// Return the current drill state.
    Get,
    /// Stream drill state messages.
    Sub,
    /// Return server health.
    Status,
}

impl fmt::Display for IpcCommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IpcCommandKind::Update => "UPDATE",
            IpcCommandKind::Get => "GET",
            IpcCommandKind::Sub => "SUB",
            IpcCommandKind::Status => "STATUS",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for IpcCommandKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UPDATE" => Ok(IpcCommandKind::Update),
            "GET" => Ok(IpcCommandKind::Get),
            "SUB" => Ok(IpcCommandKind::Sub),
            "STATUS" => Ok(IpcCommandKind::Status),
            _ => Err(ProtocolError::UnknownCommand(s.to_string())),
        }
    }
}

/// Incoming command from a client to the server.
///
/// Every command is a single JSON line:
/// `{"version": 1, "cmd": "UPDATE", "bit": [50.0, 25.0, -120.0]}\n`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcCommand {
    /// Protocol version (must be [`IPC_VERSION`]).
    pub version: u32,
    /// Command name (UPDATE, GET, SUB, STATUS).
    pub cmd: String,
    /// Bit position (for UPDATE).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit: Option<Position>,
    /// Measured depth (for UPDATE).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<f64>,
    /// Trajectory (for UPDATE). Ignored when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Position>>,
}

impl IpcCommand {
    /// Creates a command with no payload fields.
    pub fn new(kind: IpcCommandKind) -> Self {
        Self {
            version: IPC_VERSION,
            cmd: kind.to_string(),
            bit: None,
            md: None,
            path: None,
        }
    }

    /// Creates an UPDATE command carrying the given partial state.
    pub fn update(state: DrillState) -> Self {
        Self {
            bit: state.bit,
            md: state.md,
            path: state.path,
            ..Self::new(IpcCommandKind::Update)
        }
    }

    /// Parses the verb, checking the protocol version first.
    pub fn kind(&self) -> Result<IpcCommandKind, ProtocolError> {
        if self.version != IPC_VERSION {
            return Err(ProtocolError::UnsupportedVersion {
                got: self.version,
                expected: IPC_VERSION,
            });
        }
        self.cmd.parse()
    }

    /// Serializes to a JSON line (with trailing newline).
    pub fn to_json_line(&self) -> String {
        let json = serde_json::to_string(self).expect("failed to serialize IpcCommand");
        format!("{}\n", json)
    }
}

/// Response envelope from server to client.
///
/// Sent as a single JSON line: `{"version": 1, "ok": true, ...}\n`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Protocol version.
    pub version: u32,
    /// Whether the command succeeded.
    pub ok: bool,
    /// Error message when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Command-specific payload (varies by command).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl IpcResponse {
    /// Creates a success response with optional data payload.
    pub fn success(data: Option<serde_json::Value>) -> Self {
        Self {
            version: IPC_VERSION,
            ok: true,
            error: None,
            data,
        }
    }

    /// Creates an error response with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            version: IPC_VERSION,
            ok: false,
            error: Some(message.into()),
            data: None,
        }
    }

    /// Serializes to a JSON line (with trailing newline).
    pub fn to_json_line(&self) -> String {
        let json = serde_json::to_string(self).expect("failed to serialize IpcResponse");
        format!("{}\n", json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_height_defaults_to_zero() {
        let p: Position = serde_json::from_str("[50.0, 25.0]").expect("two-element array");
        assert_eq!(p, Position::new(50.0, 25.0, 0.0));

        let p: Position = serde_json::from_str("[50.0, 25.0, null]").expect("null height");
        assert_eq!(p.height, 0.0);
    }

    #[test]
    fn position_rejects_short_arrays_and_objects() {
        assert!(serde_json::from_str::<Position>("[50.0]").is_err());
        assert!(serde_json::from_str::<Position>(r#"{"lon": 1.0}"#).is_err());
        assert!(serde_json::from_str::<Position>(r#"[50.0, "north"]"#).is_err());
    }

    #[test]
    fn position_ignores_extra_entries() {
        let p: Position = serde_json::from_str("[1.0, 2.0, 3.0, 4.0]").unwrap();
        assert_eq!(p, Position::new(1.0, 2.0, 3.0));
        let p: Position = serde_json::from_str(r#"[1.0, 2.0, null, "md", [9]]"#).unwrap();
        assert_eq!(p, Position::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn position_keeps_out_of_range_coordinates() {
        let p: Position = serde_json::from_str("[200.0, 25.0, 0.0]").unwrap();
        assert_eq!(p.lon, 200.0);
        assert!(!p.is_valid());
    }

    #[test]
    fn drill_state_with_four_entry_path_points_keeps_bit() {
        let line = r#"{"type":"drill_state","payload":{"bit":[50,25,-10],"path":[[50,25,0,0],[50,25,-10,10]]}}"#;
        match parse_server_message(line).unwrap() {
            ServerMessage::DrillState(Some(state)) => {
                assert_eq!(state.bit, Some(Position::new(50.0, 25.0, -10.0)));
                assert_eq!(state.path.map(|p| p.len()), Some(2));
            }
            other => panic!("expected drill state, got {:?}", other),
        }
    }

    #[test]
    fn position_serializes_as_triple() {
        let json = serde_json::to_string(&Position::new(1.5, 2.5, -3.0)).unwrap();
        assert_eq!(json, "[1.5,2.5,-3.0]");
    }

    #[test]
    fn parse_drill_state_message() {
        let line = r#"{"type":"drill_state","payload":{"bit":[50.0,25.0,-100],"path":[[50.0,25.0],[50.0,25.0,-100]]}}"#;
        match parse_server_message(line).unwrap() {
            ServerMessage::DrillState(Some(state)) => {
                assert_eq!(state.bit, Some(Position::new(50.0, 25.0, -100.0)));
                let path = state.path.expect("path present");
                assert_eq!(path.len(), 2);
                assert_eq!(path[0].height, 0.0);
                assert!(state.md.is_none());
            }
            other => panic!("expected drill state, got {:?}", other),
        }
    }

    #[test]
    fn parse_drill_state_with_null_payload() {
        let msg = parse_server_message(r#"{"type":"drill_state","payload":null}"#).unwrap();
        assert_eq!(msg, ServerMessage::DrillState(None));
        let msg = parse_server_message(r#"{"type":"drill_state"}"#).unwrap();
        assert_eq!(msg, ServerMessage::DrillState(None));
    }

    #[test]
    fn parse_other_type_skips_payload() {
        let msg = parse_server_message(r#"{"type":"heartbeat","payload":[1,2,3]}"#).unwrap();
        assert_eq!(msg, ServerMessage::Other("heartbeat".to_string()));
    }

    #[test]
    fn parse_garbage_is_error() {
        assert!(parse_server_message("not json").is_err());
        assert!(parse_server_message(r#"{"payload":{}}"#).is_err());
        assert!(
            parse_server_message(r#"{"type":"drill_state","payload":{"bit":[1]}}"#).is_err()
        );
    }

    #[test]
    fn server_payload_with_null_bit_round_trips() {
        let msg = DrillStateMessage::new(DrillState {
            bit: None,
            path: Some(vec![]),
            md: Some(0.0),
        });
        let line = msg.to_json_line();
        assert!(line.ends_with('\n'));
        assert!(line.contains(r#""bit":null"#));
        let parsed = parse_server_message(line.trim()).unwrap();
        assert_eq!(parsed, ServerMessage::DrillState(Some(msg.payload)));
    }

    #[test]
    fn command_kind_parses_case_insensitively() {
        assert_eq!("update".parse::<IpcCommandKind>().unwrap(), IpcCommandKind::Update);
        assert_eq!("SUB".parse::<IpcCommandKind>().unwrap(), IpcCommandKind::Sub);
        assert!(matches!(
            "DROP".parse::<IpcCommandKind>(),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn command_kind_checks_version() {
        let mut cmd = IpcCommand::new(IpcCommandKind::Get);
        assert_eq!(cmd.kind().unwrap(), IpcCommandKind::Get);
        cmd.version = 99;
        assert!(matches!(
            cmd.kind(),
            Err(ProtocolError::UnsupportedVersion { got: 99, .. })
        ));
    }

    #[test]
    fn update_command_omits_absent_fields() {
        let cmd = IpcCommand::update(DrillState {
            bit: Some(Position::new(1.0, 2.0, 3.0)),
            path: None,
            md: None,
        });
        let line = cmd.to_json_line();
        assert!(line.contains(r#""cmd":"UPDATE""#));
        assert!(line.contains(r#""bit":[1.0,2.0,3.0]"#));
        assert!(!line.contains("path"));
        assert!(!line.contains("md"));
    }

    #[test]
    fn response_error_has_no_data() {
        let line = IpcResponse::error("boom").to_json_line();
        let resp: IpcResponse = serde_json::from_str(line.trim()).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("boom"));
        assert!(resp.data.is_none());
    }
}
