//! Wire envelopes exchanged with connected clients.
//!
//! Every frame is one JSON object. Requests carry a positive `msgID` that
//! the matching response echoes back; frames the hub sends on its own
//! initiative use [`UNSOLICITED_MSG_ID`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::device::DeviceSnapshot;
use crate::error::ProtocolViolation;
use crate::event::EventKind;

/// `msgID` carried by server-initiated frames.
pub const UNSOLICITED_MSG_ID: i64 = 0;

/// An inbound request: `{"msgID": <int>, "request": <name>, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(rename = "msgID")]
    pub msg_id: i64,
    pub request: String,
    /// Request-specific fields, kept for handlers that need them.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl RequestEnvelope {
    /// Parse a text frame and check that its `msgID` is positive.
    ///
    /// Whether `request` names a known handler is the dispatcher's call.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolViolation::Malformed`] when the frame is not a
    /// request object and [`ProtocolViolation::NonPositiveMsgId`] when
    /// `msgID <= 0`.
    pub fn parse(text: &str) -> Result<Self, ProtocolViolation> {
        let envelope: Self = serde_json::from_str(text).map_err(ProtocolViolation::Malformed)?;
        if envelope.msg_id <= 0 {
            return Err(ProtocolViolation::NonPositiveMsgId(envelope.msg_id));
        }
        Ok(envelope)
    }
}

/// Response to the `devicelist` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceListResponse {
    #[serde(rename = "msgID")]
    pub msg_id: i64,
    pub devices: BTreeMap<String, DeviceSnapshot>,
}

/// Unsolicited frame announcing a device change to every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "msgID")]
    pub msg_id: i64,
    pub event: EventKind,
    pub device: DeviceSnapshot,
}

impl Notification {
    #[must_use]
    pub fn new(event: EventKind, device: DeviceSnapshot) -> Self {
        Self {
            msg_id: UNSOLICITED_MSG_ID,
            event,
            device,
        }
    }
}
