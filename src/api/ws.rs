// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! WebSocket message envelope of the Integration API.

use actix::Message;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use strum::{Display, EnumMessage, EnumString};

/// Common WebSocket message envelope for requests, responses and events.
///
/// The message direction and required fields are determined by `kind`:
/// - `req`: `id` and `msg` are required.
/// - `resp`: `req_id`, `msg` and `code` are required.
/// - `event`: `msg` and `cat` are required.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Message, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct WsMessage {
    pub kind: Option<String>,
    pub id: Option<u32>,
    pub req_id: Option<u32>,
    pub msg: Option<String>,
    pub code: Option<u16>,
    pub cat: Option<EventCategory>,
    pub msg_data: Option<Value>,
}

impl WsMessage {
    /// Create an event message with the given message name and payload.
    pub fn event(msg: impl Into<String>, cat: EventCategory, msg_data: Value) -> Self {
        Self {
            kind: Some("event".into()),
            msg: Some(msg.into()),
            cat: Some(cat),
            msg_data: Some(msg_data),
            ..Default::default()
        }
    }

    /// Create a response message with a json payload for the given request id.
    pub fn response_json(req_id: u32, msg: impl Into<String>, msg_data: Value) -> Self {
        Self {
            kind: Some("resp".into()),
            req_id: Some(req_id),
            msg: Some(msg.into()),
            code: Some(200),
            msg_data: Some(msg_data),
            ..Default::default()
        }
    }

    /// Create a response message for the given request id.
    ///
    /// If the payload cannot be serialized, an `INTERNAL_ERROR` result response
    /// is returned instead.
    pub fn response<T: Serialize>(req_id: u32, msg: impl Into<String>, msg_data: T) -> Self {
        match serde_json::to_value(msg_data) {
            Ok(v) => Self::response_json(req_id, msg, v),
            Err(e) => {
                error!("Error serializing response payload: {e}");
                Self::error(
                    req_id,
                    500,
                    WsResultMsgData::new("INTERNAL_ERROR", "Error serializing response payload"),
                )
            }
        }
    }

    /// Create an error result response for the given request id.
    pub fn error(req_id: u32, code: u16, msg_data: WsResultMsgData) -> Self {
        Self {
            kind: Some("resp".into()),
            req_id: Some(req_id),
            msg: Some("result".into()),
            code: Some(code),
            msg_data: serde_json::to_value(msg_data).ok(),
            ..Default::default()
        }
    }

    /// Create a `BAD_REQUEST` error response for a missing message property.
    pub fn missing_field(req_id: u32, field: &str) -> Self {
        Self::error(
            req_id,
            400,
            WsResultMsgData::new("BAD_REQUEST", format!("Missing property: {field}")),
        )
    }
}

/// Generic result message payload with a machine readable code and a human
/// readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsResultMsgData {
    pub code: String,
    pub message: String,
}

impl WsResultMsgData {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Event message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Device,
    Entity,
}

/// Requests sent from the Remote to the integration driver.
///
/// The strum message is the message name of the corresponding response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumMessage)]
#[strum(serialize_all = "snake_case")]
pub enum R2Request {
    #[strum(message = "driver_version")]
    GetDriverVersion,
    #[strum(message = "device_state")]
    GetDeviceState,
    #[strum(message = "available_entities")]
    GetAvailableEntities,
    #[strum(message = "entity_states")]
    GetEntityStates,
    #[strum(message = "result")]
    SubscribeEvents,
    #[strum(message = "result")]
    UnsubscribeEvents,
    #[strum(message = "result")]
    EntityCommand,
    #[strum(message = "driver_metadata")]
    GetDriverMetadata,
    #[strum(message = "result")]
    SetupDriver,
    #[strum(message = "result")]
    SetDriverUserData,
}

/// Events sent from the Remote to the integration driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum R2Event {
    Connect,
    Disconnect,
    EnterStandby,
    ExitStandby,
    AbortDriverSetup,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn event_message_serializes_with_category() {
        let msg = WsMessage::event(
            "device_state",
            EventCategory::Device,
            json!({ "state": "CONNECTED" }),
        );

        let value = serde_json::to_value(msg).expect("serialize WsMessage");
        assert_eq!(
            value,
            json!({
                "kind": "event",
                "msg": "device_state",
                "cat": "DEVICE",
                "msg_data": { "state": "CONNECTED" }
            })
        );
    }

    #[test]
    fn response_message_skips_absent_fields() {
        let msg = WsMessage::response(
            42,
            "result",
            WsResultMsgData::new("OK", "Command sent to hub"),
        );

        let value = serde_json::to_value(msg).expect("serialize WsMessage");
        assert_eq!(value.get("kind"), Some(&json!("resp")));
        assert_eq!(value.get("req_id"), Some(&json!(42)));
        assert_eq!(value.get("code"), Some(&json!(200)));
        assert!(value.get("id").is_none());
        assert!(value.get("cat").is_none());
    }

    #[test]
    fn request_message_deserializes() {
        let msg: WsMessage = serde_json::from_str(
            r#"{"kind": "req", "id": 7, "msg": "get_entity_states", "msg_data": {"device_id": ""}}"#,
        )
        .expect("deserialize WsMessage");

        assert_eq!(msg.kind.as_deref(), Some("req"));
        assert_eq!(msg.id, Some(7));
        assert_eq!(msg.msg.as_deref(), Some("get_entity_states"));
    }

    #[test]
    fn r2_request_from_wire_name() {
        assert_eq!(
            Ok(R2Request::GetAvailableEntities),
            R2Request::from_str("get_available_entities")
        );
        assert_eq!(
            Ok(R2Request::SetDriverUserData),
            R2Request::from_str("set_driver_user_data")
        );
        assert!(R2Request::from_str("get_unknown").is_err());
    }

    #[test]
    fn r2_request_response_message_names() {
        use strum::EnumMessage;
        assert_eq!(
            Some("available_entities"),
            R2Request::GetAvailableEntities.get_message()
        );
        assert_eq!(Some("result"), R2Request::EntityCommand.get_message());
    }
}
