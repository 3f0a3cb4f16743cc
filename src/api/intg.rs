// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Integration driver specific Integration API messages.

use crate::api::EntityType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use strum::Display;

/// Integration driver device connection state, sent in `device_state` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// `driver_version` response payload.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationVersion {
    pub api: Option<String>,
    pub integration: Option<String>,
}

/// Driver metadata, compiled in from `resources/driver.json`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationDriverUpdate {
    pub driver_id: Option<String>,
    pub name: Option<HashMap<String, String>>,
    pub driver_url: Option<String>,
    pub icon: Option<String>,
    pub token: Option<String>,
    pub version: Option<String>,
    pub min_core_api: Option<String>,
    pub description: Option<HashMap<String, String>>,
    pub developer: Option<DriverDeveloper>,
    pub home_page: Option<String>,
    pub setup_data_schema: Option<Value>,
    pub release_date: Option<String>,
    pub pwd_protected: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverDeveloper {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
}

/// `subscribe_events` / `unsubscribe_events` request payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeEvents {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub entity_ids: Vec<String>,
}

/// `available_entities` response payload.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct AvailableEntitiesMsgData {
    pub filter: Option<Value>,
    pub available_entities: Vec<AvailableEntity>,
}

/// An entity the integration exposes to the Remote.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableEntity {
    pub device_id: Option<String>,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub device_class: Option<String>,
    pub features: Option<Vec<String>>,
    pub name: HashMap<String, String>,
    pub area: Option<String>,
    pub device_info: Option<DeviceInfo>,
    pub options: Option<serde_json::Map<String, Value>>,
}

/// Physical device metadata of an entity.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub sw_version: Option<String>,
    pub hw_version: Option<String>,
}

/// `entity_change` event payload.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChange {
    pub device_id: Option<String>,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub attributes: serde_json::Map<String, Value>,
}

/// `entity_command` request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityCommand {
    #[serde(default)]
    pub device_id: Option<String>,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub cmd_id: String,
    #[serde(default)]
    pub params: Option<serde_json::Map<String, Value>>,
}

/// `setup_driver` request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupDriver {
    #[serde(default)]
    pub reconfigure: Option<bool>,
    #[serde(default)]
    pub setup_data: HashMap<String, String>,
}

/// `set_driver_user_data` request payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationSetup {
    /// Input values of a settings page.
    InputValues(HashMap<String, String>),
    /// Confirmation of a user action request.
    Confirm(bool),
}

/// `driver_setup_change` event payload.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct DriverSetupChange {
    pub event_type: SetupChangeEventType,
    pub state: IntegrationSetupState,
    pub error: Option<IntegrationSetupError>,
    pub require_user_action: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupChangeEventType {
    Start,
    Setup,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationSetupState {
    Setup,
    WaitUserAction,
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationSetupError {
    None,
    NotConfigured,
    ConnectionRefused,
    AuthorizationError,
    Timeout,
    Other,
}
