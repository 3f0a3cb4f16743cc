// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Data model of the DIRIGERA REST and WebSocket APIs.
//!
//! The hub speaks camelCase JSON. Device attributes are flattened into a single
//! optional-field struct: the REST API returns the full set per device, the
//! event stream only the changed subset.

use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

/// A device as returned by `GET /v1/devices`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub device_type: DeviceType,
    pub is_reachable: bool,
    #[serde(default)]
    pub room: Option<Room>,
    pub attributes: DeviceAttributes,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub device_set: Vec<DeviceSet>,
}

impl Device {
    /// Display name: custom name if set, otherwise model, otherwise device type.
    pub fn name(&self) -> String {
        if let Some(name) = self.attributes.custom_name.as_deref()
            && !name.trim().is_empty()
        {
            return name.to_string();
        }
        if let Some(model) = self.attributes.model.as_deref()
            && !model.is_empty()
        {
            return model.to_string();
        }
        format!("{:?}", self.device_type)
    }

    /// Check the `canReceive` capability list before patching an attribute.
    pub fn can_receive(&self, attribute: &str) -> bool {
        self.capabilities
            .can_receive
            .iter()
            .any(|c| c == attribute)
    }
}

/// `deviceType` values. Unknown types must not fail deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceType {
    Gateway,
    Outlet,
    Light,
    Blinds,
    AirPurifier,
    EnvironmentSensor,
    MotionSensor,
    OpenCloseSensor,
    WaterSensor,
    LightController,
    BlindsController,
    SoundController,
    Controller,
    #[serde(other)]
    Unknown,
}

/// Flattened device attributes of all supported device types.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAttributes {
    // common device information
    pub custom_name: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub firmware_version: Option<String>,
    pub hardware_version: Option<String>,
    pub serial_number: Option<String>,
    pub product_code: Option<String>,
    pub ota_status: Option<String>,
    pub ota_state: Option<String>,
    pub ota_progress: Option<u8>,
    pub battery_percentage: Option<u8>,
    // outlet
    pub is_on: Option<bool>,
    pub startup_on_off: Option<StartupBehavior>,
    pub current_active_power: Option<f64>,
    pub current_amps: Option<f64>,
    pub current_voltage: Option<f64>,
    pub total_energy_consumed: Option<f64>,
    pub energy_consumed_at_last_reset: Option<f64>,
    pub time_of_last_energy_reset: Option<String>,
    pub status_light: Option<bool>,
    pub child_lock: Option<bool>,
    // light. lightLevel is 1..100, colorSaturation 0..1, color temperatures in
    // Kelvin: colorTemperatureAtMin holds the coldest (highest) value, the
    // warmest is in colorTemperatureAtMax.
    pub light_level: Option<u8>,
    pub color_hue: Option<f64>,
    pub color_saturation: Option<f64>,
    pub color_temperature: Option<u16>,
    #[serde(rename = "colorTemperatureAtMin")]
    pub color_temperature_min: Option<u16>,
    #[serde(rename = "colorTemperatureAtMax")]
    pub color_temperature_max: Option<u16>,
    pub color_mode: Option<String>,
    // blinds. Levels are 0..100 with 0 = fully open.
    pub blinds_current_level: Option<u8>,
    pub blinds_target_level: Option<u8>,
    pub blinds_state: Option<String>,
    // air purifier. motorState 0 = off, 1 = auto, 10..50 = manual speed.
    pub fan_mode: Option<FanMode>,
    pub motor_state: Option<u8>,
    pub motor_runtime: Option<u64>,
    pub filter_alarm_status: Option<bool>,
    #[serde(rename = "currentPM25")]
    pub current_pm25: Option<u16>,
    // sensors
    pub current_temperature: Option<f64>,
    #[serde(rename = "currentRH")]
    pub current_rh: Option<u8>,
    pub voc_index: Option<u16>,
    pub is_detected: Option<bool>,
    pub is_open: Option<bool>,
    pub water_leak_detected: Option<bool>,
    pub illuminance: Option<u32>,
    // misc
    pub permitting_join: Option<bool>,
    pub identify_period: Option<u16>,
}

impl DeviceAttributes {
    /// Merge a partial attribute update from the event stream into the cached
    /// attributes. Only keys present in `update` are replaced, everything else
    /// keeps its last known value.
    pub fn merge(&mut self, update: &Map<String, Value>) -> Result<(), ServiceError> {
        let mut current = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in update {
            current.insert(key.clone(), value.clone());
        }
        *self = serde_json::from_value(Value::Object(current))?;
        Ok(())
    }
}

/// Power-outage recovery behavior of outlets and lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StartupBehavior {
    StartOn,
    StartOff,
    StartPrevious,
    StartToggle,
}

/// Air purifier fan mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FanMode {
    Auto,
    Low,
    Medium,
    High,
    On,
    Off,
    #[serde(other)]
    Unknown,
}

/// Attribute names the device accepts commands for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub can_send: Vec<String>,
    #[serde(default)]
    pub can_receive: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
}

/// Device set membership, e.g. bulbs grouped in the IKEA app.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A scene as returned by `GET /v1/scenes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    #[serde(rename = "type")]
    pub scene_type: String,
    pub info: SceneInfo,
    #[serde(default)]
    pub last_triggered: Option<String>,
    #[serde(default)]
    pub last_undo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneInfo {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Event envelope of the hub WebSocket stream.
#[derive(Debug, Clone, Deserialize)]
pub struct HubEvent {
    pub id: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub event_type: HubEventType,
    pub data: Value,
}

/// Known hub event types. The stream must survive unknown types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HubEventType {
    DeviceStateChanged,
    DeviceAdded,
    DeviceRemoved,
    SceneCreated,
    SceneUpdated,
    SceneDeleted,
    #[serde(other)]
    Unknown,
}

/// `deviceStateChanged` event payload: partial device state.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    pub id: String,
    #[serde(default)]
    pub is_reachable: Option<bool>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
}

/// `GET /v1/oauth/authorize` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthCode {
    pub code: String,
}

/// `POST /v1/oauth/token` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn light_json() -> Value {
        json!({
            "id": "f430fd01-63ca-44d4-a54f-b4b0b80a5f1d_1",
            "type": "light",
            "deviceType": "light",
            "createdAt": "2023-03-28T21:05:33.000Z",
            "isReachable": true,
            "lastSeen": "2023-04-02T07:32:20.000Z",
            "attributes": {
                "customName": "Desk lamp",
                "model": "TRADFRI bulb E27 CWS 806lm",
                "manufacturer": "IKEA of Sweden",
                "firmwareVersion": "1.0.36",
                "hardwareVersion": "1",
                "isOn": false,
                "startupOnOff": "startPrevious",
                "lightLevel": 42,
                "colorHue": 120.0,
                "colorSaturation": 0.7,
                "colorTemperature": 3003,
                "colorTemperatureAtMin": 4000,
                "colorTemperatureAtMax": 2202,
                "colorMode": "color",
                "permittingJoin": false,
                "otaStatus": "upToDate"
            },
            "capabilities": {
                "canSend": [],
                "canReceive": ["customName", "isOn", "lightLevel", "colorHue", "colorSaturation"]
            },
            "room": {
                "id": "f2cf3d86-9346-4668-a3b4-a2cecaa0c1a7",
                "name": "Office",
                "color": "ikea_yellow_no_24",
                "icon": "rooms_cutlery"
            },
            "deviceSet": [],
            "remoteLinks": [],
            "isHidden": false
        })
    }

    #[test]
    fn deserialize_light_device() {
        let device: Device = serde_json::from_value(light_json()).expect("valid device json");

        assert_eq!(DeviceType::Light, device.device_type);
        assert!(device.is_reachable);
        assert_eq!(Some("Desk lamp"), device.attributes.custom_name.as_deref());
        assert_eq!(Some(42), device.attributes.light_level);
        assert_eq!(Some(3003), device.attributes.color_temperature);
        assert_eq!(Some(4000), device.attributes.color_temperature_min);
        assert_eq!(Some(2202), device.attributes.color_temperature_max);
        assert_eq!(Some("Office"), device.room.as_ref().map(|r| r.name.as_str()));
        assert!(device.can_receive("isOn"));
        assert!(!device.can_receive("blindsTargetLevel"));
        assert_eq!("Desk lamp", device.name());
    }

    #[test]
    fn unknown_device_type_deserializes_to_unknown() {
        let device: Device = serde_json::from_value(json!({
            "id": "abc",
            "deviceType": "speaker",
            "isReachable": true,
            "attributes": {}
        }))
        .expect("unknown device type must not fail");

        assert_eq!(DeviceType::Unknown, device.device_type);
    }

    #[test]
    fn device_name_falls_back_to_model() {
        let device: Device = serde_json::from_value(json!({
            "id": "abc",
            "deviceType": "outlet",
            "isReachable": true,
            "attributes": { "customName": "", "model": "TRETAKT Smart plug" }
        }))
        .unwrap();

        assert_eq!("TRETAKT Smart plug", device.name());
    }

    #[test]
    fn attribute_renames_for_sensor_measurements() {
        let attributes: DeviceAttributes = serde_json::from_value(json!({
            "currentTemperature": 19.0,
            "currentRH": 48,
            "currentPM25": 7,
            "vocIndex": 112
        }))
        .unwrap();

        assert_eq!(Some(19.0), attributes.current_temperature);
        assert_eq!(Some(48), attributes.current_rh);
        assert_eq!(Some(7), attributes.current_pm25);
        assert_eq!(Some(112), attributes.voc_index);
    }

    #[test]
    fn merge_replaces_only_present_keys() {
        let mut attributes: DeviceAttributes = serde_json::from_value(json!({
            "isOn": false,
            "lightLevel": 50,
            "colorTemperature": 2700
        }))
        .unwrap();

        let update = json!({ "isOn": true, "lightLevel": 80 });
        attributes
            .merge(update.as_object().unwrap())
            .expect("merge partial update");

        assert_eq!(Some(true), attributes.is_on);
        assert_eq!(Some(80), attributes.light_level);
        assert_eq!(Some(2700), attributes.color_temperature);
    }

    #[test]
    fn deserialize_hub_event() {
        let event: HubEvent = serde_json::from_value(json!({
            "id": "6e--------------------------9f5c",
            "time": "2023-04-02T07:33:31.000Z",
            "specversion": "1.1.0",
            "source": "urn:dirigera:hub",
            "type": "deviceStateChanged",
            "data": {
                "id": "f430fd01-63ca-44d4-a54f-b4b0b80a5f1d_1",
                "isReachable": true,
                "attributes": { "isOn": true }
            }
        }))
        .expect("valid hub event");

        assert_eq!(HubEventType::DeviceStateChanged, event.event_type);
        let update: DeviceUpdate = serde_json::from_value(event.data).unwrap();
        assert_eq!("f430fd01-63ca-44d4-a54f-b4b0b80a5f1d_1", update.id);
        assert_eq!(
            Some(&json!(true)),
            update.attributes.as_ref().and_then(|a| a.get("isOn"))
        );
    }

    #[test]
    fn unknown_event_type_deserializes_to_unknown() {
        let event: HubEvent = serde_json::from_value(json!({
            "id": "1",
            "type": "rulesetUpdated",
            "data": {}
        }))
        .unwrap();

        assert_eq!(HubEventType::Unknown, event.event_type);
    }

    #[test]
    fn deserialize_scene() {
        let scene: Scene = serde_json::from_value(json!({
            "id": "3cc58bf5-64cc-4c21-92b3-ecc4a3ad7608",
            "type": "userScene",
            "info": { "name": "Movie night", "icon": "scenes_movie_night" },
            "triggers": [],
            "actions": [],
            "lastTriggered": "2023-04-01T20:15:00.000Z"
        }))
        .expect("valid scene json");

        assert_eq!("Movie night", scene.info.name);
        assert_eq!("userScene", scene.scene_type);
        assert!(scene.last_undo.is_none());
    }
}
