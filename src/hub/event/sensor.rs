// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Sensor entity event conversion.
//!
//! All sensor values of a device are reported as separate entities, the entity
//! id suffixes must match the available entity mapping.

use crate::api::EntityType;
use crate::api::intg::EntityChange;
use crate::hub::model::Device;
use serde_json::Value;

pub(crate) fn environment_sensor_changes(device: &Device) -> Vec<EntityChange> {
    let attrs = &device.attributes;
    let mut changes = Vec::with_capacity(4);

    if let Some(value) = attrs.current_temperature {
        changes.push(sensor_change(device, "temperature", value.into(), "°C"));
    }
    if let Some(value) = attrs.current_rh {
        changes.push(sensor_change(device, "humidity", value.into(), "%"));
    }
    if let Some(value) = attrs.current_pm25 {
        changes.push(sensor_change(device, "pm25", value.into(), "µg/m³"));
    }
    if let Some(value) = attrs.voc_index {
        changes.push(sensor_change(device, "voc_index", value.into(), ""));
    }
    if let Some(value) = attrs.illuminance {
        changes.push(sensor_change(device, "illuminance", value.into(), "lx"));
    }
    changes.extend(battery_sensor_change(device));

    changes
}

pub(crate) fn motion_sensor_changes(device: &Device) -> Vec<EntityChange> {
    let mut changes = Vec::with_capacity(2);
    if let Some(detected) = device.attributes.is_detected {
        changes.push(binary_sensor_change(device, "motion", detected));
    }
    if let Some(value) = device.attributes.illuminance {
        changes.push(sensor_change(device, "illuminance", value.into(), "lx"));
    }
    changes.extend(battery_sensor_change(device));
    changes
}

pub(crate) fn open_close_sensor_changes(device: &Device) -> Vec<EntityChange> {
    let mut changes = Vec::with_capacity(2);
    if let Some(open) = device.attributes.is_open {
        changes.push(binary_sensor_change(device, "open", open));
    }
    changes.extend(battery_sensor_change(device));
    changes
}

pub(crate) fn water_sensor_changes(device: &Device) -> Vec<EntityChange> {
    let mut changes = Vec::with_capacity(2);
    if let Some(leak) = device.attributes.water_leak_detected {
        changes.push(binary_sensor_change(device, "leak", leak));
    }
    changes.extend(battery_sensor_change(device));
    changes
}

pub(crate) fn battery_sensor_change(device: &Device) -> Option<EntityChange> {
    device
        .attributes
        .battery_percentage
        .map(|value| sensor_change(device, "battery", value.into(), "%"))
}

fn sensor_change(device: &Device, suffix: &str, value: Value, unit: &str) -> EntityChange {
    let mut attributes = serde_json::Map::with_capacity(3);
    if !device.is_reachable {
        attributes.insert("state".into(), "UNAVAILABLE".into());
    }
    attributes.insert("value".into(), value);
    if !unit.is_empty() {
        attributes.insert("unit".into(), unit.into());
    }

    EntityChange {
        device_id: None,
        entity_type: EntityType::Sensor,
        entity_id: format!("{}_{suffix}", device.id),
        attributes,
    }
}

fn binary_sensor_change(device: &Device, suffix: &str, value: bool) -> EntityChange {
    let mut attributes = serde_json::Map::with_capacity(3);
    let state = if !device.is_reachable {
        "UNAVAILABLE"
    } else if value {
        "ON"
    } else {
        "OFF"
    };
    attributes.insert("value".into(), value.into());
    attributes.insert("state".into(), state.into());
    attributes.insert("unit".into(), "boolean".into());

    EntityChange {
        device_id: None,
        entity_type: EntityType::Sensor,
        entity_id: format!("{}_{suffix}", device.id),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::entity::{convert_environment_sensors, convert_motion_sensor};
    use serde_json::json;

    #[test]
    fn environment_sensor_changes_carry_value_and_unit() {
        let device: Device = serde_json::from_value(json!({
            "id": "env-1",
            "deviceType": "environmentSensor",
            "isReachable": true,
            "attributes": {
                "currentTemperature": 21.5,
                "currentRH": 45,
                "currentPM25": 5
            }
        }))
        .unwrap();

        let changes = environment_sensor_changes(&device);

        assert_eq!(3, changes.len());
        assert_eq!("env-1_temperature", changes[0].entity_id);
        assert_eq!(Some(&json!(21.5)), changes[0].attributes.get("value"));
        assert_eq!(Some(&json!("°C")), changes[0].attributes.get("unit"));
        assert_eq!(Some(&json!("µg/m³")), changes[2].attributes.get("unit"));
    }

    #[test]
    fn motion_sensor_reports_boolean_value_and_state() {
        let device: Device = serde_json::from_value(json!({
            "id": "motion-1",
            "deviceType": "motionSensor",
            "isReachable": true,
            "attributes": { "isDetected": true, "batteryPercentage": 74 }
        }))
        .unwrap();

        let changes = motion_sensor_changes(&device);

        assert_eq!(2, changes.len());
        assert_eq!("motion-1_motion", changes[0].entity_id);
        assert_eq!(Some(&json!(true)), changes[0].attributes.get("value"));
        assert_eq!(Some(&json!("ON")), changes[0].attributes.get("state"));
        assert_eq!(Some(&json!("boolean")), changes[0].attributes.get("unit"));
        assert_eq!("motion-1_battery", changes[1].entity_id);
        assert_eq!(Some(&json!(74)), changes[1].attributes.get("value"));
    }

    #[test]
    fn unreachable_sensor_is_unavailable() {
        let device: Device = serde_json::from_value(json!({
            "id": "leak-1",
            "deviceType": "waterSensor",
            "isReachable": false,
            "attributes": { "waterLeakDetected": false }
        }))
        .unwrap();

        let changes = water_sensor_changes(&device);

        assert_eq!(
            Some(&json!("UNAVAILABLE")),
            changes[0].attributes.get("state")
        );
    }

    // entity ids of state changes must match the advertised entities
    #[test]
    fn change_ids_match_available_entity_ids() {
        let env: Device = serde_json::from_value(json!({
            "id": "env-1",
            "deviceType": "environmentSensor",
            "isReachable": true,
            "attributes": {
                "currentTemperature": 20.0,
                "currentRH": 50,
                "currentPM25": 3,
                "vocIndex": 100,
                "batteryPercentage": 90
            }
        }))
        .unwrap();
        let motion: Device = serde_json::from_value(json!({
            "id": "motion-1",
            "deviceType": "motionSensor",
            "isReachable": true,
            "attributes": { "isDetected": false, "illuminance": 15, "batteryPercentage": 80 }
        }))
        .unwrap();

        let entity_ids: Vec<String> = convert_environment_sensors(&env)
            .into_iter()
            .chain(convert_motion_sensor(&motion))
            .map(|e| e.entity_id)
            .collect();
        let change_ids: Vec<String> = environment_sensor_changes(&env)
            .into_iter()
            .chain(motion_sensor_changes(&motion))
            .map(|c| c.entity_id)
            .collect();

        assert_eq!(entity_ids, change_ids);
    }
}
