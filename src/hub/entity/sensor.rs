// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Sensor entity mapping.
//!
//! Environment sensors expose one sensor entity per measurement, binary
//! sensors (motion, open/close, water leak) map to custom sensors and remote
//! controllers only expose their battery level. Entity ids are
//! `{device_id}_{suffix}`, the suffixes must match the event mapping.

use super::{device_area, device_info, entity_name};
use crate::api::intg::AvailableEntity;
use crate::api::{EntityType, SensorDeviceClass, SensorOption};
use crate::hub::model::Device;

pub(crate) fn convert_environment_sensors(device: &Device) -> Vec<AvailableEntity> {
    let attributes = &device.attributes;
    let mut entities = Vec::with_capacity(4);

    if attributes.current_temperature.is_some() {
        entities.push(sensor_entity(
            device,
            "temperature",
            "Temperature",
            SensorDeviceClass::Temperature,
            None,
        ));
    }
    if attributes.current_rh.is_some() {
        entities.push(sensor_entity(
            device,
            "humidity",
            "Humidity",
            SensorDeviceClass::Humidity,
            None,
        ));
    }
    if attributes.current_pm25.is_some() {
        entities.push(sensor_entity(
            device,
            "pm25",
            "PM2.5",
            SensorDeviceClass::Custom,
            Some("µg/m³"),
        ));
    }
    if attributes.voc_index.is_some() {
        entities.push(sensor_entity(
            device,
            "voc_index",
            "VOC index",
            SensorDeviceClass::Custom,
            None,
        ));
    }
    if attributes.illuminance.is_some() {
        entities.push(sensor_entity(
            device,
            "illuminance",
            "Illuminance",
            SensorDeviceClass::Custom,
            Some("lx"),
        ));
    }
    entities.extend(convert_battery_sensor(device));

    entities
}

pub(crate) fn convert_motion_sensor(device: &Device) -> Vec<AvailableEntity> {
    let mut entities = vec![sensor_entity(
        device,
        "motion",
        "Motion",
        SensorDeviceClass::Custom,
        None,
    )];
    // VALLHORN motion sensors also measure ambient light
    if device.attributes.illuminance.is_some() {
        entities.push(sensor_entity(
            device,
            "illuminance",
            "Illuminance",
            SensorDeviceClass::Custom,
            Some("lx"),
        ));
    }
    entities.extend(convert_battery_sensor(device));
    entities
}

pub(crate) fn convert_open_close_sensor(device: &Device) -> Vec<AvailableEntity> {
    let mut entities = vec![sensor_entity(
        device,
        "open",
        "Open",
        SensorDeviceClass::Custom,
        None,
    )];
    entities.extend(convert_battery_sensor(device));
    entities
}

pub(crate) fn convert_water_sensor(device: &Device) -> Vec<AvailableEntity> {
    let mut entities = vec![sensor_entity(
        device,
        "leak",
        "Water leak",
        SensorDeviceClass::Custom,
        None,
    )];
    entities.extend(convert_battery_sensor(device));
    entities
}

/// Battery sensor for any battery powered device reporting a percentage.
pub(crate) fn convert_battery_sensor(device: &Device) -> Option<AvailableEntity> {
    device.attributes.battery_percentage.map(|_| {
        sensor_entity(
            device,
            "battery",
            "Battery",
            SensorDeviceClass::Battery,
            None,
        )
    })
}

fn sensor_entity(
    device: &Device,
    suffix: &str,
    label: &str,
    device_class: SensorDeviceClass,
    unit: Option<&str>,
) -> AvailableEntity {
    let mut options = serde_json::Map::new();
    if device_class == SensorDeviceClass::Custom {
        options.insert(SensorOption::CustomLabel.to_string(), label.into());
        if let Some(unit) = unit {
            options.insert(SensorOption::CustomUnit.to_string(), unit.into());
        }
    }

    AvailableEntity {
        device_id: None,
        entity_type: EntityType::Sensor,
        entity_id: format!("{}_{suffix}", device.id),
        device_class: Some(device_class.to_string()),
        features: None,
        name: entity_name(format!("{} {label}", device.name())),
        area: device_area(device),
        device_info: Some(device_info(device)),
        options: if options.is_empty() {
            None
        } else {
            Some(options)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn environment_sensor_exposes_one_entity_per_measurement() {
        let device: Device = serde_json::from_value(json!({
            "id": "env-1",
            "deviceType": "environmentSensor",
            "isReachable": true,
            "attributes": {
                "customName": "Hallway",
                "model": "VINDSTYRKA",
                "currentTemperature": 21.3,
                "currentRH": 45,
                "currentPM25": 5,
                "vocIndex": 120
            }
        }))
        .unwrap();

        let entities = convert_environment_sensors(&device);
        let ids: Vec<&str> = entities.iter().map(|e| e.entity_id.as_str()).collect();

        assert_eq!(
            vec!["env-1_temperature", "env-1_humidity", "env-1_pm25", "env-1_voc_index"],
            ids
        );
        assert_eq!(Some("temperature"), entities[0].device_class.as_deref());
        assert_eq!(
            Some("Hallway Temperature"),
            entities[0].name.get("en").map(String::as_str)
        );
    }

    #[test]
    fn pm25_sensor_is_custom_with_label_and_unit() {
        let device: Device = serde_json::from_value(json!({
            "id": "env-2",
            "deviceType": "environmentSensor",
            "isReachable": true,
            "attributes": { "currentPM25": 7 }
        }))
        .unwrap();

        let entities = convert_environment_sensors(&device);

        assert_eq!(1, entities.len());
        assert_eq!(Some("custom"), entities[0].device_class.as_deref());
        let options = entities[0].options.as_ref().expect("custom sensor options");
        assert_eq!(Some(&json!("PM2.5")), options.get("custom_label"));
        assert_eq!(Some(&json!("µg/m³")), options.get("custom_unit"));
    }

    #[test]
    fn motion_sensor_with_battery_and_light_level() {
        let device: Device = serde_json::from_value(json!({
            "id": "motion-1",
            "deviceType": "motionSensor",
            "isReachable": true,
            "attributes": {
                "model": "VALLHORN Wireless Motion Sensor",
                "isDetected": false,
                "illuminance": 120,
                "batteryPercentage": 85
            }
        }))
        .unwrap();

        let ids: Vec<String> = convert_motion_sensor(&device)
            .into_iter()
            .map(|e| e.entity_id)
            .collect();

        assert_eq!(
            vec!["motion-1_motion", "motion-1_illuminance", "motion-1_battery"],
            ids
        );
    }

    #[test]
    fn controller_exposes_battery_only() {
        let device: Device = serde_json::from_value(json!({
            "id": "remote-1",
            "deviceType": "lightController",
            "isReachable": true,
            "attributes": {
                "model": "RODRET Dimmer",
                "batteryPercentage": 55
            }
        }))
        .unwrap();

        let battery = convert_battery_sensor(&device).expect("battery sensor");
        assert_eq!("remote-1_battery", battery.entity_id);
        assert_eq!(Some("battery"), battery.device_class.as_deref());
    }

    #[test]
    fn controller_without_battery_is_not_exposed() {
        let device: Device = serde_json::from_value(json!({
            "id": "remote-2",
            "deviceType": "soundController",
            "isReachable": true,
            "attributes": { "model": "SYMFONISK Remote" }
        }))
        .unwrap();

        assert!(convert_battery_sensor(&device).is_none());
    }
}
