// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! DIRIGERA device to available-entity mapping.

mod cover;
mod fan;
mod light;
mod scene;
mod sensor;
mod switch;

pub(crate) use cover::*;
pub(crate) use fan::*;
pub(crate) use light::*;
pub(crate) use scene::*;
pub(crate) use sensor::*;
pub(crate) use switch::*;

use crate::api::intg::{AvailableEntity, DeviceInfo};
use crate::hub::model::{Device, DeviceSet, DeviceType, Scene};
use std::collections::HashMap;

/// Build the list of exposed entities from the device and scene caches.
///
/// With `hide_device_set_bulbs` enabled, lights that belong to a device set are
/// folded into a single aggregated light entity per set instead of being
/// exposed individually.
pub(crate) fn available_entities(
    devices: &HashMap<String, Device>,
    scenes: &HashMap<String, Scene>,
    hide_device_set_bulbs: bool,
) -> Vec<AvailableEntity> {
    let mut entities = Vec::with_capacity(devices.len() + scenes.len());
    let mut sets: HashMap<&str, &DeviceSet> = HashMap::new();

    for device in devices.values() {
        match device.device_type {
            DeviceType::Outlet => entities.push(convert_outlet_entity(device)),
            DeviceType::Light => {
                if hide_device_set_bulbs && !device.device_set.is_empty() {
                    for set in &device.device_set {
                        sets.insert(&set.id, set);
                    }
                } else {
                    entities.push(convert_light_entity(device));
                }
            }
            DeviceType::Blinds => entities.push(convert_blinds_entity(device)),
            DeviceType::AirPurifier => entities.push(convert_air_purifier_entity(device)),
            DeviceType::EnvironmentSensor => entities.extend(convert_environment_sensors(device)),
            DeviceType::MotionSensor => entities.extend(convert_motion_sensor(device)),
            DeviceType::OpenCloseSensor => entities.extend(convert_open_close_sensor(device)),
            DeviceType::WaterSensor => entities.extend(convert_water_sensor(device)),
            DeviceType::LightController
            | DeviceType::BlindsController
            | DeviceType::SoundController
            | DeviceType::Controller => entities.extend(convert_battery_sensor(device)),
            DeviceType::Gateway | DeviceType::Unknown => {}
        }
    }

    for set in sets.into_values() {
        let members = device_set_members(devices, &set.id);
        entities.push(convert_light_set_entity(set, &members));
    }

    entities.extend(scenes.values().map(convert_scene_entity));

    entities
}

/// All light devices belonging to the given device set.
pub(crate) fn device_set_members<'a>(
    devices: &'a HashMap<String, Device>,
    set_id: &str,
) -> Vec<&'a Device> {
    devices
        .values()
        .filter(|d| {
            d.device_type == DeviceType::Light && d.device_set.iter().any(|s| s.id == set_id)
        })
        .collect()
}

/// Entity name map with the default English text.
fn entity_name(name: impl Into<String>) -> HashMap<String, String> {
    HashMap::from([("en".into(), name.into())])
}

fn device_area(device: &Device) -> Option<String> {
    device.room.as_ref().map(|r| r.name.clone())
}

/// Physical device metadata for the device registry of the Remote.
fn device_info(device: &Device) -> DeviceInfo {
    let attributes = &device.attributes;
    DeviceInfo {
        manufacturer: attributes.manufacturer.clone(),
        model: attributes.model.clone(),
        serial_number: attributes.serial_number.clone(),
        sw_version: attributes.firmware_version.clone(),
        hw_version: attributes.hardware_version.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::EntityType;
    use serde_json::json;

    fn device(value: serde_json::Value) -> Device {
        serde_json::from_value(value).expect("valid device json")
    }

    fn device_map(devices: Vec<Device>) -> HashMap<String, Device> {
        devices.into_iter().map(|d| (d.id.clone(), d)).collect()
    }

    fn set_bulb(id: &str, set_id: &str) -> Device {
        device(json!({
            "id": id,
            "deviceType": "light",
            "isReachable": true,
            "attributes": { "customName": id, "isOn": false },
            "capabilities": { "canReceive": ["isOn", "lightLevel"] },
            "deviceSet": [{ "id": set_id, "name": "Living Room" }]
        }))
    }

    #[test]
    fn available_entities_contains_devices_and_scenes() {
        let devices = device_map(vec![
            device(json!({
                "id": "outlet-1",
                "deviceType": "outlet",
                "isReachable": true,
                "attributes": { "customName": "Lamp plug", "isOn": true },
                "capabilities": { "canReceive": ["isOn"] }
            })),
            device(json!({
                "id": "env-1",
                "deviceType": "environmentSensor",
                "isReachable": true,
                "attributes": { "currentTemperature": 21.5, "currentRH": 44 }
            })),
        ]);
        let scenes = HashMap::from([(
            "scene-1".to_string(),
            serde_json::from_value::<Scene>(json!({
                "id": "scene-1",
                "type": "userScene",
                "info": { "name": "Movie night" }
            }))
            .unwrap(),
        )]);

        let entities = available_entities(&devices, &scenes, true);

        assert_eq!(4, entities.len(), "outlet + 2 measurements + scene");
        assert!(entities.iter().any(|e| e.entity_id == "outlet-1"));
        assert!(entities.iter().any(|e| e.entity_id == "env-1_temperature"));
        assert!(entities.iter().any(|e| e.entity_id == "env-1_humidity"));
        assert!(
            entities
                .iter()
                .any(|e| e.entity_id == "scene-1" && e.entity_type == EntityType::Scene)
        );
    }

    #[test]
    fn device_set_bulbs_fold_into_one_entity() {
        let devices = device_map(vec![set_bulb("bulb-1", "set-1"), set_bulb("bulb-2", "set-1")]);

        let entities = available_entities(&devices, &HashMap::new(), true);

        assert_eq!(1, entities.len());
        assert_eq!("set-1", entities[0].entity_id);
        assert_eq!(Some("Living Room"), entities[0].name.get("en").map(String::as_str));
    }

    #[test]
    fn device_set_bulbs_stay_individual_when_disabled() {
        let devices = device_map(vec![set_bulb("bulb-1", "set-1"), set_bulb("bulb-2", "set-1")]);

        let mut entity_ids: Vec<String> = available_entities(&devices, &HashMap::new(), false)
            .into_iter()
            .map(|e| e.entity_id)
            .collect();
        entity_ids.sort();

        assert_eq!(vec!["bulb-1".to_string(), "bulb-2".to_string()], entity_ids);
    }

    #[test]
    fn gateway_and_unknown_devices_are_not_exposed() {
        let devices = device_map(vec![
            device(json!({
                "id": "gw",
                "deviceType": "gateway",
                "isReachable": true,
                "attributes": {}
            })),
            device(json!({
                "id": "mystery",
                "deviceType": "repeater",
                "isReachable": true,
                "attributes": {}
            })),
        ]);

        assert!(available_entities(&devices, &HashMap::new(), true).is_empty());
    }
}
