// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Light entity mapping for bulbs, drivers and light device sets.

use super::{device_area, device_info, entity_name};
use crate::api::intg::AvailableEntity;
use crate::api::{EntityType, LightFeature};
use crate::hub::model::{Device, DeviceSet};

/// Light features derived from the `canReceive` capabilities.
pub(crate) fn light_features(device: &Device) -> Vec<LightFeature> {
    let mut features = vec![LightFeature::OnOff, LightFeature::Toggle];
    if device.can_receive("lightLevel") {
        features.push(LightFeature::Dim);
    }
    if device.can_receive("colorTemperature") {
        features.push(LightFeature::ColorTemperature);
    }
    if device.can_receive("colorHue") {
        features.push(LightFeature::Color);
    }
    features
}

pub(crate) fn convert_light_entity(device: &Device) -> AvailableEntity {
    AvailableEntity {
        device_id: None,
        entity_type: EntityType::Light,
        entity_id: device.id.clone(),
        device_class: None,
        features: Some(
            light_features(device)
                .into_iter()
                .map(|v| v.to_string())
                .collect(),
        ),
        name: entity_name(device.name()),
        area: device_area(device),
        device_info: Some(device_info(device)),
        options: None,
    }
}

/// Aggregated light entity for a device set.
///
/// The member bulbs are hidden, the set acts as a single light with the union
/// of the member features.
pub(crate) fn convert_light_set_entity(set: &DeviceSet, members: &[&Device]) -> AvailableEntity {
    let mut features: Vec<String> = Vec::new();
    for member in members {
        for feature in light_features(member) {
            let feature = feature.to_string();
            if !features.contains(&feature) {
                features.push(feature);
            }
        }
    }

    AvailableEntity {
        device_id: None,
        entity_type: EntityType::Light,
        entity_id: set.id.clone(),
        device_class: None,
        features: Some(features),
        name: entity_name(set.name.clone()),
        area: members.iter().find_map(|d| device_area(d)),
        device_info: None,
        options: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn light(capabilities: serde_json::Value) -> Device {
        serde_json::from_value(json!({
            "id": "light-1",
            "deviceType": "light",
            "isReachable": true,
            "attributes": { "customName": "Desk lamp" },
            "capabilities": { "canReceive": capabilities }
        }))
        .unwrap()
    }

    #[test]
    fn onoff_only_light_has_no_dim_feature() {
        let entity = convert_light_entity(&light(json!(["isOn"])));
        let features = entity.features.unwrap();

        assert_eq!(vec!["on_off".to_string(), "toggle".to_string()], features);
    }

    #[test]
    fn dimmable_light_has_dim_feature() {
        let entity = convert_light_entity(&light(json!(["isOn", "lightLevel"])));
        let features = entity.features.unwrap();

        assert!(features.contains(&"dim".to_string()));
        assert!(!features.contains(&"color".to_string()));
    }

    #[test]
    fn color_light_has_all_features() {
        let entity = convert_light_entity(&light(json!([
            "isOn",
            "lightLevel",
            "colorTemperature",
            "colorHue",
            "colorSaturation"
        ])));
        let features = entity.features.unwrap();

        assert!(features.contains(&"dim".to_string()));
        assert!(features.contains(&"color_temperature".to_string()));
        assert!(features.contains(&"color".to_string()));
    }

    #[test]
    fn light_set_entity_is_union_of_member_features() {
        let dimmable = light(json!(["isOn", "lightLevel"]));
        let color = light(json!(["isOn", "lightLevel", "colorHue", "colorSaturation"]));
        let set: DeviceSet = serde_json::from_value(json!({
            "id": "set-1",
            "name": "Living Room"
        }))
        .unwrap();

        let entity = convert_light_set_entity(&set, &[&dimmable, &color]);

        assert_eq!("set-1", entity.entity_id);
        assert_eq!(Some("Living Room"), entity.name.get("en").map(String::as_str));
        let features = entity.features.unwrap();
        assert!(features.contains(&"dim".to_string()));
        assert!(features.contains(&"color".to_string()));
        assert_eq!(None, entity.device_info);
    }
}
