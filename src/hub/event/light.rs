// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Light entity event conversion.

use crate::api::EntityType;
use crate::api::intg::EntityChange;
use crate::hub::event::device_onoff_state;
use crate::hub::model::Device;
use serde_json::{Map, Value};

/// Convert hub light attributes to UC light entity attributes.
///
/// Brightness is scaled from the hub's 1..100 light level to 0..255, hue stays
/// 0..360 and saturation is scaled from 0..1 to 0..255. A color capable lamp
/// reports hue and color temperature at the same time, `colorMode` tells which
/// one is active.
pub(crate) fn map_light_attributes(device: &Device) -> Map<String, Value> {
    let attrs = &device.attributes;
    let mut attributes = serde_json::Map::with_capacity(5);
    attributes.insert("state".into(), device_onoff_state(device));

    if let Some(level) = attrs.light_level {
        attributes.insert("brightness".into(), (level as u32 * 255 / 100).into());
    }

    let color = attrs.color_mode.as_deref() != Some("temperature");
    let temperature = attrs.color_mode.as_deref() != Some("color");
    if color {
        if let Some(hue) = attrs.color_hue {
            attributes.insert("hue".into(), (hue.round() as u16).into());
        }
        if let Some(saturation) = attrs.color_saturation {
            attributes.insert(
                "saturation".into(),
                ((saturation * 255.0).round() as u8).into(),
            );
        }
    }
    if temperature && let Some(temperature) = attrs.color_temperature {
        attributes.insert("color_temperature".into(), temperature.into());
    }

    attributes
}

pub(crate) fn light_entity_change(device: &Device) -> EntityChange {
    EntityChange {
        device_id: None,
        entity_type: EntityType::Light,
        entity_id: device.id.clone(),
        attributes: map_light_attributes(device),
    }
}

/// Aggregated state of a device set light entity: on if any member is on,
/// brightness of the brightest member.
pub(crate) fn light_set_entity_change(set_id: &str, members: &[&Device]) -> EntityChange {
    let reachable = members.iter().any(|d| d.is_reachable);
    let any_on = members
        .iter()
        .any(|d| d.attributes.is_on.unwrap_or_default());

    let mut attributes = serde_json::Map::with_capacity(2);
    let state = if !reachable {
        "UNAVAILABLE"
    } else if any_on {
        "ON"
    } else {
        "OFF"
    };
    attributes.insert("state".into(), state.into());

    if let Some(level) = members
        .iter()
        .filter_map(|d| d.attributes.light_level)
        .max()
    {
        attributes.insert("brightness".into(), (level as u32 * 255 / 100).into());
    }

    EntityChange {
        device_id: None,
        entity_type: EntityType::Light,
        entity_id: set_id.into(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn device(value: serde_json::Value) -> Device {
        serde_json::from_value(value).expect("valid device json")
    }

    #[test]
    fn brightness_is_scaled_to_255() {
        let device = device(json!({
            "id": "bulb-1",
            "deviceType": "light",
            "isReachable": true,
            "attributes": { "isOn": true, "lightLevel": 100 }
        }));

        let attributes = map_light_attributes(&device);

        assert_eq!(Some(&json!("ON")), attributes.get("state"));
        assert_eq!(Some(&json!(255)), attributes.get("brightness"));
    }

    #[test]
    fn color_mode_color_reports_hue_and_saturation() {
        let device = device(json!({
            "id": "bulb-1",
            "deviceType": "light",
            "isReachable": true,
            "attributes": {
                "isOn": true,
                "lightLevel": 50,
                "colorHue": 119.5,
                "colorSaturation": 0.5,
                "colorTemperature": 2700,
                "colorMode": "color"
            }
        }));

        let attributes = map_light_attributes(&device);

        assert_eq!(Some(&json!(120)), attributes.get("hue"));
        assert_eq!(Some(&json!(128)), attributes.get("saturation"));
        assert_eq!(None, attributes.get("color_temperature"));
    }

    #[test]
    fn color_mode_temperature_reports_kelvin() {
        let device = device(json!({
            "id": "bulb-1",
            "deviceType": "light",
            "isReachable": true,
            "attributes": {
                "isOn": true,
                "colorHue": 120.0,
                "colorSaturation": 0.7,
                "colorTemperature": 2702,
                "colorMode": "temperature"
            }
        }));

        let attributes = map_light_attributes(&device);

        assert_eq!(None, attributes.get("hue"));
        assert_eq!(None, attributes.get("saturation"));
        assert_eq!(Some(&json!(2702)), attributes.get("color_temperature"));
    }

    #[test]
    fn light_set_is_on_if_any_member_is_on() {
        let bulb1 = device(json!({
            "id": "bulb-1",
            "deviceType": "light",
            "isReachable": true,
            "attributes": { "isOn": false, "lightLevel": 20 }
        }));
        let bulb2 = device(json!({
            "id": "bulb-2",
            "deviceType": "light",
            "isReachable": true,
            "attributes": { "isOn": true, "lightLevel": 80 }
        }));

        let change = light_set_entity_change("set-1", &[&bulb1, &bulb2]);

        assert_eq!("set-1", change.entity_id);
        assert_eq!(Some(&json!("ON")), change.attributes.get("state"));
        // brightest member: 80 * 255 / 100
        assert_eq!(Some(&json!(204)), change.attributes.get("brightness"));
    }

    #[test]
    fn light_set_without_reachable_members_is_unavailable() {
        let bulb = device(json!({
            "id": "bulb-1",
            "deviceType": "light",
            "isReachable": false,
            "attributes": { "isOn": true }
        }));

        let change = light_set_entity_change("set-1", &[&bulb]);

        assert_eq!(Some(&json!("UNAVAILABLE")), change.attributes.get("state"));
    }
}
