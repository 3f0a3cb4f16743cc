// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Fan entity event conversion.

use crate::api::EntityType;
use crate::api::intg::EntityChange;
use crate::hub::model::Device;

/// Convert air purifier state to a UC fan entity change.
///
/// `motorState` 0 is off, 1 is auto mode and 10..50 a manual speed which maps
/// to the 0..100 UC speed range. Auto mode has no defined speed.
pub(crate) fn air_purifier_entity_change(device: &Device) -> EntityChange {
    let attrs = &device.attributes;
    let mut attributes = serde_json::Map::with_capacity(2);

    let state = if !device.is_reachable {
        "UNAVAILABLE"
    } else {
        match attrs.motor_state {
            Some(0) => "OFF",
            Some(_) => "ON",
            None => "UNKNOWN",
        }
    };
    attributes.insert("state".into(), state.into());

    if let Some(speed @ 10..=50) = attrs.motor_state {
        attributes.insert("speed".into(), (speed as u16 * 2).into());
    }

    EntityChange {
        device_id: None,
        entity_type: EntityType::Fan,
        entity_id: device.id.clone(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn purifier(motor_state: u8) -> Device {
        serde_json::from_value(json!({
            "id": "purifier-1",
            "deviceType": "airPurifier",
            "isReachable": true,
            "attributes": { "motorState": motor_state, "fanMode": "auto" }
        }))
        .unwrap()
    }

    #[test]
    fn manual_motor_state_maps_to_speed() {
        let change = air_purifier_entity_change(&purifier(25));

        assert_eq!(EntityType::Fan, change.entity_type);
        assert_eq!(Some(&json!("ON")), change.attributes.get("state"));
        assert_eq!(Some(&json!(50)), change.attributes.get("speed"));
    }

    #[test]
    fn auto_mode_is_on_without_speed() {
        let change = air_purifier_entity_change(&purifier(1));

        assert_eq!(Some(&json!("ON")), change.attributes.get("state"));
        assert_eq!(None, change.attributes.get("speed"));
    }

    #[test]
    fn motor_off_is_off() {
        let change = air_purifier_entity_change(&purifier(0));

        assert_eq!(Some(&json!("OFF")), change.attributes.get("state"));
    }
}
