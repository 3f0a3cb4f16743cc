// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Cover entity event conversion.

use crate::api::EntityType;
use crate::api::intg::EntityChange;
use crate::hub::model::Device;

/// Convert blinds state to a UC cover entity change.
///
/// The hub level is 0 = fully open, 100 = fully closed, the UC position is the
/// inverse with 100 = fully open.
pub(crate) fn blinds_entity_change(device: &Device) -> EntityChange {
    let attrs = &device.attributes;
    let mut attributes = serde_json::Map::with_capacity(2);

    let state = if !device.is_reachable {
        "UNAVAILABLE"
    } else {
        match attrs.blinds_state.as_deref() {
            Some("up") => "OPENING",
            Some("down") => "CLOSING",
            _ => match attrs.blinds_current_level {
                Some(level) if level >= 100 => "CLOSED",
                Some(_) => "OPEN",
                None => "UNKNOWN",
            },
        }
    };
    attributes.insert("state".into(), state.into());

    if let Some(level) = attrs.blinds_current_level {
        attributes.insert("position".into(), (100 - level.min(100)).into());
    }

    EntityChange {
        device_id: None,
        entity_type: EntityType::Cover,
        entity_id: device.id.clone(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blinds(value: serde_json::Value) -> Device {
        serde_json::from_value(value).expect("valid device json")
    }

    #[test]
    fn open_blinds_position_is_100() {
        let device = blinds(json!({
            "id": "blinds-1",
            "deviceType": "blinds",
            "isReachable": true,
            "attributes": { "blindsCurrentLevel": 0, "blindsState": "stopped" }
        }));

        let change = blinds_entity_change(&device);

        assert_eq!(Some(&json!("OPEN")), change.attributes.get("state"));
        assert_eq!(Some(&json!(100)), change.attributes.get("position"));
    }

    #[test]
    fn fully_closed_blinds_are_closed() {
        let device = blinds(json!({
            "id": "blinds-1",
            "deviceType": "blinds",
            "isReachable": true,
            "attributes": { "blindsCurrentLevel": 100 }
        }));

        let change = blinds_entity_change(&device);

        assert_eq!(Some(&json!("CLOSED")), change.attributes.get("state"));
        assert_eq!(Some(&json!(0)), change.attributes.get("position"));
    }

    #[test]
    fn moving_blinds_report_direction() {
        let device = blinds(json!({
            "id": "blinds-1",
            "deviceType": "blinds",
            "isReachable": true,
            "attributes": { "blindsCurrentLevel": 100, "blindsState": "up" }
        }));

        let change = blinds_entity_change(&device);

        assert_eq!(Some(&json!("OPENING")), change.attributes.get("state"));
    }

    #[test]
    fn unreachable_blinds_are_unavailable() {
        let device = blinds(json!({
            "id": "blinds-1",
            "deviceType": "blinds",
            "isReachable": false,
            "attributes": { "blindsCurrentLevel": 30 }
        }));

        let change = blinds_entity_change(&device);

        assert_eq!(Some(&json!("UNAVAILABLE")), change.attributes.get("state"));
        assert_eq!(Some(&json!(70)), change.attributes.get("position"));
    }
}
