// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Switch entity event conversion.

use crate::api::EntityType;
use crate::api::intg::EntityChange;
use crate::hub::event::device_onoff_state;
use crate::hub::model::Device;

pub(crate) fn outlet_entity_change(device: &Device) -> EntityChange {
    let mut attributes = serde_json::Map::with_capacity(1);
    attributes.insert("state".into(), device_onoff_state(device));

    EntityChange {
        device_id: None,
        entity_type: EntityType::Switch,
        entity_id: device.id.clone(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outlet_state_follows_is_on() {
        let device: Device = serde_json::from_value(json!({
            "id": "outlet-1",
            "deviceType": "outlet",
            "isReachable": true,
            "attributes": { "isOn": true }
        }))
        .unwrap();

        let change = outlet_entity_change(&device);

        assert_eq!(EntityType::Switch, change.entity_type);
        assert_eq!("outlet-1", change.entity_id);
        assert_eq!(Some(&json!("ON")), change.attributes.get("state"));
    }

    #[test]
    fn outlet_without_is_on_is_unknown() {
        let device: Device = serde_json::from_value(json!({
            "id": "outlet-1",
            "deviceType": "outlet",
            "isReachable": true,
            "attributes": {}
        }))
        .unwrap();

        let change = outlet_entity_change(&device);

        assert_eq!(Some(&json!("UNKNOWN")), change.attributes.get("state"));
    }
}
