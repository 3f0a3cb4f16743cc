// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Fan entity mapping for air purifiers.

use super::{device_area, device_info, entity_name};
use crate::api::intg::AvailableEntity;
use crate::api::{EntityType, FanFeature};
use crate::hub::model::Device;

pub(crate) fn convert_air_purifier_entity(device: &Device) -> AvailableEntity {
    AvailableEntity {
        device_id: None,
        entity_type: EntityType::Fan,
        entity_id: device.id.clone(),
        device_class: None,
        features: Some(vec![
            FanFeature::OnOff.to_string(),
            FanFeature::Speed.to_string(),
        ]),
        name: entity_name(device.name()),
        area: device_area(device),
        device_info: Some(device_info(device)),
        options: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn convert_air_purifier_entity_basic() {
        let device: Device = serde_json::from_value(json!({
            "id": "purifier-1",
            "deviceType": "airPurifier",
            "isReachable": true,
            "attributes": {
                "model": "STARKVIND Air purifier",
                "fanMode": "auto",
                "motorState": 15
            },
            "capabilities": { "canReceive": ["fanMode", "motorState"] }
        }))
        .unwrap();

        let entity = convert_air_purifier_entity(&device);

        assert_eq!("purifier-1", entity.entity_id);
        assert_eq!(EntityType::Fan, entity.entity_type);
        assert_eq!(
            Some(vec!["on_off".to_string(), "speed".to_string()]),
            entity.features
        );
        assert_eq!(
            Some("STARKVIND Air purifier"),
            entity.name.get("en").map(String::as_str)
        );
    }
}
