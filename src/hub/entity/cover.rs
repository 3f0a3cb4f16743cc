// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Cover entity mapping for blinds.

use super::{device_area, device_info, entity_name};
use crate::api::intg::AvailableEntity;
use crate::api::{CoverFeature, EntityType};
use crate::hub::model::Device;

pub(crate) fn convert_blinds_entity(device: &Device) -> AvailableEntity {
    let features = vec![
        CoverFeature::Open,
        CoverFeature::Close,
        CoverFeature::Stop,
        CoverFeature::Position,
    ];

    AvailableEntity {
        device_id: None,
        entity_type: EntityType::Cover,
        entity_id: device.id.clone(),
        device_class: Some("blind".into()),
        features: Some(features.into_iter().map(|v| v.to_string()).collect()),
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
    fn convert_blinds_entity_basic() {
        let device: Device = serde_json::from_value(json!({
            "id": "blinds-1",
            "deviceType": "blinds",
            "isReachable": true,
            "attributes": {
                "customName": "Bedroom blind",
                "model": "PRAKTLYSING cellular blind",
                "blindsCurrentLevel": 30,
                "blindsState": "stopped"
            },
            "capabilities": { "canReceive": ["blindsTargetLevel", "blindsState"] }
        }))
        .unwrap();

        let entity = convert_blinds_entity(&device);

        assert_eq!("blinds-1", entity.entity_id);
        assert_eq!(EntityType::Cover, entity.entity_type);
        assert_eq!(Some("blind"), entity.device_class.as_deref());
        assert_eq!(
            Some(vec![
                "open".to_string(),
                "close".to_string(),
                "stop".to_string(),
                "position".to_string()
            ]),
            entity.features
        );
    }
}
