// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Switch entity mapping for smart outlets.

use super::{device_area, device_info, entity_name};
use crate::api::intg::AvailableEntity;
use crate::api::{EntityType, SwitchDeviceClass, SwitchFeature};
use crate::hub::model::Device;

pub(crate) fn convert_outlet_entity(device: &Device) -> AvailableEntity {
    let attributes = &device.attributes;

    // additional outlet information, not part of the entity state
    let mut options = serde_json::Map::new();
    if let Some(v) = attributes.custom_name.as_deref().filter(|v| !v.is_empty()) {
        options.insert("custom_name".into(), v.into());
    }
    if let Some(v) = attributes.product_code.as_deref() {
        options.insert("product_code".into(), v.into());
    }
    if let Some(v) = attributes.ota_status.as_deref() {
        options.insert("ota_status".into(), v.into());
    }
    if let Some(v) = attributes.ota_state.as_deref() {
        options.insert("ota_state".into(), v.into());
    }
    if let Some(v) = attributes.current_active_power {
        options.insert("current_active_power".into(), v.into());
    }
    if let Some(v) = attributes.current_voltage {
        options.insert("current_voltage".into(), v.into());
    }
    if let Some(v) = attributes.current_amps {
        options.insert("current_amps".into(), v.into());
    }
    if let Some(v) = attributes.total_energy_consumed {
        options.insert("total_energy_consumed".into(), v.into());
    }
    if let Some(v) = attributes.energy_consumed_at_last_reset {
        options.insert("energy_consumed_at_last_reset".into(), v.into());
    }

    AvailableEntity {
        device_id: None,
        entity_type: EntityType::Switch,
        entity_id: device.id.clone(),
        device_class: Some(SwitchDeviceClass::Outlet.to_string()),
        features: Some(vec![
            SwitchFeature::OnOff.to_string(),
            SwitchFeature::Toggle.to_string(),
        ]),
        name: entity_name(device.name()),
        area: device_area(device),
        device_info: Some(device_info(device)),
        options: if options.is_empty() {
            None
        } else {
            Some(options)
        },
    }
}
