// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Light entity specific command logic.
//!
//! Handles single lights and device set entities. A device set command is
//! fanned out to all member devices.

use crate::api::LightCommand;
use crate::api::intg::EntityCommand;
use crate::errors::ServiceError;
use crate::hub::model::Device;
use crate::hub::service::{HubRequest, cmd_from_str, ensure_can_receive, patch_attribute};
use log::debug;
use serde_json::json;

pub(crate) fn handle_light(
    device: &Device,
    msg: &EntityCommand,
) -> Result<Vec<HubRequest>, ServiceError> {
    let cmd: LightCommand = cmd_from_str(&msg.cmd_id)?;

    let result = match cmd {
        LightCommand::On => {
            let mut requests = vec![patch_attribute(device, "isOn", true.into())?];
            requests.extend(light_param_requests(device, msg)?);
            requests
        }
        LightCommand::Off => vec![patch_attribute(device, "isOn", false.into())?],
        LightCommand::Toggle => {
            let on = !device.attributes.is_on.unwrap_or_default();
            vec![patch_attribute(device, "isOn", on.into())?]
        }
    };

    Ok(result)
}

/// Fan out a command on a device set entity to its member devices.
///
/// Toggle works on the aggregated state: if any member is on, all members are
/// switched off. Parameters of the on command are applied best effort, members
/// without the required capability are skipped.
pub(crate) fn handle_light_set(
    members: &[&Device],
    msg: &EntityCommand,
) -> Result<Vec<HubRequest>, ServiceError> {
    let cmd: LightCommand = cmd_from_str(&msg.cmd_id)?;
    let any_on = members
        .iter()
        .any(|d| d.attributes.is_on.unwrap_or_default());

    let on = match cmd {
        LightCommand::On => true,
        LightCommand::Off => false,
        LightCommand::Toggle => !any_on,
    };

    let mut requests = Vec::with_capacity(members.len());
    for device in members {
        match patch_attribute(device, "isOn", on.into()) {
            Ok(request) => requests.push(request),
            Err(e) => debug!("Skipping device set member: {e}"),
        }
    }
    if requests.is_empty() {
        return Err(ServiceError::BadRequest(
            "No device in the set accepts this command".into(),
        ));
    }

    if cmd == LightCommand::On {
        for device in members {
            match light_param_requests(device, msg) {
                Ok(params) => requests.extend(params),
                Err(e) => debug!("Skipping device set member parameters: {e}"),
            }
        }
    }

    Ok(requests)
}

fn light_param_requests(
    device: &Device,
    msg: &EntityCommand,
) -> Result<Vec<HubRequest>, ServiceError> {
    let mut requests = Vec::new();
    let Some(params) = msg.params.as_ref() else {
        return Ok(requests);
    };

    if let Some(brightness @ 0..=255) = params.get("brightness").and_then(|v| v.as_u64()) {
        // hub light level is 1..100
        let level = (brightness * 100 / 255).max(1);
        requests.push(patch_attribute(device, "lightLevel", level.into())?);
    }
    if let Some(value) = params.get("color_temperature").and_then(|v| v.as_u64()) {
        let kelvin = clamp_color_temperature(value.min(u16::MAX as u64) as u16, device);
        requests.push(patch_attribute(device, "colorTemperature", kelvin.into())?);
    }
    if let Some(hue @ 0..=360) = params.get("hue").and_then(|v| v.as_u64())
        && let Some(saturation @ 0..=255) = params.get("saturation").and_then(|v| v.as_u64())
    {
        // both color values must be set in a single patch
        ensure_can_receive(device, "colorHue")?;
        ensure_can_receive(device, "colorSaturation")?;
        requests.push(HubRequest::Patch {
            device_id: device.id.clone(),
            attributes: json!({
                "colorHue": hue as f64,
                "colorSaturation": saturation as f64 / 255.0
            }),
        });
    }

    Ok(requests)
}

/// Clamp a Kelvin value to the color temperature range of the device.
/// `colorTemperatureAtMin` is the coldest and therefore highest value.
fn clamp_color_temperature(value: u16, device: &Device) -> u16 {
    let coldest = device.attributes.color_temperature_min.unwrap_or(4000);
    let warmest = device.attributes.color_temperature_max.unwrap_or(2202);
    value.clamp(warmest.min(coldest), coldest.max(warmest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn bulb(id: &str, is_on: bool, can_receive: Value) -> Device {
        serde_json::from_value(json!({
            "id": id,
            "deviceType": "light",
            "isReachable": true,
            "attributes": {
                "isOn": is_on,
                "lightLevel": 50,
                "colorTemperatureAtMin": 4000,
                "colorTemperatureAtMax": 2202
            },
            "capabilities": { "canSend": [], "canReceive": can_receive }
        }))
        .unwrap()
    }

    fn command(cmd_id: &str, params: Value) -> EntityCommand {
        serde_json::from_value(json!({
            "entity_type": "light",
            "entity_id": "bulb-1",
            "cmd_id": cmd_id,
            "params": params
        }))
        .unwrap()
    }

    #[test]
    fn on_with_brightness_patches_is_on_and_light_level() {
        let device = bulb("bulb-1", false, json!(["isOn", "lightLevel"]));

        let requests = handle_light(&device, &command("on", json!({ "brightness": 255 }))).unwrap();

        assert_eq!(2, requests.len());
        assert_eq!(
            HubRequest::Patch {
                device_id: "bulb-1".into(),
                attributes: json!({ "lightLevel": 100 })
            },
            requests[1]
        );
    }

    #[rstest]
    #[case(1, 1)] // lowest dim level, 0 would be rejected by the hub
    #[case(128, 50)]
    #[case(255, 100)]
    fn brightness_is_scaled_to_light_level(#[case] brightness: u64, #[case] level: u64) {
        let device = bulb("bulb-1", false, json!(["isOn", "lightLevel"]));

        let requests =
            handle_light(&device, &command("on", json!({ "brightness": brightness }))).unwrap();

        assert_eq!(
            Some(&json!({ "lightLevel": level })),
            match &requests[1] {
                HubRequest::Patch { attributes, .. } => Some(attributes),
                _ => None,
            }
        );
    }

    #[rstest]
    #[case(3000, 3000)]
    #[case(1500, 2202)] // warmer than the bulb supports
    #[case(6500, 4000)] // colder than the bulb supports
    fn color_temperature_is_clamped_to_device_range(#[case] kelvin: u64, #[case] expected: u64) {
        let device = bulb("bulb-1", true, json!(["isOn", "colorTemperature"]));

        let requests = handle_light(
            &device,
            &command("on", json!({ "color_temperature": kelvin })),
        )
        .unwrap();

        assert_eq!(
            HubRequest::Patch {
                device_id: "bulb-1".into(),
                attributes: json!({ "colorTemperature": expected })
            },
            requests[1]
        );
    }

    #[test]
    fn hue_and_saturation_are_sent_in_a_single_patch() {
        let device = bulb(
            "bulb-1",
            true,
            json!(["isOn", "colorHue", "colorSaturation"]),
        );

        let requests = handle_light(
            &device,
            &command("on", json!({ "hue": 120, "saturation": 255 })),
        )
        .unwrap();

        assert_eq!(
            HubRequest::Patch {
                device_id: "bulb-1".into(),
                attributes: json!({ "colorHue": 120.0, "colorSaturation": 1.0 })
            },
            requests[1]
        );
    }

    #[test]
    fn color_command_without_capability_returns_bad_request() {
        let device = bulb("bulb-1", true, json!(["isOn", "lightLevel"]));

        let result = handle_light(
            &device,
            &command("on", json!({ "hue": 120, "saturation": 255 })),
        );

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }

    #[test]
    fn set_toggle_switches_all_members_off_if_any_is_on() {
        let bulb1 = bulb("bulb-1", true, json!(["isOn"]));
        let bulb2 = bulb("bulb-2", false, json!(["isOn"]));

        let requests =
            handle_light_set(&[&bulb1, &bulb2], &command("toggle", Value::Null)).unwrap();

        assert_eq!(2, requests.len());
        for request in requests {
            match request {
                HubRequest::Patch { attributes, .. } => {
                    assert_eq!(json!({ "isOn": false }), attributes)
                }
                other => panic!("Expected patch request, but got: {other:?}"),
            }
        }
    }

    #[test]
    fn set_on_applies_brightness_best_effort() {
        let dimmable = bulb("bulb-1", false, json!(["isOn", "lightLevel"]));
        let plain = bulb("bulb-2", false, json!(["isOn"]));

        let requests = handle_light_set(
            &[&dimmable, &plain],
            &command("on", json!({ "brightness": 128 })),
        )
        .unwrap();

        // isOn for both members, lightLevel only for the dimmable one
        assert_eq!(3, requests.len());
    }

    #[test]
    fn set_without_capable_members_returns_bad_request() {
        let device = bulb("bulb-1", false, json!(["customName"]));

        let result = handle_light_set(&[&device], &command("on", Value::Null));

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }
}
