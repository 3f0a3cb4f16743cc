// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Fan entity specific command logic for air purifiers.

use crate::api::FanCommand;
use crate::api::intg::EntityCommand;
use crate::errors::ServiceError;
use crate::hub::model::Device;
use crate::hub::service::{HubRequest, cmd_from_str, get_required_params, patch_attribute};

pub(crate) fn handle_air_purifier(
    device: &Device,
    msg: &EntityCommand,
) -> Result<Vec<HubRequest>, ServiceError> {
    let cmd: FanCommand = cmd_from_str(&msg.cmd_id)?;

    let request = match cmd {
        FanCommand::On => patch_attribute(device, "fanMode", "auto".into())?,
        FanCommand::Off => patch_attribute(device, "fanMode", "off".into())?,
        FanCommand::Toggle => {
            let running = device.attributes.motor_state.unwrap_or_default() > 0;
            let mode = if running { "off" } else { "auto" };
            patch_attribute(device, "fanMode", mode.into())?
        }
        FanCommand::SetSpeed => {
            let params = get_required_params(msg)?;
            match params.get("speed").and_then(|v| v.as_u64()) {
                Some(0) => patch_attribute(device, "fanMode", "off".into())?,
                Some(speed @ 1..=100) => {
                    // manual motor speed range is 10..50
                    let motor_state = ((speed / 2) as u8).clamp(10, 50);
                    patch_attribute(device, "motorState", motor_state.into())?
                }
                _ => {
                    return Err(ServiceError::BadRequest(
                        "Invalid speed value. Valid: 0..100".into(),
                    ));
                }
            }
        }
    };

    Ok(vec![request])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn purifier(motor_state: u8) -> Device {
        serde_json::from_value(json!({
            "id": "purifier-1",
            "deviceType": "airPurifier",
            "isReachable": true,
            "attributes": { "motorState": motor_state, "fanMode": "auto" },
            "capabilities": { "canSend": [], "canReceive": ["fanMode", "motorState"] }
        }))
        .unwrap()
    }

    fn command(cmd_id: &str, params: Value) -> EntityCommand {
        serde_json::from_value(json!({
            "entity_type": "fan",
            "entity_id": "purifier-1",
            "cmd_id": cmd_id,
            "params": params
        }))
        .unwrap()
    }

    #[test]
    fn on_command_enables_auto_mode() {
        let requests = handle_air_purifier(&purifier(0), &command("on", Value::Null)).unwrap();

        assert_eq!(
            vec![HubRequest::Patch {
                device_id: "purifier-1".into(),
                attributes: json!({ "fanMode": "auto" })
            }],
            requests
        );
    }

    #[test]
    fn toggle_on_running_purifier_switches_off() {
        let requests = handle_air_purifier(&purifier(25), &command("toggle", Value::Null)).unwrap();

        assert_eq!(
            vec![HubRequest::Patch {
                device_id: "purifier-1".into(),
                attributes: json!({ "fanMode": "off" })
            }],
            requests
        );
    }

    #[rstest]
    #[case(1, 10)] // below the manual motor range
    #[case(50, 25)]
    #[case(100, 50)]
    fn speed_is_scaled_to_motor_state(#[case] speed: u64, #[case] motor_state: u64) {
        let requests = handle_air_purifier(
            &purifier(0),
            &command("set_speed", json!({ "speed": speed })),
        )
        .unwrap();

        assert_eq!(
            vec![HubRequest::Patch {
                device_id: "purifier-1".into(),
                attributes: json!({ "motorState": motor_state })
            }],
            requests
        );
    }

    #[test]
    fn speed_zero_switches_off() {
        let requests =
            handle_air_purifier(&purifier(25), &command("set_speed", json!({ "speed": 0 })))
                .unwrap();

        assert_eq!(
            vec![HubRequest::Patch {
                device_id: "purifier-1".into(),
                attributes: json!({ "fanMode": "off" })
            }],
            requests
        );
    }

    #[test]
    fn invalid_speed_returns_bad_request() {
        let result =
            handle_air_purifier(&purifier(0), &command("set_speed", json!({ "speed": 101 })));

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }
}
