// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Switch entity specific command logic.

use crate::api::SwitchCommand;
use crate::api::intg::EntityCommand;
use crate::errors::ServiceError;
use crate::hub::model::Device;
use crate::hub::service::{HubRequest, cmd_from_str, patch_attribute};

pub(crate) fn handle_outlet(
    device: &Device,
    msg: &EntityCommand,
) -> Result<Vec<HubRequest>, ServiceError> {
    let cmd: SwitchCommand = cmd_from_str(&msg.cmd_id)?;

    let on = match cmd {
        SwitchCommand::On => true,
        SwitchCommand::Off => false,
        SwitchCommand::Toggle => !device.attributes.is_on.unwrap_or_default(),
    };

    Ok(vec![patch_attribute(device, "isOn", on.into())?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outlet(is_on: bool) -> Device {
        serde_json::from_value(json!({
            "id": "outlet-1",
            "deviceType": "outlet",
            "isReachable": true,
            "attributes": { "isOn": is_on },
            "capabilities": { "canSend": [], "canReceive": ["isOn"] }
        }))
        .unwrap()
    }

    fn command(cmd_id: &str) -> EntityCommand {
        serde_json::from_value(json!({
            "entity_type": "switch",
            "entity_id": "outlet-1",
            "cmd_id": cmd_id
        }))
        .unwrap()
    }

    #[test]
    fn on_command_patches_is_on() {
        let requests = handle_outlet(&outlet(false), &command("on")).unwrap();

        assert_eq!(
            vec![HubRequest::Patch {
                device_id: "outlet-1".into(),
                attributes: json!({ "isOn": true })
            }],
            requests
        );
    }

    #[test]
    fn toggle_inverts_current_state() {
        let requests = handle_outlet(&outlet(true), &command("toggle")).unwrap();

        assert_eq!(
            vec![HubRequest::Patch {
                device_id: "outlet-1".into(),
                attributes: json!({ "isOn": false })
            }],
            requests
        );
    }

    #[test]
    fn invalid_command_returns_bad_request() {
        let result = handle_outlet(&outlet(false), &command("dim"));

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }
}
