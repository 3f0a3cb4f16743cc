// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Cover entity specific command logic.

use crate::api::CoverCommand;
use crate::api::intg::EntityCommand;
use crate::errors::ServiceError;
use crate::hub::model::Device;
use crate::hub::service::{HubRequest, cmd_from_str, get_required_params, patch_attribute};

pub(crate) fn handle_blinds(
    device: &Device,
    msg: &EntityCommand,
) -> Result<Vec<HubRequest>, ServiceError> {
    let cmd: CoverCommand = cmd_from_str(&msg.cmd_id)?;

    let level = match cmd {
        CoverCommand::Open => 0,
        CoverCommand::Close => 100,
        // the hub has no stop command, setting the current level as target
        // halts the motor
        CoverCommand::Stop => device.attributes.blinds_current_level.unwrap_or(50).min(100),
        CoverCommand::Position => {
            let params = get_required_params(msg)?;
            match params.get("position").and_then(|v| v.as_u64()) {
                // UC position is 100 = fully open, the hub level is the inverse
                Some(position @ 0..=100) => 100 - position as u8,
                _ => {
                    return Err(ServiceError::BadRequest(
                        "Invalid position value. Valid: 0..100".into(),
                    ));
                }
            }
        }
    };

    Ok(vec![patch_attribute(
        device,
        "blindsTargetLevel",
        level.into(),
    )?])
}
