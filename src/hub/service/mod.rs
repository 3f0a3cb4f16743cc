// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! DIRIGERA command execution.
//!
//! Translates the Remote Two's entity commands into hub REST requests. Most
//! commands become a single attribute patch, a device set command fans out to
//! all member devices.

mod cover;
mod fan;
mod light;
mod scene;
mod switch;

use crate::api::EntityType;
use crate::api::intg::EntityCommand;
use crate::errors::ServiceError;
use crate::hub::DirigeraClient;
use crate::hub::entity::device_set_members;
use crate::hub::messages::ExecuteCommand;
use crate::hub::model::Device;
use actix::{Handler, ResponseFuture};
use log::info;
use serde_json::{Map, Value, json};

/// A single REST request against the hub, the output of the command translation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HubRequest {
    Patch {
        device_id: String,
        attributes: Value,
    },
    TriggerScene(String),
    UndoScene(String),
}

impl Handler<ExecuteCommand> for DirigeraClient {
    type Result = ResponseFuture<Result<(), ServiceError>>;

    /// Convert a R2 `EntityCommand` to hub REST requests and execute them.
    /// The conversion of the entity logic is delegated to entity type specific
    /// functions in this module.
    ///
    /// The command is only translated against the cached device state, the
    /// actual requests run in a future so the event stream is not blocked.
    fn handle(&mut self, msg: ExecuteCommand, _ctx: &mut Self::Context) -> Self::Result {
        info!(
            "[{}] Executing command {} for {}",
            self.id, msg.command.cmd_id, msg.command.entity_id
        );

        let requests = self.translate_command(&msg.command);
        let api = self.api.clone();

        Box::pin(async move {
            for request in requests? {
                match request {
                    HubRequest::Patch {
                        device_id,
                        attributes,
                    } => api.patch_device(&device_id, attributes).await?,
                    HubRequest::TriggerScene(id) => api.trigger_scene(&id).await?,
                    HubRequest::UndoScene(id) => api.undo_scene(&id).await?,
                }
            }
            Ok(())
        })
    }
}

impl DirigeraClient {
    fn translate_command(&self, command: &EntityCommand) -> Result<Vec<HubRequest>, ServiceError> {
        match command.entity_type {
            EntityType::Switch => switch::handle_outlet(self.device(&command.entity_id)?, command),
            EntityType::Light => {
                if let Some(device) = self.devices.get(&command.entity_id) {
                    light::handle_light(device, command)
                } else {
                    // device set entities use the set id
                    let members = device_set_members(&self.devices, &command.entity_id);
                    if members.is_empty() {
                        return Err(ServiceError::BadRequest(format!(
                            "Unknown entity: {}",
                            command.entity_id
                        )));
                    }
                    light::handle_light_set(&members, command)
                }
            }
            EntityType::Cover => cover::handle_blinds(self.device(&command.entity_id)?, command),
            EntityType::Fan => fan::handle_air_purifier(self.device(&command.entity_id)?, command),
            EntityType::Scene => {
                let scene = self.scenes.get(&command.entity_id).ok_or_else(|| {
                    ServiceError::BadRequest(format!("Unknown scene: {}", command.entity_id))
                })?;
                scene::handle_scene(scene, command)
            }
            EntityType::Sensor => Err(ServiceError::BadRequest(
                "Sensor entities don't support sending commands to! Ignoring call".to_string(),
            )),
        }
    }

    fn device(&self, entity_id: &str) -> Result<&Device, ServiceError> {
        self.devices
            .get(entity_id)
            .ok_or_else(|| ServiceError::BadRequest(format!("Unknown entity: {entity_id}")))
    }
}

pub fn cmd_from_str<T: std::str::FromStr + strum::VariantNames>(
    cmd: &str,
) -> Result<T, ServiceError> {
    T::from_str(cmd).map_err(|_| {
        ServiceError::BadRequest(format!(
            "Invalid cmd_id: {cmd}. Valid commands: {}",
            T::VARIANTS.to_vec().join(",")
        ))
    })
}

/// Get a serde_json::Map reference of the params attribute of the provided EntityCommand.
///
/// A BadRequest error is returned if `params` is not set.
fn get_required_params(cmd: &EntityCommand) -> Result<&Map<String, Value>, ServiceError> {
    if let Some(params) = cmd.params.as_ref() {
        Ok(params)
    } else {
        Err(ServiceError::BadRequest("Missing params object".into()))
    }
}

fn ensure_can_receive(device: &Device, attribute: &str) -> Result<(), ServiceError> {
    if device.can_receive(attribute) {
        Ok(())
    } else {
        Err(ServiceError::BadRequest(format!(
            "Device {} does not accept {attribute} commands",
            device.id
        )))
    }
}

/// Patch request for a single device attribute, checked against the device
/// `canReceive` capabilities.
fn patch_attribute(
    device: &Device,
    attribute: &str,
    value: Value,
) -> Result<HubRequest, ServiceError> {
    ensure_can_receive(device, attribute)?;
    Ok(HubRequest::Patch {
        device_id: device.id.clone(),
        attributes: json!({ attribute: value }),
    })
}
