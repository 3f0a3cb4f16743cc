// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix actor handler implementation for the `GetAvailableEntities` message

use crate::errors::ServiceError;
use crate::hub::DirigeraClient;
use crate::hub::entity::available_entities;
use crate::hub::messages::{AvailableEntities, GetAvailableEntities};
use actix::Handler;
use log::debug;

impl Handler<GetAvailableEntities> for DirigeraClient {
    type Result = Result<(), ServiceError>;

    /// Convert the cached devices and scenes to available entities and send
    /// them to the controller for the pending remote request.
    fn handle(&mut self, _: GetAvailableEntities, _ctx: &mut Self::Context) -> Self::Result {
        let entities = available_entities(&self.devices, &self.scenes, self.hide_device_set_bulbs);
        debug!(
            "[{}] GetAvailableEntities: {} entities from {} devices",
            self.id,
            entities.len(),
            self.devices.len()
        );

        self.controller_actor.try_send(AvailableEntities {
            client_id: self.id.clone(),
            entities,
        })?;

        Ok(())
    }
}
