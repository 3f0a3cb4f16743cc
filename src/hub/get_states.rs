// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix actor handler implementation for the `GetStates` message

use crate::errors::ServiceError;
use crate::hub::DirigeraClient;
use crate::hub::event::entity_states;
use crate::hub::messages::{EntityStates, GetStates};
use actix::Handler;
use log::debug;

impl Handler<GetStates> for DirigeraClient {
    type Result = Result<(), ServiceError>;

    fn handle(&mut self, _: GetStates, _ctx: &mut Self::Context) -> Self::Result {
        let states = entity_states(&self.devices, self.hide_device_set_bulbs);
        debug!("[{}] GetStates: {} entity states", self.id, states.len());

        self.controller_actor.try_send(EntityStates {
            client_id: self.id.clone(),
            states,
        })?;

        Ok(())
    }
}
