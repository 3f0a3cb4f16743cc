// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for DIRIGERA hub events.

use crate::api::intg::{AvailableEntitiesMsgData, SubscribeEvents};
use crate::api::ws::{EventCategory, WsMessage};
use crate::controller::handler::{SubscribeHubEventsMsg, UnsubscribeHubEventsMsg};
use crate::controller::{Controller, OperationModeState, SendWsMessage};
use crate::errors::ServiceError;
use crate::hub::messages::{AvailableEntities, EntityEvent, EntityStates};
use crate::util::DeserializeMsgData;
use actix::Handler;
use log::{debug, error};

impl Handler<EntityEvent> for Controller {
    type Result = ();

    fn handle(&mut self, msg: EntityEvent, _ctx: &mut Self::Context) -> Self::Result {
        let entity_id = msg.entity_change.entity_id.clone();
        let Ok(msg_data) = serde_json::to_value(msg.entity_change) else {
            return;
        };
        for (ws_id, session) in &self.sessions {
            // the remote is only interested in subscribed entities
            if !session.subscribed_entities.contains(&entity_id) {
                continue;
            }
            self.send_r2_msg(
                WsMessage::event("entity_change", EventCategory::Entity, msg_data.clone()),
                ws_id,
            );
        }
    }
}

impl Handler<AvailableEntities> for Controller {
    type Result = ();

    fn handle(&mut self, msg: AvailableEntities, _ctx: &mut Self::Context) -> Self::Result {
        // TODO just a quick implementation. Implement request filter! (also caching?)
        for (ws_id, session) in self.sessions.iter_mut() {
            if session.standby {
                debug!(
                    "[{ws_id}] Remote is in standby, not handling available_entities from the hub"
                );
                continue;
            }
            if let Some(id) = session.get_available_entities_id {
                let msg_data = AvailableEntitiesMsgData {
                    filter: None,
                    available_entities: msg.entities.clone(),
                };
                if let Ok(msg_data_json) = serde_json::to_value(msg_data) {
                    match session
                        .recipient
                        .try_send(SendWsMessage(WsMessage::response_json(
                            id,
                            "available_entities",
                            msg_data_json,
                        ))) {
                        Ok(_) => session.get_available_entities_id = None,
                        Err(e) => error!("[{ws_id}] Error sending available_entities: {e:?}"),
                    }
                }
            }
        }
    }
}

impl Handler<EntityStates> for Controller {
    type Result = ();

    fn handle(&mut self, msg: EntityStates, _ctx: &mut Self::Context) -> Self::Result {
        for (ws_id, session) in self.sessions.iter_mut() {
            if session.standby {
                debug!("[{ws_id}] Remote is in standby, not handling entity_states from the hub");
                continue;
            }
            if let Some(id) = session.get_entity_states_id {
                if let Ok(msg_data_json) = serde_json::to_value(&msg.states) {
                    match session
                        .recipient
                        .try_send(SendWsMessage(WsMessage::response_json(
                            id,
                            "entity_states",
                            msg_data_json,
                        ))) {
                        Ok(_) => session.get_entity_states_id = None,
                        Err(e) => error!("[{ws_id}] Error sending entity_states: {e:?}"),
                    }
                }
            }
        }
    }
}

impl Handler<SubscribeHubEventsMsg> for Controller {
    type Result = Result<(), ServiceError>;

    fn handle(&mut self, msg: SubscribeHubEventsMsg, _ctx: &mut Self::Context) -> Self::Result {
        if !matches!(self.machine.state(), &OperationModeState::Running) {
            return Err(ServiceError::ServiceUnavailable("Setup required".into()));
        }

        if let Some(session) = self.sessions.get_mut(&msg.0.ws_id) {
            let subscribe: SubscribeEvents = msg.0.deserialize()?;
            debug!("Subscribing entities: {:?}", subscribe.entity_ids);
            session.subscribed_entities.extend(subscribe.entity_ids);
            Ok(())
        } else {
            Err(ServiceError::NotConnected)
        }
    }
}

impl Handler<UnsubscribeHubEventsMsg> for Controller {
    type Result = Result<(), ServiceError>;

    fn handle(&mut self, msg: UnsubscribeHubEventsMsg, _ctx: &mut Self::Context) -> Self::Result {
        if !matches!(self.machine.state(), &OperationModeState::Running) {
            return Err(ServiceError::ServiceUnavailable("Setup required".into()));
        }
        if let Some(session) = self.sessions.get_mut(&msg.0.ws_id) {
            let unsubscribe: SubscribeEvents = msg.0.deserialize()?;
            debug!("Unsubscribing entities: {:?}", unsubscribe.entity_ids);
            for i in unsubscribe.entity_ids {
                session.subscribed_entities.remove(&i);
            }
            Ok(())
        } else {
            Err(ServiceError::NotConnected)
        }
    }
}
