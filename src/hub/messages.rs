// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix Actor message definitions for DirigeraClient

use crate::api::intg::{AvailableEntity, EntityChange, EntityCommand};
use crate::errors::ServiceError;
use actix::prelude::Message;
use awc::ws::CloseCode;

/// Execute an entity command on the DIRIGERA hub
#[derive(Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct ExecuteCommand {
    /// Remote Two `msg_data` json object from `entity_command` message.
    pub command: EntityCommand,
}

/// Get all available entities from the device cache
#[derive(Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct GetAvailableEntities;

/// Get the current entity states from the device cache
#[derive(Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct GetStates;

/// Asynchronous hub response from `GetAvailableEntities`
#[derive(Message)]
#[rtype(result = "()")]
pub struct AvailableEntities {
    pub client_id: String,
    pub entities: Vec<AvailableEntity>,
}

/// Asynchronous hub response from `GetStates`
#[derive(Message)]
#[rtype(result = "()")]
pub struct EntityStates {
    pub client_id: String,
    pub states: Vec<EntityChange>,
}

/// Hub client connection states
pub enum ConnectionState {
    AuthenticationFailed,
    Connected,
    Closed,
}

/// Hub client connection events
#[derive(Message)]
#[rtype(result = "()")]
pub struct ConnectionEvent {
    pub client_id: String,
    pub state: ConnectionState,
}

/// Hub entity events
#[derive(Message)]
#[rtype(result = "()")]
pub struct EntityEvent {
    pub client_id: String,
    pub entity_change: EntityChange,
}

/// Hub client request: disconnect and close the session.
// Used internally by the client and from Controller
#[derive(Message)]
#[rtype(result = "()")]
pub struct Close {
    /// WebSocket close code
    pub code: CloseCode,
    pub description: Option<String>,
}

impl Default for Close {
    fn default() -> Self {
        Self {
            code: CloseCode::Normal,
            description: None,
        }
    }
}

impl Close {
    pub fn invalid() -> Self {
        Self {
            code: CloseCode::Invalid,
            description: None,
        }
    }
    pub fn unsupported() -> Self {
        Self {
            code: CloseCode::Unsupported,
            description: None,
        }
    }
}
