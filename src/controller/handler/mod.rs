// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handlers.

mod hub_connection;
mod hub_event;
mod r2_connection;
mod r2_event;
mod r2_request;
mod setup;

use crate::api::intg::{IntegrationSetup, SetupDriver};
use crate::controller::R2RequestMsg;
use crate::errors::ServiceError;
use actix::Message;

/// Internal message to delegate [`R2Request::SubscribeEvents`] requests.
#[derive(Debug, Message)]
#[rtype(result = "Result<(), ServiceError>")]
struct SubscribeHubEventsMsg(pub R2RequestMsg);

/// Internal message to delegate [`R2Request::UnsubscribeEvents`] requests.
#[derive(Debug, Message)]
#[rtype(result = "Result<(), ServiceError>")]
struct UnsubscribeHubEventsMsg(pub R2RequestMsg);

/// Internal message to connect to the DIRIGERA hub.
#[derive(Message, Default)]
#[rtype(result = "Result<(), std::io::Error>")]
struct ConnectMsg {}

/// Internal message to disconnect from the DIRIGERA hub.
#[derive(Message)]
#[rtype(result = "()")]
struct DisconnectMsg {}

/// Internal message to start driver setup flow.
#[derive(Message)]
#[rtype(result = "Result<(), ServiceError>")]
struct SetupDriverMsg {
    pub ws_id: String,
    pub data: SetupDriver,
}

/// Internal message to set driver setup input data
#[derive(Message)]
#[rtype(result = "Result<(), ServiceError>")]
struct SetDriverUserDataMsg {
    pub ws_id: String,
    pub data: IntegrationSetup,
}

/// Internal message to abort setup flow due to a timeout or an abort message from Remote Two.
#[derive(Message)]
#[rtype(result = "()")]
pub(crate) struct AbortDriverSetup {
    pub ws_id: String,
    /// internal timeout
    pub timeout: bool,
}
