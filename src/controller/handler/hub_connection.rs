// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for DIRIGERA hub client connection messages.

use crate::api::intg::DeviceState;
use crate::controller::handler::{ConnectMsg, DisconnectMsg};
use crate::controller::{Controller, OperationModeState};
use crate::hub::DirigeraClient;
use crate::hub::messages::{ConnectionEvent, ConnectionState};
use actix::{ActorFutureExt, AsyncContext, Handler, ResponseActFuture, WrapFuture, fut};
use awc::http::header;
use futures::StreamExt;
use log::{debug, info, warn};
use std::io::{Error, ErrorKind};

impl Handler<ConnectionEvent> for Controller {
    type Result = ();

    fn handle(&mut self, msg: ConnectionEvent, ctx: &mut Self::Context) -> Self::Result {
        // TODO enhance state machine with connection & reconnection states (as in remote-core)
        match msg.state {
            ConnectionState::AuthenticationFailed => {
                // error state prevents auto-reconnect in upcoming Closed event
                self.set_device_state(DeviceState::Error);
            }
            ConnectionState::Connected => {
                self.set_device_state(DeviceState::Connected);
            }
            ConnectionState::Closed => {
                info!("Hub client disconnected: {}", msg.client_id);
                self.hub_client = None;

                if matches!(
                    self.device_state,
                    DeviceState::Connecting | DeviceState::Connected
                ) {
                    info!("Start reconnecting to the hub: {}", msg.client_id);
                    self.set_device_state(DeviceState::Connecting);

                    ctx.notify(ConnectMsg {});
                }
            }
        };
    }
}

impl Handler<DisconnectMsg> for Controller {
    type Result = ();

    fn handle(&mut self, _msg: DisconnectMsg, ctx: &mut Self::Context) -> Self::Result {
        // set the disconnected state first, otherwise the Closed event starts a reconnect
        self.disconnect(ctx);
    }
}

impl Handler<ConnectMsg> for Controller {
    type Result = ResponseActFuture<Self, Result<(), Error>>;

    fn handle(&mut self, _msg: ConnectMsg, ctx: &mut Self::Context) -> Self::Result {
        if !matches!(self.machine.state(), &OperationModeState::Running) {
            return Box::pin(fut::result(Err(Error::new(
                ErrorKind::InvalidInput,
                "Not in running state",
            ))));
        }
        if self.hub_client.is_some() {
            debug!("Already connected to the hub");
            return Box::pin(fut::result(Ok(())));
        }
        if self.device_state == DeviceState::Disconnected {
            self.set_device_state(DeviceState::Connecting);
        }

        let url = self.settings.hub.ws_url();
        let ws_request = self
            .ws_client
            .ws(url.as_str())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.settings.hub.get_token()),
            )
            .max_frame_size(self.settings.hub.max_frame_size_kb * 1024);
        let settings = self.settings.hub.clone();
        let client_address = ctx.address();
        let heartbeat = self.settings.hub.heartbeat;

        Box::pin(
            async move {
                debug!("Connecting to: {url}");

                let (_, framed) = match ws_request.connect().await {
                    Ok((r, f)) => (r, f),
                    Err(e) => {
                        warn!("Could not connect to {url}: {e:?}");
                        return Err(Error::other(e.to_string()));
                    }
                };
                info!("Connected to: {url} ({heartbeat})");

                let (sink, stream) = framed.split();
                let addr = DirigeraClient::start(&settings, client_address, sink, stream);

                Ok(addr)
            }
            .into_actor(self) // converts future to ActorFuture
            .map(move |result, act, ctx| {
                match result {
                    Ok(addr) => {
                        act.hub_client = Some(addr);
                        act.hub_reconnect_duration = act.settings.hub.reconnect.duration;
                        act.hub_reconnect_attempt = 0;
                        Ok(())
                    }
                    Err(e) => {
                        // TODO quick and dirty: simply send Connect message as simple reconnect mechanism. Needs to be refined!
                        if act.device_state != DeviceState::Disconnected {
                            act.hub_reconnect_attempt += 1;
                            if act.settings.hub.reconnect.attempts > 0
                                && act.hub_reconnect_attempt > act.settings.hub.reconnect.attempts
                            {
                                info!(
                                    "Max reconnect attempts reached ({}). Giving up!",
                                    act.settings.hub.reconnect.attempts
                                );
                                act.device_state = DeviceState::Error;
                                act.broadcast_device_state();
                            } else {
                                ctx.notify_later(ConnectMsg {}, act.hub_reconnect_duration);
                                act.increment_reconnect_timeout();
                            }
                        }
                        Err(e)
                    }
                }
            }),
        )
    }
}
