// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix `Actor` trait implementation.

use actix::{Actor, ActorContext, ActorFutureExt, AsyncContext, Context, WrapFuture};
use log::{debug, error, info};

use crate::errors::ServiceError;
use crate::hub::DirigeraClient;
use crate::hub::messages::{ConnectionEvent, ConnectionState};
use crate::hub::model::{Device, Scene};

impl Actor for DirigeraClient {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Context<Self>) {
        debug!("[{}] Hub client started", self.id);
        self.heartbeat(ctx);

        // Prime the device and scene caches before handling any events.
        // ctx.wait pauses the event stream until the sync finished.
        let api = self.api.clone();
        ctx.wait(
            async move {
                let devices = api.get_devices().await?;
                let scenes = api.get_scenes().await?;
                Ok((devices, scenes))
            }
            .into_actor(self)
            .map(
                |result: Result<(Vec<Device>, Vec<Scene>), ServiceError>, act, ctx| match result {
                    Ok((devices, scenes)) => {
                        info!(
                            "[{}] Connected: {} devices, {} scenes",
                            act.id,
                            devices.len(),
                            scenes.len()
                        );
                        act.devices = devices.into_iter().map(|d| (d.id.clone(), d)).collect();
                        act.scenes = scenes.into_iter().map(|s| (s.id.clone(), s)).collect();
                        act.controller_actor.do_send(ConnectionEvent {
                            client_id: act.id.clone(),
                            state: ConnectionState::Connected,
                        });
                    }
                    Err(ServiceError::AuthenticationError(e)) => {
                        error!("[{}] Hub rejected the access token: {e}", act.id);
                        act.controller_actor.do_send(ConnectionEvent {
                            client_id: act.id.clone(),
                            state: ConnectionState::AuthenticationFailed,
                        });
                        ctx.stop();
                    }
                    Err(e) => {
                        error!("[{}] Error loading devices from the hub: {e:?}", act.id);
                        ctx.stop();
                    }
                },
            ),
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        debug!("[{}] Hub client stopped", self.id);
        self.controller_actor.do_send(ConnectionEvent {
            client_id: self.id.clone(),
            state: ConnectionState::Closed,
        });
    }
}
