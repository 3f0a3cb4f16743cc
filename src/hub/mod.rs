// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! DIRIGERA hub client implementation with Actix actors.
//!
//! The hub pushes device and scene events over a WebSocket connection, all
//! interaction (initial data sync, entity commands) goes through the REST API.
//! This module holds the event connection actor with its device cache, the
//! entity mapping and the command handlers.

use std::collections::HashMap;
use std::time::Instant;

use actix::io::SinkWrite;
use actix::{Actor, ActorContext, Addr, AsyncContext, Context};
use actix_codec::Framed;
use awc::ws::Codec;
use awc::{BoxedSocket, ws};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use log::{debug, error, warn};
use messages::Close;

use crate::Controller;
use crate::configuration::{DIRIGERA_PORT, DirigeraSettings, ENV_HUB_MSG_TRACING, HeartbeatSettings};
use crate::errors::ServiceError;
use crate::hub::model::HubEvent;
use crate::hub::rest::DirigeraApi;

mod actor;
mod close_handler;
pub mod entity;
mod event;
mod get_entities;
mod get_states;
pub mod messages;
pub mod model;
pub mod rest;
mod service;
mod streamhandler;

pub struct DirigeraClient {
    /// Unique hub client id
    id: String,
    /// REST API client for the device sync and entity commands.
    api: DirigeraApi,
    /// Device cache, keyed by device id. Primed when the connection is
    /// established, kept up to date from hub events.
    devices: HashMap<String, model::Device>,
    /// Scene cache, keyed by scene id.
    scenes: HashMap<String, model::Scene>,
    /// Expose device-set lights as a single aggregated light entity.
    hide_device_set_bulbs: bool,
    sink: SinkWrite<ws::Message, SplitSink<Framed<BoxedSocket, Codec>, ws::Message>>,
    // TODO use abstract actix Receiver(s) instead of hard Controller dependency?
    controller_actor: Addr<Controller>,
    /// Last heart beat timestamp.
    last_hb: Instant,
    heartbeat: HeartbeatSettings,
    msg_tracing_in: bool,
    msg_tracing_out: bool,
}

impl DirigeraClient {
    pub fn start(
        settings: &DirigeraSettings,
        controller_actor: Addr<Controller>,
        sink: SplitSink<Framed<BoxedSocket, Codec>, ws::Message>,
        stream: SplitStream<Framed<BoxedSocket, Codec>>,
    ) -> Addr<Self> {
        let api = DirigeraApi::new(settings);
        let id = format!("{}:{}", settings.get_host(), DIRIGERA_PORT);
        let heartbeat = settings.heartbeat;
        let hide_device_set_bulbs = settings.hide_device_set_bulbs;
        let msg_tracing = std::env::var(ENV_HUB_MSG_TRACING).unwrap_or_default();

        DirigeraClient::create(|ctx| {
            ctx.add_stream(stream);
            DirigeraClient {
                id,
                api,
                devices: HashMap::new(),
                scenes: HashMap::new(),
                hide_device_set_bulbs,
                sink: SinkWrite::new(sink, ctx),
                controller_actor,
                last_hb: Instant::now(),
                heartbeat,
                msg_tracing_in: msg_tracing == "all" || msg_tracing == "in",
                msg_tracing_out: msg_tracing == "all" || msg_tracing == "out",
            }
        })
    }

    fn heartbeat(&self, ctx: &mut Context<Self>) {
        if !self.heartbeat.ping_frames {
            debug!("[{}] WebSocket heartbeat disabled", self.id);
            return;
        }
        ctx.run_later(self.heartbeat.interval, |act, ctx| {
            // check server heartbeats
            if Instant::now().duration_since(act.last_hb) > act.heartbeat.timeout {
                // heartbeat timed out
                error!(
                    "[{}] Websocket server heartbeat failed, disconnecting!",
                    act.id
                );

                // Stop sending pings & Stop actor
                ctx.stop();
                return;
            }

            if act
                .send_message(ws::Message::Ping(Bytes::new()), "Ping", ctx)
                .is_ok()
            {
                act.heartbeat(ctx);
            }
        });
    }

    fn on_text_message(&mut self, txt: Bytes, ctx: &mut Context<DirigeraClient>) {
        if self.msg_tracing_in {
            debug!("[{}] -> {}", self.id, String::from_utf8_lossy(&txt));
        }

        // The hub only pushes event messages, there is no request / response
        // protocol on the WebSocket. Unknown event types deserialize to
        // HubEventType::Unknown and are ignored in handle_event.
        let event: HubEvent = match serde_json::from_slice(&txt) {
            Ok(event) => event,
            Err(e) => {
                warn!("[{}] Error parsing hub event: {e}", self.id);
                ctx.notify(Close::invalid());
                return;
            }
        };

        if let Err(e) = self.handle_event(event) {
            error!("[{}] Error handling hub event: {e:?}", self.id);
        }
    }

    fn on_binary_message(&mut self, _: Bytes, ctx: &mut Context<DirigeraClient>) {
        error!("[{}] Binary messages not supported! Disconnecting", self.id);
        ctx.notify(Close::unsupported());
    }

    fn on_ping_message(&mut self, bytes: Bytes, ctx: &mut Context<DirigeraClient>) {
        debug!("[{}] -> Ping", self.id);
        self.last_hb = Instant::now();
        let _ = self.send_message(ws::Message::Pong(bytes), "Pong", ctx);
    }

    fn on_pong_message(&mut self, _: Bytes, _: &mut Context<DirigeraClient>) {
        debug!("[{}] -> Pong", self.id);
        self.last_hb = Instant::now();
    }

    fn send_message(
        &mut self,
        msg: ws::Message,
        name: &str,
        ctx: &mut Context<DirigeraClient>,
    ) -> Result<(), ServiceError> {
        if self.msg_tracing_out {
            debug!("[{}] <- {msg:?}", self.id);
        } else {
            debug!("[{}] <- {name}", self.id);
        }
        if self.sink.write(msg).is_err() {
            // sink is closed or closing, no chance to send a Close message
            warn!("[{}] Could not send {name}, closing connection", self.id);
            ctx.stop();
            return Err(ServiceError::NotConnected);
        }
        Ok(())
    }
}
