// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::Controller;
use crate::api::ws::{WsMessage, WsResultMsgData};
use crate::configuration::ENV_API_MSG_TRACING;
use crate::controller::{NewR2Session, R2SessionDisconnect, SendWsMessage};
use crate::server::ws::WsConn;
use actix::{
    Actor, ActorContext, ActorFutureExt, Addr, AsyncContext, ContextFutureSpawner, Handler,
    Running, StreamHandler, WrapFuture, fut,
};
use actix_web_actors::ws::{CloseCode, CloseReason, Message, ProtocolError, WebsocketContext};
use bytestring::ByteString;
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

// TODO make configurable?
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

impl Actor for WsConn {
    type Context = WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);
        // register new WebSocket connection to our handler
        self.controller_addr
            .send(NewR2Session {
                addr: ctx.address().recipient(),
                id: self.id.clone(),
            })
            .into_actor(self)
            .then(|res, _, ctx| {
                match res {
                    Ok(_res) => (),
                    _ => ctx.stop(),
                }
                fut::ready(())
            })
            .wait(ctx);

        debug!("started");
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // remove WebSocket connection from our handler
        self.controller_addr.do_send(R2SessionDisconnect {
            id: self.id.clone(),
        });
        info!("stopped");
        Running::Stop
    }
}

impl StreamHandler<actix_web::Result<Message, ProtocolError>> for WsConn {
    fn handle(&mut self, msg: actix_web::Result<Message, ProtocolError>, ctx: &mut Self::Context) {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => self.on_text_message(text, ctx),
                Message::Binary(_) => {
                    self.close(CloseCode::Size, "Binary messages not supported!", ctx);
                }
                Message::Ping(bytes) => {
                    self.hb = Instant::now();
                    ctx.pong(&bytes);
                }
                Message::Pong(_) => self.hb = Instant::now(),
                Message::Close(reason) => {
                    ctx.close(reason);
                    ctx.stop();
                }
                Message::Continuation(_) => {
                    self.close(CloseCode::Size, "Continuation frames not supported!", ctx);
                }
                Message::Nop => {}
            }
        } else {
            info!("Closing WebSocket: {:?}", msg.unwrap_err());
            ctx.stop();
        }
    }
}

impl Handler<SendWsMessage> for WsConn {
    type Result = ();

    fn handle(&mut self, msg: SendWsMessage, ctx: &mut Self::Context) {
        self.send_message(msg.0, ctx);
    }
}

impl WsConn {
    pub(crate) fn new(client_id: String, controller_addr: Addr<Controller>) -> Self {
        let msg_tracing = std::env::var(ENV_API_MSG_TRACING).unwrap_or_default();
        Self {
            id: client_id,
            hb: Instant::now(),
            controller_addr,
            msg_tracing_in: msg_tracing == "all" || msg_tracing == "in",
            msg_tracing_out: msg_tracing == "all" || msg_tracing == "out",
        }
    }

    fn start_heartbeat(&self, ctx: &mut WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            // TODO check if we got standby event from remote: suspend until out of standby and then test connection
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                info!("[{}] Closing connection due to failed heartbeat", act.id);
                // remove WebSocket connection from our handler
                act.controller_addr
                    .do_send(R2SessionDisconnect { id: act.id.clone() });

                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }

    fn close(&mut self, code: CloseCode, description: &str, ctx: &mut WebsocketContext<WsConn>) {
        info!("Closing connection with code {code:?}: {description}");
        ctx.close(Some(CloseReason {
            code,
            description: Some(description.into()),
        }));
        ctx.stop();
    }

    pub(crate) fn send_message(&self, message: WsMessage, ctx: &mut WebsocketContext<WsConn>) {
        if let Ok(msg) = serde_json::to_string(&message) {
            if self.msg_tracing_out {
                debug!("[{}] <- {msg}", self.id);
            }
            ctx.text(msg);
        } else {
            error!("[{}] Error serializing {message:?}", self.id)
        }
    }

    pub(crate) fn send_error(
        &self,
        req_id: u32,
        code: u16,
        error_code: &str,
        message: String,
        ctx: &mut WebsocketContext<WsConn>,
    ) {
        let response = WsMessage::error(req_id, code, WsResultMsgData::new(error_code, message));
        self.send_message(response, ctx);
    }

    pub(crate) fn send_missing_field_error(
        &self,
        req_id: u32,
        field: &str,
        ctx: &mut WebsocketContext<WsConn>,
    ) {
        self.send_message(WsMessage::missing_field(req_id, field), ctx);
    }

    fn on_text_message(&mut self, text: ByteString, ctx: &mut WebsocketContext<WsConn>) {
        if self.msg_tracing_in {
            debug!("[{}] -> {}", self.id, &*text);
        }

        let msg: WsMessage = match serde_json::from_slice(text.as_ref()) {
            Ok(v) => v,
            Err(e) => {
                warn!("[{}] Invalid JSON message: {}", self.id, e.to_string());
                self.close(CloseCode::Unsupported, "Invalid JSON message", ctx);
                return;
            }
        };

        match msg.kind {
            None => {
                warn!(
                    "[{}] Expected json object payload with 'kind' key, but got: {:?}",
                    self.id, text
                );
                self.send_missing_field_error(0, "kind", ctx);
            }
            Some(ref k) => match k.as_str() {
                "req" => self.on_request(msg, ctx),
                "resp" => self.on_response(msg),
                "event" => self.on_event(msg),
                _ => {
                    warn!("[{}] Unsupported client message kind: {}", self.id, k);
                    self.send_error(
                        0,
                        400,
                        "BAD_REQUEST",
                        format!("Invalid kind value: {k}"),
                        ctx,
                    );
                }
            },
        }
    }
}
