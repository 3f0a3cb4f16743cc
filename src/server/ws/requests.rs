// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Handle request messages from Remote Two

use crate::api::ws::{R2Request, WsMessage, WsResultMsgData};
use crate::controller::R2RequestMsg;
use crate::errors::ServiceError;
use crate::server::ws::WsConn;
use actix::{ActorFutureExt, ContextFutureSpawner, WrapFuture};
use actix_web_actors::ws::WebsocketContext;
use log::{error, warn};
use std::str::FromStr;

impl WsConn {
    /// Handle request messages from R2
    pub(crate) fn on_request(&mut self, request: WsMessage, ctx: &mut WebsocketContext<WsConn>) {
        let id = match request.id {
            None => {
                self.send_missing_field_error(0, "id", ctx);
                return;
            }
            Some(id) => id,
        };
        let msg = match request.msg {
            None => {
                self.send_missing_field_error(id, "msg", ctx);
                return;
            }
            Some(ref m) => m.as_str(),
        };

        let request_msg = match R2Request::from_str(msg) {
            Ok(r) => r,
            Err(_) => {
                warn!("[{}] Unknown message: {msg}", self.id);
                self.send_error(id, 400, "BAD_REQUEST", format!("Unknown message: {msg}"), ctx);
                return;
            }
        };

        let session_id = self.id.clone();
        self.controller_addr
            .send(R2RequestMsg {
                ws_id: session_id.clone(),
                req_id: id,
                request: request_msg,
                msg_data: request.msg_data,
            })
            .into_actor(self)
            .map(move |result, act, ctx| match result {
                Ok(Ok(())) => {
                    // data responses and entity command acks are sent by the controller
                    if matches!(
                        request_msg,
                        R2Request::SubscribeEvents
                            | R2Request::UnsubscribeEvents
                            | R2Request::SetupDriver
                            | R2Request::SetDriverUserData
                    ) {
                        act.send_message(
                            WsMessage::response(id, "result", WsResultMsgData::new("OK", "OK")),
                            ctx,
                        );
                    }
                }
                Ok(Err(e)) => act.send_r2_err_response(id, e, ctx),
                Err(e) => {
                    error!("[{session_id}] Controller mailbox error: {e}");
                    act.send_error(
                        id,
                        500,
                        "INTERNAL_ERROR",
                        "Error processing request".into(),
                        ctx,
                    );
                }
            })
            .spawn(ctx);
    }

    /// Convert a [ServiceError] into an error result response and send it to the remote.
    fn send_r2_err_response(
        &self,
        req_id: u32,
        error: ServiceError,
        ctx: &mut WebsocketContext<WsConn>,
    ) {
        let (code, msg_data) = match error {
            ServiceError::BadRequest(e) => (400, WsResultMsgData::new("BAD_REQUEST", e)),
            ServiceError::AuthenticationError(e) => (401, WsResultMsgData::new("UNAUTHORIZED", e)),
            ServiceError::NotConnected => (
                503,
                WsResultMsgData::new("SERVICE_UNAVAILABLE", "Hub connection not available"),
            ),
            ServiceError::ServiceUnavailable(e) => {
                (503, WsResultMsgData::new("SERVICE_UNAVAILABLE", e))
            }
            e => (500, WsResultMsgData::new("INTERNAL_ERROR", e.to_string())),
        };
        self.send_message(WsMessage::error(req_id, code, msg_data), ctx);
    }
}
