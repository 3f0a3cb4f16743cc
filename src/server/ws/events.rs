// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Handle events from Remote Two

use crate::api::ws::{R2Event, WsMessage};
use crate::controller::R2EventMsg;
use crate::server::ws::WsConn;
use log::{error, warn};
use std::str::FromStr;

impl WsConn {
    /// Handle events from R2.
    ///
    /// Events are not acknowledged, invalid events are only logged.
    pub(crate) fn on_event(&mut self, event: WsMessage) {
        let msg = match event.msg {
            None => {
                warn!("[{}] Missing property: msg", self.id);
                return;
            }
            Some(ref m) => m.as_str(),
        };

        if let Ok(event_msg) = R2Event::from_str(msg) {
            if let Err(e) = self.controller_addr.try_send(R2EventMsg {
                ws_id: self.id.clone(),
                event: event_msg,
                msg_data: event.msg_data,
            }) {
                error!("[{}] Controller mailbox error: {e}", self.id);
            }
        } else {
            warn!("[{}] Unknown event: {msg}", self.id);
        }
    }
}
