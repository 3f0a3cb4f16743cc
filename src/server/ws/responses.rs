// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Handle response messages from Remote Two

use crate::api::ws::WsMessage;
use crate::server::ws::WsConn;
use log::{debug, warn};

impl WsConn {
    /// Handle response messages from R2.
    ///
    /// The driver doesn't send requests to the remote, responses are only logged.
    pub(crate) fn on_response(&mut self, response: WsMessage) {
        let msg = match response.msg {
            None => {
                warn!("[{}] Missing property: msg", self.id);
                return;
            }
            Some(ref m) => m.as_str(),
        };

        debug!("[{}] Got response: {msg}", self.id);
    }
}
