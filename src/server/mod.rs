// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Integration API WebSocket server.

use crate::Controller;
use crate::configuration::WebSocketSettings;
use actix::Addr;
use actix_web::{Error, HttpRequest, HttpResponse, Result, get, web};
use log::debug;
use uuid::Uuid;
use web_model::ApiResponse;
use ws::WsConn;

#[cfg(feature = "mdns-sd")]
pub mod mdns;
pub mod web_model;
mod ws;

#[cfg(feature = "mdns-sd")]
pub use mdns::publish_service;
pub use web_model::json_error_handler;

#[get("/ws")]
pub async fn ws_index(
    request: HttpRequest,
    stream: web::Payload,
    websocket_settings: web::Data<WebSocketSettings>,
    controller: web::Data<Addr<Controller>>,
) -> Result<HttpResponse, Error> {
    debug!("New WebSocket connection: {request:?}");

    // Authenticate connection if a token is configured
    if websocket_settings.token.is_some() {
        let auth_token = request
            .headers()
            .get("auth-token")
            .and_then(|v| match v.to_str() {
                Ok(v) => Some(v.to_string()),
                Err(_) => None,
            });

        if auth_token != websocket_settings.token {
            return Ok(HttpResponse::Unauthorized()
                .json(ApiResponse::new("ERROR", "Authentication failed")));
        }
    }

    // TODO limit number of active ws sessions?
    // use peer IP:port as unique client identifier
    let client_id = request
        .peer_addr()
        .map(|addr| format!("{}:{}", addr.ip(), addr.port()))
        .unwrap_or_else(|| Uuid::new_v4().hyphenated().to_string());

    actix_web_actors::ws::start(
        WsConn::new(client_id, controller.get_ref().clone()),
        &request,
        stream,
    )
}
