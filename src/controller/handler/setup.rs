// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Driver setup flow handling.
//!
//! The DIRIGERA hub uses a PKCE authorization flow to issue an access token:
//! the driver requests an authorization code, the user presses the action
//! button on the bottom of the hub, then the driver redeems the code for the
//! token. The setup flow maps this to an Integration-API user confirmation
//! screen between the initial settings page and the finish of the flow.

use crate::api::intg::{
    DriverSetupChange, IntegrationSetup, IntegrationSetupError, IntegrationSetupState,
    SetupChangeEventType,
};
use crate::api::ws::{EventCategory, WsMessage};
use crate::configuration::save_user_settings;
use crate::controller::handler::{
    AbortDriverSetup, ConnectMsg, SetDriverUserDataMsg, SetupDriverMsg,
};
use crate::controller::{Controller, OperationModeInput::*, OperationModeState};
use crate::errors::{ServiceError, ServiceError::BadRequest};
use crate::hub::rest::DirigeraApi;
use actix::clock::sleep;
use actix::{ActorFutureExt, AsyncContext, Handler, Message, ResponseActFuture, WrapFuture, fut};
use derive_more::Constructor;
use log::{debug, info, warn};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Local Actix message to request the hub action button confirmation.
#[derive(Constructor, Message)]
#[rtype(result = "()")]
struct RequestActionButtonMsg {
    pub ws_id: String,
}

/// Local Actix message to request further user data.
#[derive(Constructor, Message)]
#[rtype(result = "()")]
struct RequestExpertOptionsMsg {
    pub ws_id: String,
}

/// Local Actix message to finish setup flow.
#[derive(Constructor, Message)]
#[rtype(result = "()")]
struct FinishSetupFlowMsg {
    pub ws_id: String,
    pub error: Option<IntegrationSetupError>,
}

/// Start integration setup flow.
///
/// Disconnect an active hub connection to start a new client connection with the changed data later.
/// If no access token was provided, request an authorization code from the hub and continue with
/// the action button confirmation screen in [RequestActionButtonMsg]. Otherwise either continue
/// with expert configuration options with [RequestExpertOptionsMsg] if selected in the initial
/// configuration screen, or finish setup with [FinishSetupFlowMsg].
impl Handler<SetupDriverMsg> for Controller {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    fn handle(&mut self, msg: SetupDriverMsg, ctx: &mut Self::Context) -> Self::Result {
        debug!("[{}] {:?}", msg.ws_id, msg.data);

        if self
            .sm_consume(&msg.ws_id, &SetupDriverRequest, ctx)
            .is_err()
        {
            return Box::pin(fut::result(Err(BadRequest(
                "Cannot start driver setup. Please abort setup first.".into(),
            ))));
        }

        let mut cfg = self.settings.hub.clone();

        // validate setup data
        let host = match validate_host(msg.data.setup_data.get("host").map(|v| v.as_str())) {
            Ok(host) => host,
            Err(e) => return Box::pin(fut::result(Err(e))),
        };
        cfg.set_host(host);

        let token = msg
            .data
            .setup_data
            .get("token")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        if !token.is_empty() {
            cfg.set_token(&token);
        }

        if let Some(value) = msg
            .data
            .setup_data
            .get("hide_device_set_bulbs")
            .and_then(|v| bool::from_str(v).ok())
        {
            cfg.hide_device_set_bulbs = value;
        }

        self.setup.expert = msg
            .data
            .setup_data
            .get("expert")
            .and_then(|v| bool::from_str(v).ok())
            .unwrap_or_default();

        if let Some(session) = self.sessions.get_mut(&msg.ws_id) {
            session.reconfiguring = msg.data.reconfigure;
        };

        info!("Disconnecting from the hub during setup-flow");
        self.disconnect(ctx);

        // use a delay that the ack response will be sent first
        let delay = Duration::from_millis(100);

        // an empty token field keeps an existing token (reconfiguration)
        let have_token = !cfg.get_token().is_empty();
        if have_token && token.is_empty() {
            debug!(
                "[{}] no token value provided in setup, using existing token",
                msg.ws_id
            );
        }

        if have_token {
            // token available: skip the hub authorization flow
            if let Err(e) = save_user_settings(&cfg) {
                return Box::pin(fut::result(Err(e)));
            }
            self.settings.hub = cfg;

            if self.setup.expert {
                ctx.notify_later(RequestExpertOptionsMsg::new(msg.ws_id), delay);
            } else {
                ctx.notify_later(FinishSetupFlowMsg::new(msg.ws_id, None), delay);
            }
            // this will acknowledge the setup_driver request message
            return Box::pin(fut::result(Ok(())));
        }

        // no token: request an authorization code, then wait for the action button press
        let api = DirigeraApi::new(&cfg);
        let ws_id = msg.ws_id;
        Box::pin(
            async move { api.start_authorization().await }
                .into_actor(self)
                .map(move |result, act, ctx| {
                    match result {
                        Ok(authorization) => {
                            act.setup.authorization = Some(authorization);
                            act.setup.cfg = Some(cfg);
                            ctx.notify_later(RequestActionButtonMsg::new(ws_id), delay);
                        }
                        Err(e) => {
                            warn!("[{ws_id}] Hub authorization request failed: {e:?}");
                            ctx.notify_later(
                                FinishSetupFlowMsg::new(ws_id, Some(setup_error(e))),
                                delay,
                            );
                        }
                    }
                    // this will acknowledge the setup_driver request message
                    Ok(())
                }),
        )
    }
}

/// Handle driver setup input data.
///
/// A confirmation continues the hub authorization flow: redeem the authorization code for an
/// access token. Input values from the expert configuration screen are validated and saved.
/// Both trigger the end of the setup flow with [FinishSetupFlowMsg] unless the expert screen
/// is still pending.
impl Handler<SetDriverUserDataMsg> for Controller {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    fn handle(&mut self, msg: SetDriverUserDataMsg, ctx: &mut Self::Context) -> Self::Result {
        debug!("[{}] {:?}", msg.ws_id, msg.data);

        if self.sm_consume(&msg.ws_id, &SetupUserData, ctx).is_err() {
            return Box::pin(fut::result(Err(BadRequest(
                "Not waiting for driver user data. Please restart setup.".into(),
            ))));
        }

        // use a delay that the ack response will be sent first
        let delay = Duration::from_millis(100);

        match msg.data {
            IntegrationSetup::Confirm(_) => {
                // the user pressed the action button: redeem the authorization code
                let Some(authorization) = self.setup.authorization.take() else {
                    return Box::pin(fut::result(Err(BadRequest(
                        "No pending hub authorization. Please restart setup.".into(),
                    ))));
                };
                let Some(mut cfg) = self.setup.cfg.take() else {
                    return Box::pin(fut::result(Err(BadRequest(
                        "No pending hub configuration. Please restart setup.".into(),
                    ))));
                };

                let api = DirigeraApi::new(&cfg);
                let ws_id = msg.ws_id;
                Box::pin(
                    async move { api.get_token(authorization).await }
                        .into_actor(self)
                        .map(move |result, act, ctx| {
                            match result {
                                Ok(token) => {
                                    cfg.set_token(token);
                                    if let Err(e) = save_user_settings(&cfg) {
                                        ctx.notify_later(
                                            FinishSetupFlowMsg::new(
                                                ws_id,
                                                Some(IntegrationSetupError::Other),
                                            ),
                                            delay,
                                        );
                                        return Err(e);
                                    }
                                    info!("[{ws_id}] Hub authorization successful");
                                    act.settings.hub = cfg;

                                    if act.setup.expert {
                                        ctx.notify_later(
                                            RequestExpertOptionsMsg::new(ws_id),
                                            delay,
                                        );
                                    } else {
                                        ctx.notify_later(
                                            FinishSetupFlowMsg::new(ws_id, None),
                                            delay,
                                        );
                                    }
                                }
                                Err(e) => {
                                    warn!("[{ws_id}] Hub token request failed: {e:?}");
                                    ctx.notify_later(
                                        FinishSetupFlowMsg::new(ws_id, Some(setup_error(e))),
                                        delay,
                                    );
                                }
                            }
                            // this will acknowledge the set_driver_user_data request message
                            Ok(())
                        }),
                )
            }
            IntegrationSetup::InputValues(values) => {
                // validate setup data from the expert configuration screen
                let mut cfg = self.settings.hub.clone();
                if let Some(value) = parse_value(&values, "connection_timeout") {
                    if value >= 3 {
                        cfg.connection_timeout = value;
                    }
                }
                if let Some(value) = parse_value(&values, "request_timeout") {
                    if value >= 3 {
                        cfg.request_timeout = value;
                    }
                }
                if let Some(value) = parse_value(&values, "disconnect_in_standby") {
                    cfg.disconnect_in_standby = value;
                }
                if let Some(value) = parse_value(&values, "max_frame_size_kb") {
                    if value >= 1024 {
                        cfg.max_frame_size_kb = value;
                    }
                }
                if let Some(value) = parse_value(&values, "heartbeat_interval") {
                    cfg.heartbeat.interval = Duration::from_secs(value);
                }
                if let Some(value) = parse_value(&values, "heartbeat_timeout") {
                    cfg.heartbeat.timeout = Duration::from_secs(value);
                }
                if let Some(value) = parse_value(&values, "ping_frames") {
                    cfg.heartbeat.ping_frames = value;
                }
                if let Some(value) = parse_value(&values, "reconnect.attempts") {
                    cfg.reconnect.attempts = value;
                }
                if let Some(value) = parse_value(&values, "reconnect.duration_ms") {
                    cfg.reconnect.duration = Duration::from_millis(value);
                }
                if let Some(value) = parse_value(&values, "reconnect.duration_max_ms") {
                    cfg.reconnect.duration_max = Duration::from_millis(value);
                }
                if let Some(value) = parse_value(&values, "reconnect.backoff_factor") {
                    if value >= 1f32 {
                        cfg.reconnect.backoff_factor = value;
                    }
                }

                if let Err(e) = save_user_settings(&cfg) {
                    return Box::pin(fut::result(Err(e)));
                }
                self.settings.hub = cfg;

                ctx.notify_later(FinishSetupFlowMsg::new(msg.ws_id, None), delay);

                // this will acknowledge the set_driver_user_data request message
                Box::pin(fut::result(Ok(())))
            }
        }
    }
}

/// Send the action button confirmation request.
///
/// The setup flow will continue with the [SetDriverUserDataMsg] confirmation once the user
/// pressed the action button on the hub, or timeout if no response is received.
impl Handler<RequestActionButtonMsg> for Controller {
    type Result = ();

    fn handle(&mut self, msg: RequestActionButtonMsg, ctx: &mut Self::Context) -> Self::Result {
        if self.sm_consume(&msg.ws_id, &RequestUserInput, ctx).is_err() {
            return;
        }

        let event = WsMessage::event(
            "driver_setup_change",
            EventCategory::Device,
            json!({
                "event_type": SetupChangeEventType::Setup,
                "state": IntegrationSetupState::WaitUserAction,
                "require_user_action": {
                    "confirmation": {
                        "title": {
                            "en": "Pair with the DIRIGERA hub",
                            "de": "Mit dem DIRIGERA Hub koppeln"
                        },
                        "message1": {
                            "en": "Press the action button on the bottom of the DIRIGERA hub, then continue.",
                            "de": "Drücke den Action-Button auf der Unterseite des DIRIGERA Hubs und fahre danach fort."
                        }
                    }
                }
            }),
        );
        self.send_r2_msg(event, &msg.ws_id);
    }
}

/// Send the expert configuration data request.
///
/// The setup flow will continue with the [SetDriverUserDataMsg] or timeout if no response is received.
impl Handler<RequestExpertOptionsMsg> for Controller {
    type Result = ();

    fn handle(&mut self, msg: RequestExpertOptionsMsg, ctx: &mut Self::Context) -> Self::Result {
        if self.sm_consume(&msg.ws_id, &RequestUserInput, ctx).is_err() {
            return;
        }

        let event = WsMessage::event(
            "driver_setup_change",
            EventCategory::Device,
            json!({
                "event_type": SetupChangeEventType::Setup,
                "state": IntegrationSetupState::WaitUserAction,
                "require_user_action": {
                    "input": {
                        "title": {
                            "en": "Expert configuration",
                            "de": "Expert Konfiguration"
                        },
                        "settings": [
                            {
                                "id": "connection_timeout",
                                "label": {
                                    "en": "TCP connection timeout in seconds",
                                    "de": "TCP Verbindungs-Timeout in Sekunden"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.connection_timeout,
                                        "min": 3,
                                        "max": 30,
                                        "unit": { "en": "sec" } // not yet working in web-configurator
                                    }
                                }
                            },
                            {
                                "id": "request_timeout",
                                "label": {
                                    "en": "Request timeout in seconds",
                                    "de": "Anfrage-Timeout in Sekunden"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.request_timeout,
                                        "min": 3,
                                        "max": 30,
                                        "unit": { "en": "sec" }
                                    }
                                }
                            },
                            {
                                "id": "disconnect_in_standby",
                                "label": {
                                    "en": "Disconnect when entering standby",
                                    "de": "Trennen der Verbindung im Standby-Modus"
                                },
                                "field": {
                                    "checkbox": {
                                      "value": self.settings.hub.disconnect_in_standby
                                    }
                                }
                            },
                            {
                                "id": "max_frame_size_kb",
                                "label": {
                                    "en": "Max WebSocket frame size (kilobyte)",
                                    "de": "Max WebSocket Frame Grösse (Kilobyte)"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.max_frame_size_kb,
                                        "min": 1024,
                                        "max": 16384,
                                        "unit": { "en": "KB" }
                                    }
                                }
                            },
                            {
                                "id": "reconnect.attempts",
                                "label": {
                                    "en": "Max reconnect attempts (0 = unlimited)",
                                    "de": "Max Anzahl Verbindungsversuche (0 = unlimitiert)"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.reconnect.attempts,
                                        "min": 0,
                                        "max": 2000000
                                    }
                                }
                            },
                            {
                                "id": "reconnect.duration_ms",
                                "label": {
                                    "en": "Initial reconnect delay in milliseconds",
                                    "de": "Initiale Wiederverbindungsverzögerung in ms"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.reconnect.duration.as_millis(),
                                        "min": 100,
                                        "max": 600000,
                                        "unit": { "en": "ms" }
                                    }
                                }
                            },
                            {
                                "id": "reconnect.duration_max_ms",
                                "label": {
                                    "en": "Max reconnect delay in milliseconds",
                                    "de": "Max Wiederverbindungsverzögerung in ms"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.reconnect.duration_max.as_millis(),
                                        "min": 1000,
                                        "max": 600000,
                                        "unit": { "en": "ms" }
                                    }
                                }
                            },
                            {
                                "id": "reconnect.backoff_factor",
                                "label": {
                                    "en": "Reconnect backoff factor"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.reconnect.backoff_factor,
                                        "min": 1,
                                        "max": 10,
                                        "decimals": 1,
                                    }
                                }
                            },
                            {
                                "id": "heartbeat_interval",
                                "label": {
                                    "en": "Heartbeat interval in seconds",
                                    "de": "Heartbeat Intervall in Sekunden"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.heartbeat.interval.as_secs(),
                                        "min": 5,
                                        "max": 60,
                                        "unit": { "en": "sec", "de": "Sek" }
                                    }
                                }
                            },
                            {
                                "id": "heartbeat_timeout",
                                "label": {
                                    "en": "Heartbeat timeout in seconds",
                                    "de": "Heartbeat Timeout in Sekunden"
                                },
                                "field": {
                                    "number": {
                                        "value": self.settings.hub.heartbeat.timeout.as_secs(),
                                        "min": 5,
                                        "max": 300,
                                        "unit": { "en": "sec", "de": "Sek" }
                                    }
                                }
                            },
                            {
                                "id": "ping_frames",
                                "label": {
                                    "en": "Use WebSocket ping frames for heartbeat",
                                    "de": "Verwende WebSocket Ping-frames für Heartbeat"
                                },
                                "field": {
                                    "checkbox": {
                                      "value": self.settings.hub.heartbeat.ping_frames
                                    }
                                }
                            }
                        ]
                    }
                }
            }),
        );
        self.send_r2_msg(event, &msg.ws_id);
    }
}

/// Finish the setup flow.
///
/// For a successful setup flow, a new connection to the hub is started with the new settings.
/// This triggers the setup flow change event with the setup state.
impl Handler<FinishSetupFlowMsg> for Controller {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, msg: FinishSetupFlowMsg, ctx: &mut Self::Context) -> Self::Result {
        let input = if msg.error.is_none() {
            Successful
        } else {
            SetupError
        };
        if self.sm_consume(&msg.ws_id, &input, ctx).is_err() {
            return Box::pin(fut::ready(()));
        }

        if let Some(handle) = self.setup.timeout.take() {
            ctx.cancel_future(handle);
        }
        self.setup = Default::default();

        if let Some(session) = self.sessions.get_mut(&msg.ws_id) {
            session.reconfiguring = None;
        };

        let mut delay = None;
        if matches!(self.machine.state(), &OperationModeState::Running) {
            info!("Reconnecting to the hub with new configuration settings");
            ctx.notify(ConnectMsg::default());
            // delay to notify R2 that the setup flow is finished
            delay = Some(Duration::from_secs(2));
        }

        let state = if msg.error.is_none() {
            IntegrationSetupState::Ok
        } else {
            IntegrationSetupState::Error
        };
        let event = WsMessage::event(
            "driver_setup_change",
            EventCategory::Device,
            serde_json::to_value(DriverSetupChange {
                event_type: SetupChangeEventType::Stop,
                state,
                error: msg.error,
                require_user_action: None,
            })
            .expect("DriverSetupChange serialize error"),
        );

        Box::pin(
            async move {
                // quick and dirty wait for the client connection to be most likely connected
                if let Some(delay) = delay {
                    sleep(delay).await;
                }
            }
            .into_actor(self) // converts future to ActorFuture
            .map(move |_, act, _ctx| {
                info!("Setup flow finished: sending driver_setup_change STOP with state {state}");
                act.send_r2_msg(event, &msg.ws_id);
            }),
        )
    }
}

impl Handler<AbortDriverSetup> for Controller {
    type Result = ();

    fn handle(&mut self, msg: AbortDriverSetup, ctx: &mut Self::Context) -> Self::Result {
        debug!(
            "[{}] abort driver setup request, timeout: {}",
            msg.ws_id, msg.timeout
        );

        if msg.timeout {
            if self.sm_consume(&msg.ws_id, &SetupError, ctx).is_err() {
                return;
            }
            // notify Remote Two that we ran into a timeout
            ctx.notify(FinishSetupFlowMsg {
                ws_id: msg.ws_id,
                error: Some(IntegrationSetupError::Timeout),
            })
        } else {
            // abort: Remote Two aborted setup flow
            if self.sm_consume(&msg.ws_id, &AbortSetup, ctx).is_err() {
                return;
            }

            // Continue normal operation if it was a reconfiguration and not an initial setup.
            // Otherwise we'll always get a "setup required" when requesting entities in the web-configurator.
            if let Some(session) = self.sessions.get_mut(&msg.ws_id) {
                let reconfiguring = session.reconfiguring;
                session.reconfiguring = None;
                if matches!(self.machine.state(), &OperationModeState::RequireSetup)
                    && reconfiguring == Some(true)
                    && !self.settings.hub.get_host().is_empty()
                    && !self.settings.hub.get_token().is_empty()
                {
                    let _ = self.sm_consume(&msg.ws_id, &ConfigurationAvailable, ctx);
                    ctx.notify(ConnectMsg::default());
                }
            }

            if let Some(handle) = self.setup.timeout.take() {
                ctx.cancel_future(handle);
            }
            // cleanup setup activities: drop a pending authorization and staged configuration
            self.setup = Default::default();
        }
    }
}

/// Map a hub API error to the corresponding setup error code.
fn setup_error(e: ServiceError) -> IntegrationSetupError {
    match e {
        ServiceError::AuthenticationError(_) => IntegrationSetupError::AuthorizationError,
        ServiceError::NotConnected => IntegrationSetupError::ConnectionRefused,
        _ => IntegrationSetupError::Other,
    }
}

fn parse_value<T: FromStr>(map: &HashMap<String, String>, key: &str) -> Option<T> {
    map.get(key).and_then(|v| T::from_str(v).ok())
}

/// Validate the hub address from the setup flow and extract the host.
///
/// The address may be entered as plain hostname or IP address, with an optional
/// port, or as a pasted URL from a browser.
fn validate_host<'a>(addr: impl Into<Option<&'a str>>) -> Result<String, ServiceError> {
    let addr = match addr.into() {
        None => return Err(BadRequest("Missing field: host".into())),
        Some(addr) => addr.trim(),
    };

    // user provided address might be missing a scheme
    let mut url = match Url::parse(addr) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => parse_with_https_scheme(addr)?,
        Err(e) => {
            warn!("Invalid hub address '{addr}': {e}");
            return Err(e.into());
        }
    };

    // quirk of URL parsing: hostname:port detects the hostname as scheme!
    if url.host_str().is_none() {
        url = parse_with_https_scheme(addr)?;
    }

    if !matches!(url.scheme(), "http" | "https") {
        return Err(BadRequest("Invalid scheme, allowed: http, https".into()));
    }

    match url.host_str() {
        Some(host) => Ok(host.to_string()),
        None => Err(BadRequest(format!("Invalid hub address: {addr}"))),
    }
}

fn parse_with_https_scheme(address: &str) -> Result<Url, url::ParseError> {
    let address = format!("https://{address}");
    Url::parse(&address).map_err(|e| {
        warn!("Invalid address '{address}': {e}");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::validate_host;
    use crate::errors::ServiceError::BadRequest;

    fn host(host: &str) -> Result<String, crate::errors::ServiceError> {
        Ok(host.to_string())
    }

    #[test]
    fn empty_address_returns_error() {
        let result = validate_host(None);
        assert!(matches!(result, Err(BadRequest(_))));
        let result = validate_host("");
        assert!(matches!(result, Err(BadRequest(_))));
        let result = validate_host("  ");
        assert!(matches!(result, Err(BadRequest(_))));
    }

    #[test]
    fn host_only() {
        assert_eq!(host("dirigera"), validate_host("dirigera"));
    }

    #[test]
    fn ip_address_only() {
        assert_eq!(host("192.168.1.40"), validate_host("192.168.1.40"));
    }

    #[test]
    fn ip_address_with_port() {
        assert_eq!(host("192.168.1.40"), validate_host("192.168.1.40:8443"));
    }

    #[test]
    fn hostname_with_port() {
        assert_eq!(host("dirigera.local"), validate_host("dirigera.local:8443"));
    }

    #[test]
    fn address_with_spaces_is_trimmed() {
        assert_eq!(host("192.168.1.40"), validate_host("  192.168.1.40   "));
    }

    #[test]
    fn scheme_is_stripped() {
        assert_eq!(host("dirigera.local"), validate_host("https://dirigera.local"));
        assert_eq!(host("dirigera.local"), validate_host("http://dirigera.local"));
        assert_eq!(host("dirigera.local"), validate_host("HTTPS://dirigera.local"));
    }

    #[test]
    fn url_with_path_returns_host() {
        assert_eq!(
            host("192.168.1.40"),
            validate_host("https://192.168.1.40:8443/v1")
        );
    }

    #[test]
    fn invalid_scheme_returns_error() {
        let result = validate_host("foo://test");
        assert!(matches!(result, Err(BadRequest(_))));
    }
}
