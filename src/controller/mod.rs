// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Central controller handling integration WS requests and the DIRIGERA hub connection.

mod handler;
mod messages;

pub use messages::*;

use crate::api::intg::{DeviceState, IntegrationDriverUpdate};
use crate::api::ws::{EventCategory, WsMessage};
use crate::configuration::{
    DEF_SETUP_TIMEOUT_SEC, DirigeraSettings, ENV_SETUP_TIMEOUT, Settings,
};
use crate::errors::ServiceError;
use crate::hub::DirigeraClient;
use crate::hub::messages::Close;
use crate::hub::rest::PkceAuthorization;
use crate::util::new_websocket_client;
use actix::prelude::{Actor, Context, Recipient};
use actix::{Addr, AsyncContext, SpawnHandle};
use log::{debug, error, info, warn};
use rust_fsm::*;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::env;
use std::time::Duration;

state_machine! {
    derive(Debug)
    OperationMode(RequireSetup)

    RequireSetup => {
        ConfigurationAvailable => Running,
        SetupDriverRequest => SetupFlow [SetupFlowTimer],
    },
    Running(SetupDriverRequest) => SetupFlow [SetupFlowTimer],
    Running(R2Request) => Running,
    SetupFlow => {
        AbortSetup => RequireSetup,
        Successful => Running,
        SetupError => SetupError,
        RequestUserInput => WaitSetupUserData,
    },
    WaitSetupUserData => {
        SetupUserData => SetupFlow,
        AbortSetup => RequireSetup,
        SetupError => SetupError,
    },
    SetupError => {
        AbortSetup => RequireSetup,
        SetupDriverRequest => SetupFlow [SetupFlowTimer],
        SetupError => SetupError,
    },
}

struct R2Session {
    recipient: Recipient<SendWsMessage>,
    standby: bool,
    subscribed_entities: HashSet<String>,
    /// Running setup flow is a reconfiguration of the existing hub configuration.
    reconfiguring: Option<bool>,
    // TODO replace with request id map & oneshot notification
    /// quick and dirty request id mapping for get_available_entities request.
    get_available_entities_id: Option<u32>,
    /// quick and dirty request id mapping for get_entity_states request.
    get_entity_states_id: Option<u32>,
}

impl R2Session {
    fn new(recipient: Recipient<SendWsMessage>) -> Self {
        Self {
            recipient,
            standby: false,
            subscribed_entities: Default::default(),
            reconfiguring: None,
            get_available_entities_id: None,
            get_entity_states_id: None,
        }
    }
}

/// Transient state of a running driver setup flow.
#[derive(Default)]
struct SetupState {
    /// Handle of the running setup flow timeout timer.
    timeout: Option<SpawnHandle>,
    /// Show the expert configuration page after hub authorization.
    expert: bool,
    /// Pending hub authorization, waiting for the action button press.
    authorization: Option<PkceAuthorization>,
    /// Validated hub settings to activate once the flow finishes.
    cfg: Option<DirigeraSettings>,
}

pub struct Controller {
    // TODO use actor address instead? Recipient is generic but only allows one specific message
    /// Active Remote Two WebSocket sessions
    sessions: HashMap<String, R2Session>,
    /// DIRIGERA hub connection state
    device_state: DeviceState,
    settings: Settings,
    /// WebSocket client
    // creating an expensive client is sufficient once per process and can be used to create multiple connections
    ws_client: awc::Client,
    /// DIRIGERA hub client actor
    hub_client: Option<Addr<DirigeraClient>>,
    hub_reconnect_duration: Duration,
    hub_reconnect_attempt: u32,
    drv_metadata: IntegrationDriverUpdate,
    machine: StateMachine<OperationMode>,
    setup: SetupState,
}

impl Controller {
    pub fn new(settings: Settings, drv_metadata: IntegrationDriverUpdate) -> Self {
        let mut machine = StateMachine::new();
        if settings.hub.get_host().is_empty() || settings.hub.get_token().is_empty() {
            info!("No hub configuration available: driver setup required");
        } else {
            let _ = machine.consume(&OperationModeInput::ConfigurationAvailable);
        }
        Self {
            sessions: Default::default(),
            device_state: DeviceState::Disconnected,
            ws_client: new_websocket_client(
                Duration::from_secs(settings.hub.connection_timeout as u64),
                settings.hub.disable_cert_validation,
            ),
            hub_reconnect_duration: settings.hub.reconnect.duration,
            settings,
            hub_client: None,
            hub_reconnect_attempt: 0,
            drv_metadata,
            machine,
            setup: Default::default(),
        }
    }

    /// Send a WebSocket message to the remote
    fn send_r2_msg(&self, message: WsMessage, ws_id: &str) {
        if let Some(session) = self.sessions.get(ws_id) {
            if session.standby {
                debug!("Remote is in standby, not sending message: {message:?}");
                // TODO queue entity update events?
                return;
            }
            if let Err(e) = session.recipient.try_send(SendWsMessage(message)) {
                error!("{ws_id} Internal message send error: {e}");
            }
        } else {
            warn!("attempting to send message but couldn't find session: {ws_id}");
        }
    }

    fn send_device_state(&self, ws_id: &str) {
        self.send_r2_msg(
            WsMessage::event(
                "device_state",
                EventCategory::Device,
                json!({ "state": self.device_state }),
            ),
            ws_id,
        );
    }

    fn broadcast_device_state(&self) {
        for session in self.sessions.keys() {
            self.send_device_state(session);
        }
    }

    fn set_device_state(&mut self, state: DeviceState) {
        self.device_state = state;
        self.broadcast_device_state();
    }

    /// Disconnect from the hub without triggering the auto-reconnect handling.
    fn disconnect(&mut self, _ctx: &mut Context<Self>) {
        self.set_device_state(DeviceState::Disconnected);
        if let Some(addr) = self.hub_client.as_ref() {
            addr.do_send(Close::default());
        }
    }

    /// Process an input in the operation mode state machine.
    ///
    /// The setup flow timeout timer is started if the state transition returns
    /// the corresponding timer output. An invalid transition returns a
    /// `BadRequest` error and the machine remains in the current state.
    fn sm_consume(
        &mut self,
        ws_id: &str,
        input: &OperationModeInput,
        ctx: &mut Context<Self>,
    ) -> Result<(), ServiceError> {
        debug!(
            "State machine input: {input:?}, state: {:?}",
            self.machine.state()
        );
        match self.machine.consume(input) {
            Ok(Some(OperationModeOutput::SetupFlowTimer)) => {
                self.start_setup_timeout(ws_id, ctx);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(_) => Err(ServiceError::BadRequest(format!(
                "Invalid state machine input: {input:?}, state: {:?}",
                self.machine.state()
            ))),
        }
    }

    /// Start or restart the setup flow timeout timer.
    ///
    /// The timer aborts a hanging setup flow, e.g. if the user never presses
    /// the action button on the hub.
    fn start_setup_timeout(&mut self, ws_id: &str, ctx: &mut Context<Self>) {
        if let Some(handle) = self.setup.timeout.take() {
            ctx.cancel_future(handle);
        }
        let timeout = Duration::from_secs(
            env::var(ENV_SETUP_TIMEOUT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEF_SETUP_TIMEOUT_SEC),
        );
        debug!("[{ws_id}] Starting setup flow timeout: {timeout:?}");
        let ws_id = ws_id.to_string();
        self.setup.timeout = Some(ctx.run_later(timeout, move |_act, ctx| {
            warn!("[{ws_id}] Setup flow timed out");
            ctx.notify(handler::AbortDriverSetup { ws_id, timeout: true });
        }));
    }

    fn increment_reconnect_timeout(&mut self) {
        let new_timeout = Duration::from_millis(
            (self.hub_reconnect_duration.as_millis() as f32
                * self.settings.hub.reconnect.backoff_factor) as u64,
        );

        self.hub_reconnect_duration = if new_timeout.gt(&self.settings.hub.reconnect.duration_max) {
            self.settings.hub.reconnect.duration_max
        } else {
            new_timeout
        };
        info!(
            "New reconnect timeout: {}",
            self.hub_reconnect_duration.as_millis()
        )
    }
}

impl Actor for Controller {
    type Context = Context<Self>;
}
