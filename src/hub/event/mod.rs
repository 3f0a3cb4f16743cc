// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! DIRIGERA WebSocket event message handling.
//!
//! Events carry partial device state. Every event first updates the device or
//! scene cache, then the new state is converted to entity change messages by
//! entity type specific functions and sent to the controller in Actix
//! `EntityEvent` messages to be delegated to the connected remotes.

mod cover;
mod fan;
mod light;
mod sensor;
mod switch;

pub(crate) use cover::*;
pub(crate) use fan::*;
pub(crate) use light::*;
pub(crate) use sensor::*;
pub(crate) use switch::*;

use crate::api::intg::EntityChange;
use crate::errors::ServiceError;
use crate::hub::DirigeraClient;
use crate::hub::entity::device_set_members;
use crate::hub::messages::EntityEvent;
use crate::hub::model::{Device, DeviceType, DeviceUpdate, HubEvent, HubEventType, Scene};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;

impl DirigeraClient {
    /// Whenever an event message is received from the hub, this method is
    /// called to handle it.
    ///
    /// Device and scene events update the caches. State changes are delegated
    /// to the entity type specific conversion functions for the supported
    /// device types.
    pub(crate) fn handle_event(&mut self, event: HubEvent) -> Result<(), ServiceError> {
        match event.event_type {
            HubEventType::DeviceStateChanged => self.on_device_state_changed(event.data),
            HubEventType::DeviceAdded => self.on_device_added(event.data),
            HubEventType::DeviceRemoved => self.on_device_removed(event.data),
            HubEventType::SceneCreated | HubEventType::SceneUpdated => {
                let scene: Scene = serde_json::from_value(event.data)?;
                debug!("[{}] Scene updated: {}", self.id, scene.info.name);
                self.scenes.insert(scene.id.clone(), scene);
                Ok(())
            }
            HubEventType::SceneDeleted => {
                if let Some(id) = event.data.get("id").and_then(Value::as_str)
                    && let Some(scene) = self.scenes.remove(id)
                {
                    debug!("[{}] Scene deleted: {}", self.id, scene.info.name);
                }
                Ok(())
            }
            HubEventType::Unknown => {
                debug!("[{}] Ignoring unsupported hub event {}", self.id, event.id);
                Ok(())
            }
        }
    }

    fn on_device_state_changed(&mut self, data: Value) -> Result<(), ServiceError> {
        let update: DeviceUpdate = serde_json::from_value(data)?;

        {
            let Some(device) = self.devices.get_mut(&update.id) else {
                debug!(
                    "[{}] Ignoring state change of unknown device {}",
                    self.id, update.id
                );
                return Ok(());
            };
            if let Some(reachable) = update.is_reachable {
                device.is_reachable = reachable;
            }
            if let Some(attributes) = &update.attributes {
                device.attributes.merge(attributes)?;
            }
        }

        let Some(device) = self.devices.get(&update.id) else {
            return Ok(());
        };
        self.send_entity_changes(self.entity_changes(device))
    }

    fn on_device_added(&mut self, data: Value) -> Result<(), ServiceError> {
        let device: Device = serde_json::from_value(data)?;
        info!(
            "[{}] Device added: {} ({:?})",
            self.id,
            device.name(),
            device.device_type
        );

        // The remote only sees new entities after fetching available entities
        // again, state changes of unsubscribed entities are filtered out.
        let id = device.id.clone();
        self.devices.insert(id.clone(), device);
        if let Some(device) = self.devices.get(&id) {
            self.send_entity_changes(self.entity_changes(device))?;
        }
        Ok(())
    }

    fn on_device_removed(&mut self, data: Value) -> Result<(), ServiceError> {
        let Some(id) = data.get("id").and_then(Value::as_str) else {
            return Err(ServiceError::BadRequest(
                "Missing id in deviceRemoved event".into(),
            ));
        };
        let Some(mut device) = self.devices.remove(id) else {
            return Ok(());
        };
        info!("[{}] Device removed: {}", self.id, device.name());

        // push a final state so the remote shows the entities as unavailable
        device.is_reachable = false;
        self.send_entity_changes(self.entity_changes(&device))
    }

    /// Entity changes for the current state of a device.
    ///
    /// A bulb in a device set is reported as the aggregated device set entity
    /// if individual set members are hidden.
    fn entity_changes(&self, device: &Device) -> Vec<EntityChange> {
        if self.hide_device_set_bulbs
            && device.device_type == DeviceType::Light
            && !device.device_set.is_empty()
        {
            device
                .device_set
                .iter()
                .map(|set| {
                    light_set_entity_change(&set.id, &device_set_members(&self.devices, &set.id))
                })
                .collect()
        } else {
            device_entity_changes(device)
        }
    }

    fn send_entity_changes(&self, changes: Vec<EntityChange>) -> Result<(), ServiceError> {
        for entity_change in changes {
            self.controller_actor.try_send(EntityEvent {
                client_id: self.id.clone(),
                entity_change,
            })?;
        }
        Ok(())
    }
}

/// Convert the current state of a device into entity change messages, one per
/// exposed entity.
pub(crate) fn device_entity_changes(device: &Device) -> Vec<EntityChange> {
    match device.device_type {
        DeviceType::Outlet => vec![outlet_entity_change(device)],
        DeviceType::Light => vec![light_entity_change(device)],
        DeviceType::Blinds => vec![blinds_entity_change(device)],
        DeviceType::AirPurifier => vec![air_purifier_entity_change(device)],
        DeviceType::EnvironmentSensor => environment_sensor_changes(device),
        DeviceType::MotionSensor => motion_sensor_changes(device),
        DeviceType::OpenCloseSensor => open_close_sensor_changes(device),
        DeviceType::WaterSensor => water_sensor_changes(device),
        DeviceType::LightController
        | DeviceType::BlindsController
        | DeviceType::SoundController
        | DeviceType::Controller => battery_sensor_change(device).into_iter().collect(),
        DeviceType::Gateway | DeviceType::Unknown => Vec::new(),
    }
}

/// Current state of all cached devices as entity change messages.
///
/// Device set members are reported as one aggregated change per set if
/// individual set members are hidden. Scene entities are stateless.
pub(crate) fn entity_states(
    devices: &HashMap<String, Device>,
    hide_device_set_bulbs: bool,
) -> Vec<EntityChange> {
    let mut states = Vec::with_capacity(devices.len());
    let mut seen_sets: Vec<&str> = Vec::new();

    for device in devices.values() {
        if hide_device_set_bulbs
            && device.device_type == DeviceType::Light
            && !device.device_set.is_empty()
        {
            for set in &device.device_set {
                if seen_sets.contains(&set.id.as_str()) {
                    continue;
                }
                seen_sets.push(&set.id);
                states.push(light_set_entity_change(
                    &set.id,
                    &device_set_members(devices, &set.id),
                ));
            }
            continue;
        }
        states.extend(device_entity_changes(device));
    }

    states
}

/// UC on/off state from reachability and the `isOn` attribute.
pub(crate) fn device_onoff_state(device: &Device) -> Value {
    let state = if !device.is_reachable {
        "UNAVAILABLE"
    } else {
        match device.attributes.is_on {
            Some(true) => "ON",
            Some(false) => "OFF",
            None => "UNKNOWN",
        }
    };
    Value::String(state.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn device(value: Value) -> Device {
        serde_json::from_value(value).expect("valid device json")
    }

    #[test]
    fn entity_states_returns_one_change_per_entity() {
        let mut devices = HashMap::new();
        devices.insert(
            "outlet-1".into(),
            device(json!({
                "id": "outlet-1",
                "deviceType": "outlet",
                "isReachable": true,
                "attributes": { "isOn": true }
            })),
        );
        devices.insert(
            "env-1".into(),
            device(json!({
                "id": "env-1",
                "deviceType": "environmentSensor",
                "isReachable": true,
                "attributes": { "currentTemperature": 20.5, "currentRH": 44 }
            })),
        );

        let mut ids: Vec<String> = entity_states(&devices, true)
            .into_iter()
            .map(|change| change.entity_id)
            .collect();
        ids.sort();

        assert_eq!(vec!["env-1_humidity", "env-1_temperature", "outlet-1"], ids);
    }

    #[test]
    fn entity_states_aggregates_device_sets_once() {
        let set = json!([{ "id": "set-1", "name": "Floor lamps" }]);
        let mut devices = HashMap::new();
        for (id, on) in [("bulb-1", true), ("bulb-2", false)] {
            devices.insert(
                id.into(),
                device(json!({
                    "id": id,
                    "deviceType": "light",
                    "isReachable": true,
                    "attributes": { "isOn": on, "lightLevel": 40 },
                    "deviceSet": set
                })),
            );
        }

        let states = entity_states(&devices, true);

        assert_eq!(1, states.len());
        assert_eq!("set-1", states[0].entity_id);
        assert_eq!(Some(&json!("ON")), states[0].attributes.get("state"));
    }

    #[test]
    fn entity_states_lists_set_members_when_not_hidden() {
        let mut devices = HashMap::new();
        devices.insert(
            "bulb-1".into(),
            device(json!({
                "id": "bulb-1",
                "deviceType": "light",
                "isReachable": true,
                "attributes": { "isOn": false },
                "deviceSet": [{ "id": "set-1", "name": "Floor lamps" }]
            })),
        );

        let states = entity_states(&devices, false);

        assert_eq!(1, states.len());
        assert_eq!("bulb-1", states[0].entity_id);
    }

    #[test]
    fn unreachable_device_state_is_unavailable() {
        let device = device(json!({
            "id": "outlet-1",
            "deviceType": "outlet",
            "isReachable": false,
            "attributes": { "isOn": true }
        }));

        assert_eq!(json!("UNAVAILABLE"), device_onoff_state(&device));
    }

    #[test]
    fn gateway_has_no_entity_changes() {
        let device = device(json!({
            "id": "gw-1",
            "deviceType": "gateway",
            "isReachable": true,
            "attributes": {}
        }));

        assert!(device_entity_changes(&device).is_empty());
    }
}
