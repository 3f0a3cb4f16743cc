// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Entity related enum definitions of the Integration API.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Switch,
    Light,
    Sensor,
    Cover,
    Fan,
    Scene,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchCommand {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum LightCommand {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum CoverCommand {
    Open,
    Close,
    Stop,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum FanCommand {
    On,
    Off,
    Toggle,
    SetSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum SceneCommand {
    Trigger,
    Undo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchFeature {
    OnOff,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LightFeature {
    OnOff,
    Toggle,
    Dim,
    Color,
    ColorTemperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CoverFeature {
    Open,
    Close,
    Stop,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FanFeature {
    OnOff,
    Toggle,
    Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchDeviceClass {
    Outlet,
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SensorDeviceClass {
    Battery,
    Current,
    Custom,
    Energy,
    Humidity,
    Power,
    Temperature,
    Voltage,
}

/// Sensor entity options for custom sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SensorOption {
    CustomLabel,
    CustomUnit,
    NativeUnit,
    Decimals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn entity_type_wire_names() {
        assert_eq!("light", EntityType::Light.to_string());
        assert_eq!(Ok(EntityType::Switch), EntityType::from_str("switch"));
        assert_eq!(
            serde_json::json!("cover"),
            serde_json::to_value(EntityType::Cover).unwrap()
        );
    }

    #[test]
    fn commands_parse_from_snake_case() {
        assert_eq!(Ok(SwitchCommand::Toggle), SwitchCommand::from_str("toggle"));
        assert_eq!(Ok(FanCommand::SetSpeed), FanCommand::from_str("set_speed"));
        assert_eq!(Ok(CoverCommand::Position), CoverCommand::from_str("position"));
        assert!(SceneCommand::from_str("on").is_err());
    }

    #[test]
    fn feature_names_are_snake_case() {
        assert_eq!("color_temperature", LightFeature::ColorTemperature.to_string());
        assert_eq!("on_off", SwitchFeature::OnOff.to_string());
    }
}
