// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Scene entity mapping for user scenes.

use super::entity_name;
use crate::api::EntityType;
use crate::api::intg::AvailableEntity;
use crate::hub::model::Scene;

pub(crate) fn convert_scene_entity(scene: &Scene) -> AvailableEntity {
    let mut options = serde_json::Map::new();
    if let Some(icon) = scene.info.icon.as_deref() {
        options.insert("icon".into(), icon.into());
    }

    AvailableEntity {
        device_id: None,
        entity_type: EntityType::Scene,
        entity_id: scene.id.clone(),
        device_class: None,
        features: None,
        name: entity_name(scene.info.name.clone()),
        area: None,
        device_info: None,
        options: if options.is_empty() {
            None
        } else {
            Some(options)
        },
    }
}
