// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Scene entity specific command logic.

use crate::api::SceneCommand;
use crate::api::intg::EntityCommand;
use crate::errors::ServiceError;
use crate::hub::model::Scene;
use crate::hub::service::{HubRequest, cmd_from_str};

pub(crate) fn handle_scene(
    scene: &Scene,
    msg: &EntityCommand,
) -> Result<Vec<HubRequest>, ServiceError> {
    // the remote sends scene.on for activation
    let cmd = if msg.cmd_id == "on" {
        SceneCommand::Trigger
    } else {
        cmd_from_str(&msg.cmd_id)?
    };

    let request = match cmd {
        SceneCommand::Trigger => HubRequest::TriggerScene(scene.id.clone()),
        SceneCommand::Undo => HubRequest::UndoScene(scene.id.clone()),
    };

    Ok(vec![request])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn scene() -> Scene {
        serde_json::from_value(json!({
            "id": "scene-1",
            "type": "userScene",
            "info": { "name": "Movie night" }
        }))
        .unwrap()
    }

    fn command(cmd_id: &str) -> EntityCommand {
        serde_json::from_value(json!({
            "entity_type": "scene",
            "entity_id": "scene-1",
            "cmd_id": cmd_id
        }))
        .unwrap()
    }

    #[rstest]
    #[case("trigger")]
    #[case("on")]
    fn trigger_and_on_activate_the_scene(#[case] cmd_id: &str) {
        let requests = handle_scene(&scene(), &command(cmd_id)).unwrap();

        assert_eq!(vec![HubRequest::TriggerScene("scene-1".into())], requests);
    }

    #[test]
    fn undo_reverts_the_scene() {
        let requests = handle_scene(&scene(), &command("undo")).unwrap();

        assert_eq!(vec![HubRequest::UndoScene("scene-1".into())], requests);
    }

    #[test]
    fn invalid_command_returns_bad_request() {
        let result = handle_scene(&scene(), &command("paused"));

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }
}
