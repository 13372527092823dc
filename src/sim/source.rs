// External forcing supplied to the solver before each step

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sim::config::ConfigError;

/// Density added by a single density injection
pub const UNIT_DENSITY: f32 = 1.;

/// What a source point does to the grid
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum SourceAction {
    /// Add unit density at the point
    Density,
    /// Add the drag vector (x, y) to the velocity source at the point
    Velocity { drag: (f32, f32) },
    /// Record the containing cell as an obstacle
    Obstacle,
}

/// Selector used on the command line; the drag vector is supplied separately
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActionKind {
    Density,
    Velocity,
    Obstacle,
}

impl ActionKind {
    pub fn with_drag(self, drag: (f32, f32)) -> SourceAction {
        match self {
            ActionKind::Density => SourceAction::Density,
            ActionKind::Velocity => SourceAction::Velocity { drag },
            ActionKind::Obstacle => SourceAction::Obstacle,
        }
    }
}

impl FromStr for ActionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "density" => Ok(ActionKind::Density),
            "velocity" => Ok(ActionKind::Velocity),
            "obstacle" => Ok(ActionKind::Obstacle),
            other => Err(ConfigError::UnknownAction(other.to_string())),
        }
    }
}

/// A single user input for one step, in physical coordinates
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SourcePoint {
    pub x: f32,
    pub y: f32,
    pub action: SourceAction,
}

/// A source point held active over a time window `[start, stop)`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Emitter {
    pub position: (f32, f32),
    pub action: SourceAction,

    #[serde(default)]
    pub start: f32,

    /// Open-ended when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<f32>,
}

impl Emitter {
    pub fn is_active(&self, t: f32) -> bool {
        self.start <= t && self.stop.is_none_or(|stop| t < stop)
    }

    pub fn source_point(&self) -> SourcePoint {
        SourcePoint {
            x: self.position.0,
            y: self.position.1,
            action: self.action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!("velocity".parse::<ActionKind>(), Ok(ActionKind::Velocity));
        assert_eq!(
            "smoke".parse::<ActionKind>(),
            Err(ConfigError::UnknownAction("smoke".into()))
        );
        assert_eq!(
            ActionKind::Velocity.with_drag((1., 2.)),
            SourceAction::Velocity { drag: (1., 2.) }
        );
    }

    #[test]
    fn test_emitter_window() {
        let emitter: Emitter = serde_json::from_str(
            r#"{ "position": [0.5, 0.5], "action": "density", "start": 1.0 }"#,
        )
        .unwrap();

        assert!(!emitter.is_active(0.5));
        assert!(emitter.is_active(1.0));
        assert!(emitter.is_active(1e6));

        let gust: Emitter = serde_json::from_str(
            r#"{ "position": [0.1, 0.2], "action": { "velocity": { "drag": [3.0, 0.0] } }, "stop": 2.0 }"#,
        )
        .unwrap();

        assert!(gust.is_active(0.));
        assert!(!gust.is_active(2.));
        assert_eq!(
            gust.source_point(),
            SourcePoint {
                x: 0.1,
                y: 0.2,
                action: SourceAction::Velocity { drag: (3., 0.) }
            }
        );
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<Emitter, _> =
            serde_json::from_str(r#"{ "position": [0.5, 0.5], "action": "smoke" }"#);

        assert!(result.is_err());
    }
}
