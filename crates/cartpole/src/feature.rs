//! # Feature Vector
//!
//! JSON wire form of a [`WorldState`]. It is what the environment hands out
//! and what a deterministic reset takes in:
//!
//! ```json
//! {
//!   "cart":   {"x_position": 0.0, "y_position": 0.0, "z_position": 0.0,
//!              "x_velocity": 0.0, "y_velocity": 0.0, "z_velocity": 0.0},
//!   "pole":   {"x_quaternion": 0.0, "y_quaternion": 0.0, "z_quaternion": 0.0,
//!              "w_quaternion": 1.0, "x_velocity": 0.0, "y_velocity": 0.0},
//!   "blocks": [{"id": 2, "x_position": 1.0, "y_position": 2.0, "z_position": 6.0,
//!               "x_velocity": 7.0, "y_velocity": -8.0, "z_velocity": 6.5}],
//!   "walls":  [[-5, -5, 0], [5, -5, 0], [5, 5, 0], [-5, 5, 0],
//!              [-5, -5, 10], [5, -5, 10], [5, 5, 10], [-5, 5, 10]]
//! }
//! ```
//!
//! In Euler mode the pole carries `x_position`, `y_position` and
//! `z_position` (roll, pitch and yaw in degrees) instead of the quaternion.

use glam::{DQuat, DVec3};
use physics::BodyId;
use serde::{Deserialize, Serialize};

use crate::error::EnvError;
use crate::state::{BlockState, CartState, PoleOrientation, PoleState, WorldState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub cart: CartFeatures,
    pub pole: PoleFeatures,
    #[serde(default)]
    pub blocks: Vec<BlockFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walls: Option<[[f64; 3]; 8]>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartFeatures {
    pub x_position: f64,
    pub y_position: f64,
    pub z_position: f64,
    pub x_velocity: f64,
    pub y_velocity: f64,
    #[serde(default)]
    pub z_velocity: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoleFeatures {
    #[serde(flatten)]
    pub orientation: PoleOrientationFeatures,
    pub x_velocity: f64,
    pub y_velocity: f64,
    #[serde(default)]
    pub z_velocity: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoleOrientationFeatures {
    Quaternion {
        x_quaternion: f64,
        y_quaternion: f64,
        z_quaternion: f64,
        w_quaternion: f64,
    },
    /// Roll, pitch, yaw in degrees.
    ///
    /// The joint stores a quaternion, so a reset from Euler angles reports
    /// them back with a few ulps of conversion error.
    Euler {
        x_position: f64,
        y_position: f64,
        z_position: f64,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub x_position: f64,
    pub y_position: f64,
    pub z_position: f64,
    pub x_velocity: f64,
    pub y_velocity: f64,
    pub z_velocity: f64,
}

impl FeatureVector {
    /// # Errors
    ///
    /// Fails with [`EnvError::FeatureVector`] on malformed JSON or missing fields.
    pub fn from_json(json: &str) -> Result<Self, EnvError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Fails with [`EnvError::FeatureVector`] if a value cannot be encoded
    /// (JSON has no NaN or infinity).
    pub fn to_json(&self) -> Result<String, EnvError> {
        Ok(serde_json::to_string(self)?)
    }

    #[must_use]
    pub fn cart_position(&self) -> DVec3 {
        DVec3::new(self.cart.x_position, self.cart.y_position, self.cart.z_position)
    }

    #[must_use]
    pub fn cart_velocity(&self) -> DVec3 {
        DVec3::new(self.cart.x_velocity, self.cart.y_velocity, self.cart.z_velocity)
    }

    /// Pole orientation as a joint quaternion. Quaternion fields are taken
    /// verbatim, Euler angles are converted.
    #[must_use]
    pub fn pole_quaternion(&self) -> DQuat {
        self.pole.orientation().quaternion()
    }

    /// Wall corners, when present.
    #[must_use]
    pub fn wall_corners(&self) -> Option<[DVec3; 8]> {
        self.walls.map(|walls| walls.map(DVec3::from_array))
    }
}

impl PoleFeatures {
    #[must_use]
    pub fn orientation(&self) -> PoleOrientation {
        match self.orientation {
            PoleOrientationFeatures::Quaternion {
                x_quaternion,
                y_quaternion,
                z_quaternion,
                w_quaternion,
            } => PoleOrientation::Quaternion(DQuat::from_xyzw(x_quaternion, y_quaternion, z_quaternion, w_quaternion)),
            PoleOrientationFeatures::Euler {
                x_position,
                y_position,
                z_position,
            } => PoleOrientation::Euler(DVec3::new(x_position, y_position, z_position)),
        }
    }
}

impl BlockFeatures {
    #[must_use]
    pub fn position(&self) -> DVec3 {
        DVec3::new(self.x_position, self.y_position, self.z_position)
    }

    #[must_use]
    pub fn velocity(&self) -> DVec3 {
        DVec3::new(self.x_velocity, self.y_velocity, self.z_velocity)
    }
}

impl From<&WorldState> for FeatureVector {
    fn from(state: &WorldState) -> Self {
        let CartState { position, velocity } = state.cart;
        let cart = CartFeatures {
            x_position: position.x,
            y_position: position.y,
            z_position: position.z,
            x_velocity: velocity.x,
            y_velocity: velocity.y,
            z_velocity: velocity.z,
        };

        let orientation = match state.pole.orientation {
            PoleOrientation::Quaternion(q) => PoleOrientationFeatures::Quaternion {
                x_quaternion: q.x,
                y_quaternion: q.y,
                z_quaternion: q.z,
                w_quaternion: q.w,
            },
            PoleOrientation::Euler(e) => PoleOrientationFeatures::Euler {
                x_position: e.x,
                y_position: e.y,
                z_position: e.z,
            },
        };
        let omega = state.pole.angular_velocity;
        let pole = PoleFeatures {
            orientation,
            x_velocity: omega.x,
            y_velocity: omega.y,
            z_velocity: omega.z,
        };

        let blocks = state
            .blocks
            .iter()
            .map(|block| BlockFeatures {
                id: block.id.map(BodyId::raw),
                x_position: block.position.x,
                y_position: block.position.y,
                z_position: block.position.z,
                x_velocity: block.velocity.x,
                y_velocity: block.velocity.y,
                z_velocity: block.velocity.z,
            })
            .collect();

        Self {
            cart,
            pole,
            blocks,
            walls: state.walls.map(|walls| walls.map(|corner| corner.to_array())),
        }
    }
}

impl From<WorldState> for FeatureVector {
    fn from(state: WorldState) -> Self {
        Self::from(&state)
    }
}

impl From<&FeatureVector> for WorldState {
    fn from(features: &FeatureVector) -> Self {
        Self {
            cart: CartState {
                position: features.cart_position(),
                velocity: features.cart_velocity(),
            },
            pole: PoleState {
                orientation: features.pole.orientation(),
                angular_velocity: DVec3::new(
                    features.pole.x_velocity,
                    features.pole.y_velocity,
                    features.pole.z_velocity,
                ),
            },
            blocks: features
                .blocks
                .iter()
                .map(|block| BlockState {
                    id: block.id.map(BodyId::from_raw),
                    position: block.position(),
                    velocity: block.velocity(),
                })
                .collect(),
            walls: features.wall_corners(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = r#"{
        "cart": {"x_position": 1.5, "y_position": -0.25, "z_position": 0,
                 "x_velocity": 0.5, "y_velocity": 0, "z_velocity": 0},
        "pole": {"x_quaternion": 0.004, "y_quaternion": -0.007, "z_quaternion": 0.001,
                 "w_quaternion": 1, "x_velocity": 0.002, "y_velocity": -0.003},
        "blocks": [{"id": 2, "x_position": 3, "y_position": 2, "z_position": 6,
                    "x_velocity": 7, "y_velocity": -8, "z_velocity": 6.5}],
        "walls": [[-5, -5, 0], [5, -5, 0], [5, 5, 0], [-5, 5, 0],
                  [-5, -5, 10], [5, -5, 10], [5, 5, 10], [-5, 5, 10]]
    }"#;

    #[test]
    fn parses_quaternion_form_with_integer_values() {
        let features = FeatureVector::from_json(START).unwrap();
        assert_eq!(features.cart_position(), DVec3::new(1.5, -0.25, 0.0));
        assert_eq!(features.pole_quaternion(), DQuat::from_xyzw(0.004, -0.007, 0.001, 1.0));
        assert_eq!(features.pole.z_velocity, 0.0);
        assert_eq!(features.blocks[0].id, Some(2));
        assert_eq!(features.wall_corners().unwrap()[6], DVec3::new(5.0, 5.0, 10.0));
    }

    #[test]
    fn parses_euler_form() {
        let json = r#"{
            "cart": {"x_position": 0, "y_position": 0, "z_position": 0,
                     "x_velocity": 0, "y_velocity": 0, "z_velocity": 0},
            "pole": {"x_position": 3.0, "y_position": -2.0, "z_position": 0,
                     "x_velocity": 0, "y_velocity": 0, "z_velocity": 0.5},
            "blocks": []
        }"#;
        let features = FeatureVector::from_json(json).unwrap();
        assert_eq!(features.pole.orientation(), PoleOrientation::Euler(DVec3::new(3.0, -2.0, 0.0)));
        assert_eq!(features.pole.z_velocity, 0.5);
        assert!(features.walls.is_none());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let json = r#"{"cart": {"x_position": 0}, "pole": {}, "blocks": []}"#;
        assert!(matches!(FeatureVector::from_json(json), Err(EnvError::FeatureVector(_))));
    }

    #[test]
    fn wrong_wall_count_is_rejected() {
        let json = START.replace("[-5, 5, 10]]", "[-5, 5, 10], [0, 0, 0]]");
        assert!(FeatureVector::from_json(&json).is_err());
    }

    #[test]
    fn survives_state_conversion() {
        let features = FeatureVector::from_json(START).unwrap();
        let state = WorldState::from(&features);
        assert_eq!(state.blocks[0].id, Some(BodyId::from_raw(2)));
        let back = FeatureVector::from(&state);
        assert_eq!(back, features);

        let json = back.to_json().unwrap();
        assert!(json.contains("\"w_quaternion\":1.0"));
        assert_eq!(FeatureVector::from_json(&json).unwrap(), features);
    }
}
