//! # Pose, velocity and reference path types
//!
//! These are the types crossing the boundary between the host (which works in
//! double precision) and the batched optimisation core (which works in single
//! precision). The reference path is stored as parallel coordinate arrays so
//! critics can score whole trajectory batches against it without per-point
//! iteration.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The current pose of the robot in the controller's frame.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the controller frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Heading (angle to the positive X axis of the controller frame).
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// A body-frame velocity, used both for the measured robot velocity fed into
/// a cycle and for the command emitted by it.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Linear velocity along the body X axis, in meters/second.
    pub linear_x_ms: f64,

    /// Linear velocity along the body Y axis, in meters/second. Only non-zero
    /// for holonomic platforms.
    pub linear_y_ms: f64,

    /// Angular velocity about the body Z axis, in radians/second.
    pub angular_z_rads: f64,
}

/// The reference path to follow, expressed in the controller's frame.
#[derive(Debug, Clone)]
pub struct RefPath {
    /// X coordinates of the path points, in meters.
    pub x: Array1<f32>,

    /// Y coordinates of the path points, in meters.
    pub y: Array1<f32>,

    /// Headings of the path points, in radians.
    pub heading: Array1<f32>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad,
        }
    }
}

impl RefPath {
    /// Build a path from `(x_m, y_m, heading_rad)` waypoints.
    pub fn from_waypoints(waypoints: &[(f64, f64, f64)]) -> Self {
        Self {
            x: waypoints.iter().map(|w| w.0 as f32).collect(),
            y: waypoints.iter().map(|w| w.1 as f32).collect(),
            heading: waypoints.iter().map(|w| w.2 as f32).collect(),
        }
    }

    /// Number of points in the path.
    pub fn num_points(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The final path point, which the goal-based critics score against.
    ///
    /// Returns `None` for an empty path.
    pub fn goal(&self) -> Option<(f32, f32, f32)> {
        if self.is_empty() {
            return None;
        }

        let goal_idx = self.num_points() - 1;
        Some((self.x[goal_idx], self.y[goal_idx], self.heading[goal_idx]))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ref_path_goal() {
        let path = RefPath::from_waypoints(&[(0.0, 0.0, 0.0), (1.0, 2.0, 0.5)]);

        assert_eq!(path.num_points(), 2);
        assert_eq!(path.goal(), Some((1.0, 2.0, 0.5)));
    }

    #[test]
    fn test_empty_path() {
        let path = RefPath::from_waypoints(&[]);

        assert!(path.is_empty());
        assert_eq!(path.goal(), None);
    }

    #[test]
    fn test_pose_serde_roundtrip() {
        let pose = Pose::new(0.5, -1.25, 0.3);

        let toml_str = toml::to_string(&pose).unwrap();
        let restored: Pose = toml::from_str(&toml_str).unwrap();

        assert_eq!(restored.position_m, pose.position_m);
        assert_eq!(restored.heading_rad, pose.heading_rad);
    }
}
