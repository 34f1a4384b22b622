//! # Motion model module
//!
//! A motion model provides the platform-specific pieces of the rollout: a
//! holonomy query, and a constraint pass that clamps sampled controls to the
//! platform's physical envelope. Constraints are always applied to controls
//! *before* integration, never to poses afterwards, so no emitted trajectory
//! can silently violate a physical limit.
//!
//! The forward integration itself is shared between models: batched
//! first-order integration of the unicycle kinematics at a fixed step, with
//! an optional lateral velocity term for holonomic platforms.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod ackermann;
mod diff_drive;
mod omni;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use ndarray::{s, Array2, Axis};

// Internal
pub use ackermann::{Ackermann, AckermannParams};
pub use diff_drive::DiffDrive;
pub use omni::Omni;

use crate::batch::{ControlBatch, ControlSequence, OptimizedTrajectory, TrajectoryBatch};
use crate::path::Pose;
use util::params::{self, ParamSource};

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur while building motion models.
#[derive(Debug, thiserror::Error)]
pub enum MotionModelError {
    #[error("Unknown motion model: {0}")]
    UnknownModel(String),

    #[error("Could not load parameters for motion model {0}: {1}")]
    ParamLoadError(String, params::LoadError),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Platform-specific rollout behaviour.
pub trait MotionModel: Send {
    /// The name this model is registered and configured under.
    fn name(&self) -> &'static str;

    /// True if the platform supports lateral (linear Y) motion.
    fn is_holonomic(&self) -> bool;

    /// Clamp sampled controls to the platform's physical envelope. Runs
    /// after velocity-bound clamping and before integration.
    fn apply_constraints(&self, _controls: &mut ControlBatch) {}
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The motion model registry: map a configured name to a model instance.
pub fn model_for_name(
    name: &str,
    source: &ParamSource,
) -> Result<Box<dyn MotionModel>, MotionModelError> {
    match name {
        "DiffDrive" => Ok(Box::new(DiffDrive)),
        "Omni" => Ok(Box::new(Omni)),
        "Ackermann" => Ok(Box::new(Ackermann::from_source(source)?)),
        _ => Err(MotionModelError::UnknownModel(name.into())),
    }
}

/// Roll the whole control batch out into predicted poses.
///
/// Batched first-order integration: the heading is the cumulative sum of the
/// angular controls, and each interval's displacement uses the heading the
/// trajectory entered the interval with. The lateral velocity term is only
/// consumed for holonomic platforms.
pub fn integrate_trajectories(
    controls: &ControlBatch,
    pose: &Pose,
    model_dt: f32,
    holonomic: bool,
    trajectories: &mut TrajectoryBatch,
) {
    let (batch_size, time_steps) = controls.cvx.dim();
    if time_steps == 0 {
        return;
    }

    let yaw0 = pose.heading_rad as f32;

    // heading_k = yaw0 + sum_{j <= k} wz_j * dt
    trajectories.heading.assign(&controls.cwz);
    trajectories.heading *= model_dt;
    trajectories
        .heading
        .accumulate_axis_inplace(Axis(1), |&prev, cur| *cur += prev);
    trajectories.heading += yaw0;

    // The heading entering each interval: yaw0 for the first, then the
    // previous interval's result
    let mut cos_h: Array2<f32> = Array2::zeros((batch_size, time_steps));
    let mut sin_h: Array2<f32> = Array2::zeros((batch_size, time_steps));
    cos_h.column_mut(0).fill(yaw0.cos());
    sin_h.column_mut(0).fill(yaw0.sin());
    if time_steps > 1 {
        let head_prev = trajectories.heading.slice(s![.., ..time_steps - 1]);
        cos_h
            .slice_mut(s![.., 1..])
            .assign(&head_prev.mapv(f32::cos));
        sin_h
            .slice_mut(s![.., 1..])
            .assign(&head_prev.mapv(f32::sin));
    }

    // Per-interval displacements, rotated into the controller frame
    let mut dx = &controls.cvx * &cos_h;
    let mut dy = &controls.cvx * &sin_h;
    if holonomic {
        dx -= &(&controls.cvy * &sin_h);
        dy += &(&controls.cvy * &cos_h);
    }
    dx *= model_dt;
    dy *= model_dt;

    dx.accumulate_axis_inplace(Axis(1), |&prev, cur| *cur += prev);
    dy.accumulate_axis_inplace(Axis(1), |&prev, cur| *cur += prev);

    trajectories.x.assign(&dx);
    trajectories.x += pose.position_m.x as f32;
    trajectories.y.assign(&dy);
    trajectories.y += pose.position_m.y as f32;
}

/// Integrate a single nominal control sequence into the optimized trajectory
/// retained for host introspection.
pub fn integrate_sequence(
    sequence: &ControlSequence,
    pose: &Pose,
    model_dt: f32,
    holonomic: bool,
) -> OptimizedTrajectory {
    let time_steps = sequence.vx.len();
    let mut out = OptimizedTrajectory {
        x: ndarray::Array1::zeros(time_steps),
        y: ndarray::Array1::zeros(time_steps),
        heading: ndarray::Array1::zeros(time_steps),
    };

    let mut x = pose.position_m.x as f32;
    let mut y = pose.position_m.y as f32;
    let mut heading = pose.heading_rad as f32;

    for k in 0..time_steps {
        let vx = sequence.vx[k];
        let vy = if holonomic { sequence.vy[k] } else { 0.0 };
        let (sin, cos) = heading.sin_cos();

        x += (vx * cos - vy * sin) * model_dt;
        y += (vx * sin + vy * cos) * model_dt;
        heading += sequence.wz[k] * model_dt;

        out.x[k] = x;
        out.y[k] = y;
        out.heading[k] = heading;
    }

    out
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
