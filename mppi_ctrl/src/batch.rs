//! # Batched control and trajectory storage
//!
//! All per-batch data is stored as `[batch_size, time_steps]` single
//! precision arrays, one per control or pose dimension, so that every
//! optimisation step can be written as a whole-batch array operation. Batch
//! sizes run into the thousands and the cycle budget is tens of
//! milliseconds, so per-trajectory loops are avoided throughout.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use ndarray::{Array1, Array2};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The nominal control sequence over the planning horizon.
///
/// Owned exclusively by the optimizer: re-optimised in place during each
/// cycle's iterations and shifted one step forward at the end of the cycle as
/// a warm start for the next one.
#[derive(Debug, Clone, Default)]
pub struct ControlSequence {
    /// Linear X velocity controls, in meters/second.
    pub vx: Array1<f32>,

    /// Linear Y velocity controls, in meters/second. Only populated for
    /// holonomic platforms.
    pub vy: Array1<f32>,

    /// Angular Z velocity controls, in radians/second.
    pub wz: Array1<f32>,
}

/// The batch of perturbed control sequences for one iteration.
#[derive(Debug, Clone, Default)]
pub struct ControlBatch {
    /// Perturbed linear X controls, shape `[batch_size, time_steps]`.
    pub cvx: Array2<f32>,

    /// Perturbed linear Y controls. Zero for non-holonomic platforms and must
    /// not be consumed by them.
    pub cvy: Array2<f32>,

    /// Perturbed angular Z controls.
    pub cwz: Array2<f32>,
}

/// The rolled-out predicted poses for every sampled control sequence.
///
/// Written by the motion model rollout, read-only to the critic pipeline.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryBatch {
    /// X positions, shape `[batch_size, time_steps]`, in meters.
    pub x: Array2<f32>,

    /// Y positions, in meters.
    pub y: Array2<f32>,

    /// Headings, in radians.
    pub heading: Array2<f32>,
}

/// The predicted poses of the final nominal control sequence, retained for
/// host introspection after each cycle.
#[derive(Debug, Clone, Default)]
pub struct OptimizedTrajectory {
    pub x: Array1<f32>,
    pub y: Array1<f32>,
    pub heading: Array1<f32>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ControlSequence {
    /// Reallocate all axes to zeros over the given horizon.
    pub fn reset(&mut self, time_steps: usize) {
        self.vx = Array1::zeros(time_steps);
        self.vy = Array1::zeros(time_steps);
        self.wz = Array1::zeros(time_steps);
    }

    /// Shift the sequence one step forward, duplicating the final entry.
    ///
    /// Called at the end of every cycle so the next cycle starts from the
    /// remainder of this cycle's plan rather than from scratch.
    pub fn shift(&mut self) {
        shift_axis(&mut self.vx);
        shift_axis(&mut self.vy);
        shift_axis(&mut self.wz);
    }

    /// True if every element of every axis is finite.
    pub fn is_finite(&self) -> bool {
        self.vx.iter().all(|v| v.is_finite())
            && self.vy.iter().all(|v| v.is_finite())
            && self.wz.iter().all(|v| v.is_finite())
    }
}

impl ControlBatch {
    /// Reallocate all axes to zeros with the given shape.
    pub fn reset(&mut self, batch_size: usize, time_steps: usize) {
        self.cvx = Array2::zeros((batch_size, time_steps));
        self.cvy = Array2::zeros((batch_size, time_steps));
        self.cwz = Array2::zeros((batch_size, time_steps));
    }
}

impl TrajectoryBatch {
    /// Reallocate all axes to zeros with the given shape.
    pub fn reset(&mut self, batch_size: usize, time_steps: usize) {
        self.x = Array2::zeros((batch_size, time_steps));
        self.y = Array2::zeros((batch_size, time_steps));
        self.heading = Array2::zeros((batch_size, time_steps));
    }

    /// True if every predicted pose element is finite.
    pub fn is_finite(&self) -> bool {
        self.x.iter().all(|v| v.is_finite())
            && self.y.iter().all(|v| v.is_finite())
            && self.heading.iter().all(|v| v.is_finite())
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Roll a sequence axis one step left, duplicating the final entry.
fn shift_axis(axis: &mut Array1<f32>) {
    let len = axis.len();
    if len < 2 {
        return;
    }

    for i in 0..(len - 1) {
        axis[i] = axis[i + 1];
    }
    axis[len - 1] = axis[len - 2];
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
