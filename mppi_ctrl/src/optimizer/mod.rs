//! # Optimizer module
//!
//! The optimizer owns the per-cycle loop: perturb the nominal control
//! sequence with a batch of noise, roll the perturbed controls out through
//! the motion model, score the trajectory batch with the critic pipeline,
//! and collapse the batch back into a single sequence with a
//! softmax-weighted average. The first step of the result is emitted as the
//! cycle's velocity command and the sequence is shifted one step forward as
//! a warm start for the next cycle.
//!
//! The cycle degrades rather than fails: a non-finite rollout restores the
//! last valid sequence, and non-finite or degenerate costs fall back to
//! uniform weights. Hard errors are reserved for misuse (evaluating before
//! configuration, or after a reconfiguration that requires a reset) and for
//! an empty reference path.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// Internal
pub use params::{Bounds, OptimizerParams};
pub use state::{CycleOutput, Optimizer, StatusReport};

use crate::critics::CriticError;
use crate::motion_model::MotionModelError;
use crate::noise_bank::NoiseBankError;
use util::params::LoadError;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Lifecycle state of the optimizer, visible to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerState {
    /// Created but not yet configured. Evaluation is rejected.
    Unconfigured,

    /// Configured and waiting for the next cycle.
    Idle,

    /// Inside the iteration loop of a cycle.
    Iterating,

    /// Collapsing the final sequence into the cycle's outputs.
    Emitting,
}

/// Possible errors that can occur during optimizer operation.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("The optimizer has not been configured")]
    NotConfigured,

    #[error("A reconfiguration changed the problem dimensions, reset required")]
    ResetRequired,

    #[error("Cannot evaluate against an empty reference path")]
    EmptyPath,

    #[error("Invalid optimizer parameter: {0}")]
    InvalidParam(String),

    #[error("Could not load optimizer parameters: {0}")]
    ParamLoadError(#[from] LoadError),

    #[error(transparent)]
    CriticError(#[from] CriticError),

    #[error(transparent)]
    MotionModelError(#[from] MotionModelError),

    #[error(transparent)]
    NoiseBankError(#[from] NoiseBankError),
}
