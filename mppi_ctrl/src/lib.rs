//! # MPPI controller library.
//!
//! A sampling-based model-predictive controller for mobile robots. Each
//! control cycle the optimizer perturbs a nominal control sequence with
//! normally-distributed noise, rolls the perturbed controls out through a
//! kinematic motion model, scores the resulting trajectory batch with a
//! pipeline of weighted critics, and collapses the batch back into a single
//! control sequence with a softmax-weighted average. The first step of the
//! resulting sequence is emitted as the velocity command for the cycle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Batched control and trajectory storage used throughout the optimisation
pub mod batch;

/// Critic pipeline - composes pluggable cost functions into one cost vector
pub mod critics;

/// Motion models - batched kinematic rollout for the supported drive types
pub mod motion_model;

/// Noise bank - supplies perturbation batches with minimal cycle latency
pub mod noise_bank;

/// Optimizer - the per-cycle iteration loop and weighted update rule
pub mod optimizer;

/// Pose, velocity and reference path types shared with the host
pub mod path;
