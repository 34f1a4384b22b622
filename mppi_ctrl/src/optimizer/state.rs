//! Implementations for the Optimizer state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{info, warn};
use ndarray::Array1;

// Internal
use super::{OptimizerError, OptimizerParams, OptimizerState};
use crate::batch::{ControlBatch, ControlSequence, OptimizedTrajectory, TrajectoryBatch};
use crate::critics::{CriticPipeline, EvalContext};
use crate::motion_model::{self, MotionModel};
use crate::noise_bank::{NoiseBank, SamplingStd};
use crate::path::{Pose, RefPath, Velocity};
use util::maths;
use util::params::ParamSource;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The sampling-based model-predictive optimizer.
///
/// Owns the nominal control sequence and all batch storage, which is
/// allocated once at configuration and reused every cycle.
pub struct Optimizer {
    params: OptimizerParams,
    state: OptimizerState,

    /// Set when a reconfiguration changed the problem dimensions. Evaluation
    /// is rejected until the host resets.
    needs_reset: bool,

    /// True if the configured motion model supports lateral motion.
    holonomic: bool,

    sequence: ControlSequence,

    /// The most recent nominal sequence that rolled out to finite
    /// trajectories, restored when a rollout goes non-finite.
    last_valid_sequence: ControlSequence,

    controls: ControlBatch,
    trajectories: TrajectoryBatch,
    costs: Array1<f32>,

    noise_bank: Option<NoiseBank>,
    pipeline: Option<CriticPipeline>,
    model: Option<Box<dyn MotionModel>>,

    status: StatusReport,
}

/// The outputs of one control cycle.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    /// The velocity command for this cycle, the first step of the optimised
    /// sequence.
    pub command: Velocity,

    /// The predicted poses of the optimised sequence, for host
    /// introspection and visualisation.
    pub trajectory: OptimizedTrajectory,
}

/// Counters for the degraded-operation paths, for host diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusReport {
    /// Cycles in which the rollout produced non-finite poses and the last
    /// valid sequence was restored.
    pub nonfinite_trajectories: u32,

    /// Iterations in which the critic pipeline produced non-finite costs.
    pub nonfinite_costs: u32,

    /// Iterations in which the softmax weights were replaced with uniform
    /// weights.
    pub uniform_weight_fallbacks: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    /// Create a new unconfigured optimizer.
    pub fn new() -> Self {
        Self {
            params: OptimizerParams::default(),
            state: OptimizerState::Unconfigured,
            needs_reset: false,
            holonomic: false,
            sequence: ControlSequence::default(),
            last_valid_sequence: ControlSequence::default(),
            controls: ControlBatch::default(),
            trajectories: TrajectoryBatch::default(),
            costs: Array1::zeros(0),
            noise_bank: None,
            pipeline: None,
            model: None,
            status: StatusReport::default(),
        }
    }

    /// Configure the optimizer from the given parameter source.
    ///
    /// Loads the `Optimizer` section, resolves the motion model and critics
    /// by name, builds the noise bank and allocates all batch storage. May be
    /// called again to reconfigure from scratch.
    pub fn configure(&mut self, source: &ParamSource) -> Result<(), OptimizerError> {
        let params: OptimizerParams = source.section("Optimizer")?;
        params.validate()?;

        let model = motion_model::model_for_name(&params.motion_model, source)?;
        let holonomic = model.is_holonomic();
        let pipeline = CriticPipeline::from_names(&params.critics, source)?;

        // Stop any previous bank's worker before replacing it
        if let Some(bank) = self.noise_bank.as_mut() {
            bank.shutdown();
        }
        let bank = NoiseBank::new(
            &params.noise,
            params.sampling_std,
            params.batch_size,
            params.time_steps,
            holonomic,
        )?;

        self.sequence.reset(params.time_steps);
        self.last_valid_sequence.reset(params.time_steps);
        self.controls.reset(params.batch_size, params.time_steps);
        self.trajectories.reset(params.batch_size, params.time_steps);
        self.costs = Array1::zeros(params.batch_size);

        info!(
            "Optimizer configured: {} trajectories over {} steps of {} s, model {}, {} critics",
            params.batch_size,
            params.time_steps,
            params.model_dt,
            params.motion_model,
            pipeline.len()
        );

        self.noise_bank = Some(bank);
        self.pipeline = Some(pipeline);
        self.model = Some(model);
        self.holonomic = holonomic;
        self.params = params;
        self.needs_reset = false;
        self.status = StatusReport::default();
        self.state = OptimizerState::Idle;

        Ok(())
    }

    /// Run one control cycle.
    ///
    /// Each iteration perturbs the nominal sequence, clamps the perturbed
    /// controls to the velocity bounds and the motion model's constraints,
    /// rolls them out from the given pose, scores the batch, and collapses
    /// it back into the nominal sequence with a softmax-weighted average.
    /// After the final iteration the first step of the sequence is emitted
    /// as the command and the sequence is shifted as a warm start.
    pub fn evaluate(
        &mut self,
        pose: &Pose,
        velocity: &Velocity,
        path: &RefPath,
    ) -> Result<CycleOutput, OptimizerError> {
        if self.state == OptimizerState::Unconfigured {
            return Err(OptimizerError::NotConfigured);
        }
        if self.needs_reset {
            return Err(OptimizerError::ResetRequired);
        }
        if path.is_empty() {
            return Err(OptimizerError::EmptyPath);
        }

        self.state = OptimizerState::Iterating;

        for _ in 0..self.params.iteration_count {
            {
                let bank = match self.noise_bank.as_ref() {
                    Some(bank) => bank,
                    None => return Err(OptimizerError::NotConfigured),
                };
                bank.apply_noised_controls(&self.sequence, &mut self.controls)?;
                bank.signal_regenerate()?;
            }

            clamp_controls(&mut self.controls, &self.params, self.holonomic);
            if let Some(model) = self.model.as_ref() {
                model.apply_constraints(&mut self.controls);
            }

            motion_model::integrate_trajectories(
                &self.controls,
                pose,
                self.params.model_dt,
                self.holonomic,
                &mut self.trajectories,
            );

            if !self.trajectories.is_finite() {
                self.status.nonfinite_trajectories += 1;
                warn!("Non-finite rollout, restoring the last valid control sequence");
                self.sequence = self.last_valid_sequence.clone();
                break;
            }

            self.costs.fill(0.0);
            if let Some(pipeline) = self.pipeline.as_ref() {
                let mut ctx = EvalContext {
                    pose,
                    velocity,
                    path,
                    trajectories: &self.trajectories,
                    controls: &self.controls,
                    model_dt: self.params.model_dt,
                    costs: &mut self.costs,
                };
                pipeline.score_all(&mut ctx);
            }

            self.update_control_sequence();
        }

        clamp_sequence(&mut self.sequence, &self.params, self.holonomic);

        if self.sequence.is_finite() {
            self.last_valid_sequence = self.sequence.clone();
        } else {
            warn!("Non-finite nominal sequence, restoring the last valid one");
            self.sequence = self.last_valid_sequence.clone();
        }

        self.state = OptimizerState::Emitting;

        let command = Velocity {
            linear_x_ms: self.sequence.vx[0] as f64,
            linear_y_ms: if self.holonomic {
                self.sequence.vy[0] as f64
            } else {
                0.0
            },
            angular_z_rads: self.sequence.wz[0] as f64,
        };

        let trajectory = motion_model::integrate_sequence(
            &self.sequence,
            pose,
            self.params.model_dt,
            self.holonomic,
        );

        self.sequence.shift();
        self.state = OptimizerState::Idle;

        Ok(CycleOutput {
            command,
            trajectory,
        })
    }

    /// Apply new parameters without a full reconfiguration.
    ///
    /// Changes to the problem dimensions, the platform holonomy or the
    /// sampling standard deviations require a [`Optimizer::reset`] before
    /// the next evaluation; everything else takes effect immediately. A
    /// change to the noise configuration rebuilds the noise bank.
    pub fn update_settings(&mut self, source: &ParamSource) -> Result<(), OptimizerError> {
        if self.state == OptimizerState::Unconfigured {
            return Err(OptimizerError::NotConfigured);
        }

        let params: OptimizerParams = source.section("Optimizer")?;
        params.validate()?;

        let model = motion_model::model_for_name(&params.motion_model, source)?;
        let holonomic = model.is_holonomic();
        let pipeline = CriticPipeline::from_names(&params.critics, source)?;

        if params.batch_size != self.params.batch_size
            || params.time_steps != self.params.time_steps
            || params.sampling_std != self.params.sampling_std
            || holonomic != self.holonomic
        {
            self.needs_reset = true;
        }

        if params.noise != self.params.noise {
            if let Some(bank) = self.noise_bank.as_mut() {
                bank.shutdown();
            }
            self.noise_bank = Some(NoiseBank::new(
                &params.noise,
                params.sampling_std,
                params.batch_size,
                params.time_steps,
                holonomic,
            )?);
        }

        self.model = Some(model);
        self.pipeline = Some(pipeline);
        self.holonomic = holonomic;
        self.params = params;

        Ok(())
    }

    /// Reset the optimizer to a zeroed nominal sequence.
    ///
    /// Reallocates all batch storage at the current dimensions and resets the
    /// noise bank with the sampling standard deviations scaled by
    /// `reset_std_scale`. Clears any pending reset requirement.
    pub fn reset(&mut self) -> Result<(), OptimizerError> {
        if self.state == OptimizerState::Unconfigured {
            return Err(OptimizerError::NotConfigured);
        }

        self.sequence.reset(self.params.time_steps);
        self.last_valid_sequence.reset(self.params.time_steps);
        self.controls
            .reset(self.params.batch_size, self.params.time_steps);
        self.trajectories
            .reset(self.params.batch_size, self.params.time_steps);
        self.costs = Array1::zeros(self.params.batch_size);

        let scale = self.params.reset_std_scale;
        let std = SamplingStd {
            vx: self.params.sampling_std.vx * scale,
            vy: self.params.sampling_std.vy * scale,
            wz: self.params.sampling_std.wz * scale,
        };
        if let Some(bank) = self.noise_bank.as_mut() {
            bank.reset(
                std,
                self.params.batch_size,
                self.params.time_steps,
                self.holonomic,
            )?;
        }

        self.needs_reset = false;
        self.state = OptimizerState::Idle;

        info!("Optimizer reset");
        Ok(())
    }

    /// Stop the noise bank's worker and return to the unconfigured state.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(bank) = self.noise_bank.as_mut() {
            bank.shutdown();
        }
        self.state = OptimizerState::Unconfigured;
    }

    /// The current lifecycle state.
    pub fn state(&self) -> OptimizerState {
        self.state
    }

    /// The degraded-operation counters since the last configuration.
    pub fn status(&self) -> StatusReport {
        self.status
    }

    /// The current nominal control sequence.
    pub fn nominal_sequence(&self) -> &ControlSequence {
        &self.sequence
    }

    /// Collapse the scored control batch into the nominal sequence.
    ///
    /// Weights are a min-subtracted softmax over the negated costs so the
    /// cheapest trajectory always has the largest weight and the exponent is
    /// never positive. Non-finite costs or a degenerate normaliser fall back
    /// to uniform weights rather than failing the cycle.
    fn update_control_sequence(&mut self) {
        let n = self.costs.len();
        if n == 0 {
            return;
        }
        let uniform = 1.0 / n as f32;

        let weights = if self.costs.iter().all(|c| c.is_finite()) {
            let min_cost = self.costs.fold(f32::INFINITY, |min, &c| min.min(c));
            let mut weights = self
                .costs
                .mapv(|c| (-(c - min_cost) / self.params.temperature).exp());

            let norm = weights.sum();
            if norm.is_finite() && norm > f32::EPSILON {
                weights /= norm;
                weights
            } else {
                self.status.uniform_weight_fallbacks += 1;
                warn!("Degenerate weight normaliser, using uniform weights");
                Array1::from_elem(n, uniform)
            }
        } else {
            self.status.nonfinite_costs += 1;
            self.status.uniform_weight_fallbacks += 1;
            warn!("Non-finite trajectory costs, using uniform weights");
            Array1::from_elem(n, uniform)
        };

        self.sequence.vx = self.controls.cvx.t().dot(&weights);
        self.sequence.wz = self.controls.cwz.t().dot(&weights);
        if self.holonomic {
            self.sequence.vy = self.controls.cvy.t().dot(&weights);
        }
    }
}

impl Drop for Optimizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Clamp the perturbed control batch to the velocity bounds.
fn clamp_controls(controls: &mut ControlBatch, params: &OptimizerParams, holonomic: bool) {
    let bounds = params.bounds;

    controls
        .cvx
        .mapv_inplace(|v| maths::clamp(&v, &bounds.vx_min, &bounds.vx_max));
    controls
        .cwz
        .mapv_inplace(|v| maths::clamp(&v, &-bounds.wz_max, &bounds.wz_max));
    if holonomic {
        controls
            .cvy
            .mapv_inplace(|v| maths::clamp(&v, &-bounds.vy_max, &bounds.vy_max));
    }
}

/// Clamp the nominal sequence to the velocity bounds.
fn clamp_sequence(sequence: &mut ControlSequence, params: &OptimizerParams, holonomic: bool) {
    let bounds = params.bounds;

    sequence
        .vx
        .mapv_inplace(|v| maths::clamp(&v, &bounds.vx_min, &bounds.vx_max));
    sequence
        .wz
        .mapv_inplace(|v| maths::clamp(&v, &-bounds.wz_max, &bounds.wz_max));
    if holonomic {
        sequence
            .vy
            .mapv_inplace(|v| maths::clamp(&v, &-bounds.vy_max, &bounds.vy_max));
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
