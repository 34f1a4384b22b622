//! Parameters structure for the optimizer

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::OptimizerError;
use crate::noise_bank::{NoiseParams, SamplingStd};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the optimizer, loaded from the `Optimizer` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizerParams {
    /// Number of control sequences sampled per iteration.
    pub batch_size: usize,

    /// Planning horizon, in model integration steps.
    pub time_steps: usize,

    /// Model integration step.
    ///
    /// Units: seconds
    pub model_dt: f32,

    /// Number of optimisation iterations per control cycle.
    pub iteration_count: usize,

    /// Softmax temperature of the weighted update. Lower values concentrate
    /// weight on the cheapest trajectories.
    pub temperature: f32,

    /// Velocity bounds applied to every sampled control before integration.
    pub bounds: Bounds,

    /// Per-dimension sampling standard deviations.
    pub sampling_std: SamplingStd,

    /// Factor applied to the sampling standard deviations when the optimizer
    /// is reset, allowing a broader search after losing a valid plan.
    pub reset_std_scale: f32,

    /// Name of the motion model to roll trajectories out with.
    pub motion_model: String,

    /// Names of the critics to score trajectories with, in execution order.
    pub critics: Vec<String>,

    /// Noise bank configuration.
    pub noise: NoiseParams,
}

/// Velocity bounds for the sampled controls.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Bounds {
    /// Maximum linear X velocity, in meters/second.
    pub vx_max: f32,

    /// Minimum linear X velocity, in meters/second. Negative values permit
    /// reversing.
    pub vx_min: f32,

    /// Maximum absolute linear Y velocity, in meters/second. Only consumed
    /// for holonomic platforms.
    pub vy_max: f32,

    /// Maximum absolute angular Z velocity, in radians/second.
    pub wz_max: f32,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            time_steps: 56,
            model_dt: 0.05,
            iteration_count: 1,
            temperature: 0.3,
            bounds: Bounds::default(),
            sampling_std: SamplingStd::default(),
            reset_std_scale: 1.0,
            motion_model: "DiffDrive".into(),
            critics: vec![
                "GoalCritic".into(),
                "GoalAngleCritic".into(),
                "PreferForwardCritic".into(),
            ],
            noise: NoiseParams::default(),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            vx_max: 0.5,
            vx_min: -0.35,
            vy_max: 0.5,
            wz_max: 1.9,
        }
    }
}

impl OptimizerParams {
    /// Check the parameters describe a well-posed optimisation problem.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.batch_size == 0 {
            return Err(OptimizerError::InvalidParam(
                "batch_size must be non-zero".into(),
            ));
        }
        if self.time_steps == 0 {
            return Err(OptimizerError::InvalidParam(
                "time_steps must be non-zero".into(),
            ));
        }
        if !self.model_dt.is_finite() || self.model_dt <= 0.0 {
            return Err(OptimizerError::InvalidParam(
                "model_dt must be finite and positive".into(),
            ));
        }
        if self.iteration_count == 0 {
            return Err(OptimizerError::InvalidParam(
                "iteration_count must be non-zero".into(),
            ));
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(OptimizerError::InvalidParam(
                "temperature must be finite and positive".into(),
            ));
        }
        if self.bounds.vx_max < self.bounds.vx_min {
            return Err(OptimizerError::InvalidParam(
                "bounds.vx_max must not be below bounds.vx_min".into(),
            ));
        }
        if self.bounds.vy_max < 0.0 || self.bounds.wz_max < 0.0 {
            return Err(OptimizerError::InvalidParam(
                "bounds.vy_max and bounds.wz_max must be non-negative".into(),
            ));
        }
        if !self.reset_std_scale.is_finite() || self.reset_std_scale <= 0.0 {
            return Err(OptimizerError::InvalidParam(
                "reset_std_scale must be finite and positive".into(),
            ));
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use util::params::ParamSource;

    #[test]
    fn test_defaults_are_valid() {
        OptimizerParams::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_temperature() {
        let params = OptimizerParams {
            temperature: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(OptimizerError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let params = OptimizerParams {
            bounds: Bounds {
                vx_max: -1.0,
                vx_min: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(OptimizerError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_loads_nested_sections() {
        let source = ParamSource::from_str(
            r#"
            [Optimizer]
            batch_size = 64
            time_steps = 8
            critics = ["GoalCritic"]

            [Optimizer.bounds]
            vx_min = 0.0

            [Optimizer.noise]
            seed = 42
            "#,
        )
        .unwrap();

        let params: OptimizerParams = source.section("Optimizer").unwrap();
        assert_eq!(params.batch_size, 64);
        assert_eq!(params.time_steps, 8);
        assert_eq!(params.critics, vec!["GoalCritic".to_string()]);
        assert_eq!(params.bounds.vx_min, 0.0);
        assert_eq!(params.bounds.vx_max, 0.5);
        assert_eq!(params.noise.seed, 42);
        // Untouched sections keep their defaults
        assert_eq!(params.model_dt, 0.05);
    }
}
