//! # Critic pipeline module
//!
//! A critic is an independently-pluggable cost function. Each one consumes a
//! shared read-only evaluation context and adds a weighted, optionally
//! power-raised per-trajectory cost into the shared cost vector. Critics are
//! resolved by name from a registry at configuration time and run in the
//! configured order. Because they only ever add to the accumulator the
//! mathematical result is order-independent, but the order is kept
//! deterministic for reproducibility and so that cheap early-exit critics
//! can be placed first.
//!
//! Critics gate themselves with a cheap precondition (typically squared
//! distance to the goal compared against a threshold, avoiding the square
//! root) and never fail for data-validity reasons on the hot path; only
//! `initialize` can fail, for configuration errors.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod goal_angle_critic;
mod goal_critic;
mod prefer_forward_critic;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use ndarray::{Array1, Zip};

// Internal
pub use goal_angle_critic::GoalAngleCritic;
pub use goal_critic::GoalCritic;
pub use prefer_forward_critic::PreferForwardCritic;

use crate::batch::{ControlBatch, TrajectoryBatch};
use crate::path::{Pose, RefPath, Velocity};
use util::params::{self, ParamSource};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The shared per-iteration evaluation context.
///
/// Constructed once per iteration by the optimizer and passed to every
/// critic. Critics must not mutate anything except the cost vector.
pub struct EvalContext<'a> {
    /// The current robot pose in the controller frame.
    pub pose: &'a Pose,

    /// The current measured robot velocity.
    pub velocity: &'a Velocity,

    /// The reference path in the controller frame.
    pub path: &'a RefPath,

    /// The rolled-out trajectory batch for this iteration.
    pub trajectories: &'a TrajectoryBatch,

    /// The perturbed control batch the trajectories were rolled out from.
    pub controls: &'a ControlBatch,

    /// The model integration step, in seconds.
    pub model_dt: f32,

    /// The per-trajectory cost accumulator, length `batch_size`.
    pub costs: &'a mut Array1<f32>,
}

/// The ordered collection of configured critics.
pub struct CriticPipeline {
    critics: Vec<Box<dyn Critic>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur while building or initialising critics.
#[derive(Debug, thiserror::Error)]
pub enum CriticError {
    #[error("Unknown critic: {0}")]
    UnknownCritic(String),

    #[error("Could not load parameters for critic {0}: {1}")]
    ParamLoadError(String, params::LoadError),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The capability set a pluggable cost function must provide.
pub trait Critic: Send {
    /// The name this critic is registered and configured under.
    fn name(&self) -> &'static str;

    /// Read this critic's own parameters from its named section of the
    /// configuration source.
    fn initialize(&mut self, source: &ParamSource) -> Result<(), CriticError>;

    /// Score the whole trajectory batch, adding into the context's cost
    /// vector. Must be infallible: data-validity issues are handled by
    /// skipping, not by failing the cycle.
    fn score(&self, ctx: &mut EvalContext);
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl CriticPipeline {
    /// Resolve and initialise critics by name, preserving the given order.
    pub fn from_names(names: &[String], source: &ParamSource) -> Result<Self, CriticError> {
        let mut critics = Vec::with_capacity(names.len());

        for name in names {
            let mut critic = critic_for_name(name)?;
            critic.initialize(source)?;
            critics.push(critic);
        }

        Ok(Self { critics })
    }

    /// Run every critic in order against the given context.
    pub fn score_all(&self, ctx: &mut EvalContext) {
        for critic in &self.critics {
            critic.score(ctx);
        }
    }

    pub fn len(&self) -> usize {
        self.critics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.critics.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The critic registry: map a name to a freshly-constructed critic.
pub fn critic_for_name(name: &str) -> Result<Box<dyn Critic>, CriticError> {
    match name {
        "GoalCritic" => Ok(Box::new(GoalCritic::default())),
        "GoalAngleCritic" => Ok(Box::new(GoalAngleCritic::default())),
        "PreferForwardCritic" => Ok(Box::new(PreferForwardCritic::default())),
        _ => Err(CriticError::UnknownCritic(name.into())),
    }
}

// ------------------------------------------------------------------------------------------------
// CRATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// True if the robot is within the given distance of the path's final point.
///
/// Uses a squared-distance comparison with strict less-than, so a robot at
/// exactly the threshold distance is not considered within tolerance.
pub(crate) fn within_goal_tolerance(threshold_m: f32, pose: &Pose, path: &RefPath) -> bool {
    let (goal_x, goal_y, _) = match path.goal() {
        Some(g) => g,
        None => return false,
    };

    let dx = pose.position_m.x as f32 - goal_x;
    let dy = pose.position_m.y as f32 - goal_y;

    dx * dx + dy * dy < threshold_m * threshold_m
}

/// Add a weighted raw cost into the accumulator, optionally raised to an
/// integer power.
///
/// `power == 1` is the common case and takes a fused multiply-add path that
/// avoids the exponentiation call entirely.
pub(crate) fn accumulate(costs: &mut Array1<f32>, raw: &Array1<f32>, weight: f32, power: u32) {
    if power > 1 {
        Zip::from(costs)
            .and(raw)
            .for_each(|c, &r| *c += (r * weight).powi(power as i32));
    } else {
        costs.scaled_add(weight, raw);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accumulate_power_relationship() {
        // A power-2 critic on unit raw costs must equal the square of the
        // power-1 result elementwise
        let raw = array![1.0_f32, 1.0, 1.0];

        let mut costs_p1 = Array1::zeros(3);
        accumulate(&mut costs_p1, &raw, 3.0, 1);

        let mut costs_p2 = Array1::zeros(3);
        accumulate(&mut costs_p2, &raw, 3.0, 2);

        for i in 0..3 {
            assert!((costs_p2[i] - costs_p1[i] * costs_p1[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_accumulate_adds_in_place() {
        let raw = array![1.0_f32, 2.0];
        let mut costs = array![10.0_f32, 20.0];
        accumulate(&mut costs, &raw, 2.0, 1);
        assert_eq!(costs, array![12.0, 24.0]);
    }

    #[test]
    fn test_within_goal_tolerance_is_strict() {
        let path = RefPath::from_waypoints(&[(0.0, 0.0, 0.0), (3.0, 4.0, 0.0)]);

        // Robot at exactly the threshold distance (5 m) does not qualify
        let pose = Pose::new(0.0, 0.0, 0.0);
        assert!(!within_goal_tolerance(5.0, &pose, &path));

        // Just inside does
        assert!(within_goal_tolerance(5.001, &pose, &path));
    }

    #[test]
    fn test_empty_path_never_within_tolerance() {
        let path = RefPath::from_waypoints(&[]);
        let pose = Pose::new(0.0, 0.0, 0.0);
        assert!(!within_goal_tolerance(100.0, &pose, &path));
    }

    #[test]
    fn test_unknown_critic_rejected() {
        assert!(matches!(
            critic_for_name("NoSuchCritic"),
            Err(CriticError::UnknownCritic(_))
        ));
    }

    #[test]
    fn test_pipeline_preserves_order() {
        let source = ParamSource::from_str("").unwrap();
        let names = vec!["PreferForwardCritic".to_string(), "GoalCritic".to_string()];
        let pipeline = CriticPipeline::from_names(&names, &source).unwrap();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.critics[0].name(), "PreferForwardCritic");
        assert_eq!(pipeline.critics[1].name(), "GoalCritic");
    }
}
