//! Goal distance critic
//!
//! Pulls trajectories towards the final point of the reference path. Only
//! active once the robot is within a configurable distance of the goal, so
//! that path-following critics dominate during the approach.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::info;
use ndarray::{Axis, Zip};
use serde::Deserialize;

// Internal
use super::{accumulate, within_goal_tolerance, Critic, CriticError, EvalContext};
use util::params::ParamSource;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the goal distance critic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoalCriticParams {
    pub enabled: bool,
    pub cost_weight: f32,
    pub cost_power: u32,

    /// Distance to the goal below which this critic starts scoring.
    ///
    /// Units: meters
    pub threshold_to_consider_m: f32,
}

#[derive(Default)]
pub struct GoalCritic {
    params: GoalCriticParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for GoalCriticParams {
    fn default() -> Self {
        Self {
            enabled: true,
            cost_weight: 5.0,
            cost_power: 1,
            threshold_to_consider_m: 1.4,
        }
    }
}

impl Critic for GoalCritic {
    fn name(&self) -> &'static str {
        "GoalCritic"
    }

    fn initialize(&mut self, source: &ParamSource) -> Result<(), CriticError> {
        self.params = source
            .section(self.name())
            .map_err(|e| CriticError::ParamLoadError(self.name().into(), e))?;

        info!(
            "GoalCritic instantiated with {} power and {} weight",
            self.params.cost_power, self.params.cost_weight
        );

        Ok(())
    }

    fn score(&self, ctx: &mut EvalContext) {
        if !self.params.enabled
            || !within_goal_tolerance(self.params.threshold_to_consider_m, ctx.pose, ctx.path)
        {
            return;
        }

        let (goal_x, goal_y, _) = match ctx.path.goal() {
            Some(g) => g,
            None => return,
        };

        // Mean euclidian distance from each trajectory to the goal
        let dists = Zip::from(&ctx.trajectories.x)
            .and(&ctx.trajectories.y)
            .map_collect(|&x, &y| (x - goal_x).hypot(y - goal_y));

        if let Some(raw) = dists.mean_axis(Axis(1)) {
            accumulate(
                ctx.costs,
                &raw,
                self.params.cost_weight,
                self.params.cost_power,
            );
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::batch::{ControlBatch, TrajectoryBatch};
    use crate::path::{Pose, RefPath, Velocity};
    use ndarray::Array1;

    fn score_at(pose: Pose, path: &RefPath) -> Array1<f32> {
        let mut critic = GoalCritic::default();
        critic
            .initialize(&ParamSource::from_str("").unwrap())
            .unwrap();

        let mut trajectories = TrajectoryBatch::default();
        trajectories.reset(4, 3);
        let mut controls = ControlBatch::default();
        controls.reset(4, 3);
        let velocity = Velocity::default();
        let mut costs = Array1::zeros(4);

        let mut ctx = EvalContext {
            pose: &pose,
            velocity: &velocity,
            path,
            trajectories: &trajectories,
            controls: &controls,
            model_dt: 0.05,
            costs: &mut costs,
        };
        critic.score(&mut ctx);

        costs
    }

    #[test]
    fn test_does_not_fire_at_exact_threshold() {
        // Goal at 1.4 m, exactly the default threshold
        let path = RefPath::from_waypoints(&[(0.0, 0.0, 0.0), (1.4, 0.0, 0.0)]);
        let costs = score_at(Pose::new(0.0, 0.0, 0.0), &path);
        assert!(costs.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_fires_just_inside_threshold() {
        let path = RefPath::from_waypoints(&[(0.0, 0.0, 0.0), (1.399, 0.0, 0.0)]);
        let costs = score_at(Pose::new(0.0, 0.0, 0.0), &path);

        // Trajectories sit at the origin, 1.399 m from the goal, so the cost
        // is weight * distance for every trajectory
        for &c in costs.iter() {
            assert!(c > 0.0);
            assert!((c - 5.0 * 1.399).abs() < 1e-3);
        }
    }

    #[test]
    fn test_disabled_critic_adds_nothing() {
        let mut critic = GoalCritic::default();
        critic
            .initialize(&ParamSource::from_str("[GoalCritic]\nenabled = false\n").unwrap())
            .unwrap();
        assert!(!critic.params.enabled);
    }
}
