//! Goal angle critic
//!
//! Aligns trajectory headings with the final path point's heading once the
//! robot is close enough to the goal for the final orientation to matter.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::info;
use ndarray::Axis;
use serde::Deserialize;

// Internal
use super::{accumulate, within_goal_tolerance, Critic, CriticError, EvalContext};
use util::{maths, params::ParamSource};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the goal angle critic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoalAngleCriticParams {
    pub enabled: bool,
    pub cost_weight: f32,
    pub cost_power: u32,

    /// Distance to the goal below which this critic starts scoring.
    ///
    /// Units: meters
    pub threshold_to_consider_m: f32,
}

#[derive(Default)]
pub struct GoalAngleCritic {
    params: GoalAngleCriticParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for GoalAngleCriticParams {
    fn default() -> Self {
        Self {
            enabled: true,
            cost_weight: 3.0,
            cost_power: 1,
            threshold_to_consider_m: 0.5,
        }
    }
}

impl Critic for GoalAngleCritic {
    fn name(&self) -> &'static str {
        "GoalAngleCritic"
    }

    fn initialize(&mut self, source: &ParamSource) -> Result<(), CriticError> {
        self.params = source
            .section(self.name())
            .map_err(|e| CriticError::ParamLoadError(self.name().into(), e))?;

        info!(
            "GoalAngleCritic instantiated with {} power and {} weight",
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

        let (_, _, goal_heading) = match ctx.path.goal() {
            Some(g) => g,
            None => return,
        };

        // Mean absolute angular distance from each trajectory heading to the
        // goal heading
        let errors = ctx
            .trajectories
            .heading
            .mapv(|h| maths::ang_dist(h, goal_heading).abs());

        if let Some(raw) = errors.mean_axis(Axis(1)) {
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
