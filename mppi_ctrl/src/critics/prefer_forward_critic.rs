//! Prefer forward critic
//!
//! Penalises reversing so that, all else being equal, trajectories driving
//! forwards win. Disabled near the goal where short reversing manoeuvres are
//! often needed to reach the final pose.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::info;
use ndarray::Axis;
use serde::Deserialize;

// Internal
use super::{accumulate, within_goal_tolerance, Critic, CriticError, EvalContext};
use util::params::ParamSource;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the prefer forward critic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreferForwardCriticParams {
    pub enabled: bool,
    pub cost_weight: f32,
    pub cost_power: u32,

    /// Distance to the goal below which this critic stops scoring.
    ///
    /// Units: meters
    pub threshold_to_consider_m: f32,
}

#[derive(Default)]
pub struct PreferForwardCritic {
    params: PreferForwardCriticParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for PreferForwardCriticParams {
    fn default() -> Self {
        Self {
            enabled: true,
            cost_weight: 5.0,
            cost_power: 1,
            threshold_to_consider_m: 0.5,
        }
    }
}

impl Critic for PreferForwardCritic {
    fn name(&self) -> &'static str {
        "PreferForwardCritic"
    }

    fn initialize(&mut self, source: &ParamSource) -> Result<(), CriticError> {
        self.params = source
            .section(self.name())
            .map_err(|e| CriticError::ParamLoadError(self.name().into(), e))?;

        info!(
            "PreferForwardCritic instantiated with {} power and {} weight",
            self.params.cost_power, self.params.cost_weight
        );

        Ok(())
    }

    fn score(&self, ctx: &mut EvalContext) {
        if !self.params.enabled
            || within_goal_tolerance(self.params.threshold_to_consider_m, ctx.pose, ctx.path)
        {
            return;
        }

        // Accumulated backwards travel per trajectory
        let backwards = ctx.controls.cvx.mapv(|v| (-v).max(0.0));
        let raw = backwards.sum_axis(Axis(1)) * ctx.model_dt;

        accumulate(
            ctx.costs,
            &raw,
            self.params.cost_weight,
            self.params.cost_power,
        );
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

    #[test]
    fn test_penalises_reversing_only() {
        let mut critic = PreferForwardCritic::default();
        critic
            .initialize(&ParamSource::from_str("").unwrap())
            .unwrap();

        let path = RefPath::from_waypoints(&[(0.0, 0.0, 0.0), (5.0, 0.0, 0.0)]);
        let pose = Pose::new(0.0, 0.0, 0.0);

        let trajectories = {
            let mut t = TrajectoryBatch::default();
            t.reset(2, 4);
            t
        };
        let mut controls = ControlBatch::default();
        controls.reset(2, 4);
        // Trajectory 0 drives forwards, trajectory 1 reverses at 0.5 m/s
        for t in 0..4 {
            controls.cvx[[0, t]] = 0.5;
            controls.cvx[[1, t]] = -0.5;
        }

        let velocity = Velocity::default();
        let mut costs = Array1::zeros(2);

        let mut ctx = EvalContext {
            pose: &pose,
            velocity: &velocity,
            path: &path,
            trajectories: &trajectories,
            controls: &controls,
            model_dt: 0.1,
            costs: &mut costs,
        };
        critic.score(&mut ctx);

        assert_eq!(costs[0], 0.0);
        // 4 steps * 0.5 m/s * 0.1 s * weight 5
        assert!((costs[1] - 1.0).abs() < 1e-5);
    }
}
