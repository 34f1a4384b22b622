//! Ackermann motion model
//!
//! Car-like steering cannot turn tighter than its minimum turning radius, so
//! sampled angular rates are clamped against the linear speed before the
//! rollout ever sees them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use ndarray::Zip;
use serde::Deserialize;

// Internal
use super::{MotionModel, MotionModelError};
use crate::batch::ControlBatch;
use util::params::ParamSource;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the Ackermann motion model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AckermannParams {
    /// Tightest turn the platform can execute.
    ///
    /// Units: meters
    pub min_turning_radius_m: f32,
}

/// A car-like platform with a minimum turning radius.
pub struct Ackermann {
    params: AckermannParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for AckermannParams {
    fn default() -> Self {
        Self {
            min_turning_radius_m: 0.2,
        }
    }
}

impl Ackermann {
    pub fn from_source(source: &ParamSource) -> Result<Self, MotionModelError> {
        let params = source
            .section("AckermannConstraints")
            .map_err(|e| MotionModelError::ParamLoadError("Ackermann".into(), e))?;

        Ok(Self { params })
    }
}

impl MotionModel for Ackermann {
    fn name(&self) -> &'static str {
        "Ackermann"
    }

    fn is_holonomic(&self) -> bool {
        false
    }

    /// Clamp each sampled angular rate so the implied turning radius never
    /// drops below the minimum, preserving the sign of the turn.
    fn apply_constraints(&self, controls: &mut ControlBatch) {
        let r_min = self.params.min_turning_radius_m;
        if r_min <= 0.0 {
            return;
        }

        Zip::from(&mut controls.cwz)
            .and(&controls.cvx)
            .for_each(|wz, &vx| {
                let wz_max = vx.abs() / r_min;
                if wz.abs() > wz_max {
                    *wz = wz_max.copysign(*wz);
                }
            });
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamps_tight_turns() {
        let model = Ackermann {
            params: AckermannParams {
                min_turning_radius_m: 0.5,
            },
        };

        let mut controls = ControlBatch::default();
        controls.reset(1, 4);
        controls.cvx.fill(1.0);
        // At 1 m/s and r_min 0.5 m the angular rate saturates at 2 rad/s
        controls.cwz[[0, 0]] = 3.0;
        controls.cwz[[0, 1]] = -3.0;
        controls.cwz[[0, 2]] = 1.5;
        controls.cwz[[0, 3]] = 0.0;

        model.apply_constraints(&mut controls);

        assert_eq!(controls.cwz[[0, 0]], 2.0);
        assert_eq!(controls.cwz[[0, 1]], -2.0);
        assert_eq!(controls.cwz[[0, 2]], 1.5);
        assert_eq!(controls.cwz[[0, 3]], 0.0);
    }

    #[test]
    fn test_stationary_platform_cannot_turn() {
        let model = Ackermann {
            params: AckermannParams {
                min_turning_radius_m: 0.5,
            },
        };

        let mut controls = ControlBatch::default();
        controls.reset(1, 2);
        controls.cwz.fill(1.0);

        model.apply_constraints(&mut controls);
        assert!(controls.cwz.iter().all(|&wz| wz == 0.0));
    }

    #[test]
    fn test_reads_own_section() {
        let source = ParamSource::from_str(
            "[AckermannConstraints]\nmin_turning_radius_m = 1.5\n",
        )
        .unwrap();
        let model = Ackermann::from_source(&source).unwrap();
        assert_eq!(model.params.min_turning_radius_m, 1.5);
    }
}
