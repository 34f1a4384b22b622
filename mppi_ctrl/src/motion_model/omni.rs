//! Omnidirectional motion model

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::MotionModel;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// An omnidirectional platform: the lateral axis is sampled, perturbed and
/// integrated alongside the other two.
pub struct Omni;

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl MotionModel for Omni {
    fn name(&self) -> &'static str {
        "Omni"
    }

    fn is_holonomic(&self) -> bool {
        true
    }
}
