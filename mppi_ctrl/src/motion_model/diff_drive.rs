//! Differential drive motion model

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::MotionModel;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A differential drive platform: linear X and angular Z only, no further
/// coupling between the two axes.
pub struct DiffDrive;

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl MotionModel for DiffDrive {
    fn name(&self) -> &'static str {
        "DiffDrive"
    }

    fn is_holonomic(&self) -> bool {
        false
    }
}
