//! # Noise bank module
//!
//! The noise bank supplies a fresh batch of zero-mean normally-distributed
//! perturbations for each control-cycle iteration at minimal added latency.
//! It supports three operating modes:
//!
//! - **On-demand**: draws `batch_size * time_steps` samples per control
//!   dimension synchronously when regeneration is signalled.
//! - **Background**: a dedicated worker thread regenerates the next batch
//!   while the current one is in use. The consumer signals "ready to
//!   regenerate" once it has applied the current batch, and the worker
//!   blocks on a condition variable until signalled. If generation cannot
//!   keep up the consumer sees a one-cycle-stale batch rather than blocking.
//! - **Pre-generated**: a circular bank of `pregenerate_size` batch-shaped
//!   slices is drawn once at initialisation and consumed via a monotonically
//!   advancing index modulo the bank size. This removes per-cycle generation
//!   cost entirely at the price of statistical correlation between reused
//!   slices once the bank wraps. That correlation is a deliberate trade-off,
//!   not a bug.
//!
//! A non-zero seed makes the entire noise stream reproducible; a zero seed
//! requests entropy seeding. The random engine is scoped to the bank
//! instance, so multiple controllers in one process stay independent.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during noise bank operation.
#[derive(Debug, thiserror::Error)]
pub enum NoiseBankError {
    #[error("Invalid sampling standard deviation for axis {0}")]
    InvalidStd(&'static str),

    #[error("`pregenerate_size` must be non-zero in pregenerated mode")]
    EmptyBank,

    #[error("The noise bank lock is poisoned")]
    LockPoisoned,

    #[error("Noise buffer shape {0:?} does not match the control batch shape {1:?}")]
    ShapeMismatch((usize, usize), (usize, usize)),

    #[error("Could not dump noise slice: {0}")]
    DumpError(#[from] csv::Error),
}
