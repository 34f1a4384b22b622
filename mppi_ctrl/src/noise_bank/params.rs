//! Parameters structure for the noise bank

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the noise bank.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// The operating mode, see the module documentation for the trade-offs.
    pub mode: NoiseMode,

    /// Seed for the random engine. Non-zero values make the noise stream
    /// reproducible, zero requests entropy seeding.
    pub seed: u64,

    /// Number of batch-shaped slices in the pre-generated bank. Only used in
    /// pregenerated mode, where it must be non-zero.
    pub pregenerate_size: usize,

    /// How the pre-generated bank is scaled across control dimensions.
    pub pregen_std: PregenStd,

    /// If true the first generated noise slice is dumped to a CSV file for
    /// offline inspection. This happens at most once per process.
    pub dump_first_slice: bool,

    /// Directory the noise dump is written into.
    pub dump_dir: String,
}

/// Per-dimension sampling standard deviations.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SamplingStd {
    /// Standard deviation of the linear X perturbations, in meters/second.
    pub vx: f32,

    /// Standard deviation of the linear Y perturbations, in meters/second.
    /// Only consumed for holonomic platforms.
    pub vy: f32,

    /// Standard deviation of the angular Z perturbations, in radians/second.
    pub wz: f32,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Noise bank operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseMode {
    OnDemand,
    Background,
    Pregenerated,
}

/// How the pre-generated bank scales its samples across control dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PregenStd {
    /// One bank drawn with the linear X standard deviation, every axis served
    /// from it.
    Shared,

    /// One bank per active axis, each drawn with that axis's standard
    /// deviation.
    PerAxis,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            mode: NoiseMode::OnDemand,
            seed: 0,
            pregenerate_size: 1000,
            pregen_std: PregenStd::Shared,
            dump_first_slice: false,
            dump_dir: "/tmp".into(),
        }
    }
}

impl Default for SamplingStd {
    fn default() -> Self {
        Self {
            vx: 0.2,
            vy: 0.2,
            wz: 0.4,
        }
    }
}

impl Default for NoiseMode {
    fn default() -> Self {
        NoiseMode::OnDemand
    }
}

impl Default for PregenStd {
    fn default() -> Self {
        PregenStd::Shared
    }
}
