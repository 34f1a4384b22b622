//! # MPPI Controller Demo Executable
//!
//! Drives a simulated differential-drive robot along a straight reference
//! path using the MPPI optimizer, logging the commanded velocities each
//! cycle. Optionally takes the path to a parameter TOML file as the first
//! argument; without it the built-in defaults are used.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::info;

// Internal
use mppi_lib::optimizer::Optimizer;
use mppi_lib::path::{Pose, RefPath, Velocity};
use util::{
    logger::{logger_init, LevelFilter},
    params::ParamSource,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Simulation step between control cycles, in seconds.
const CYCLE_DT_S: f64 = 0.05;

/// Distance to the goal at which the demo stops, in meters.
const GOAL_TOLERANCE_M: f64 = 0.25;

/// Hard limit on the number of simulated cycles.
const MAX_CYCLES: usize = 2000;

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // Initialise logger
    logger_init(LevelFilter::Info, None).wrap_err("Failed to initialise logging")?;

    info!("MPPI Controller Demo\n");

    // ---- LOAD PARAMETERS ----

    let source = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading parameters from {:?}", path);
            ParamSource::from_file(&path).wrap_err("Failed to load the parameter file")?
        }
        None => {
            info!("No parameter file given, using defaults");
            ParamSource::from_str("").wrap_err("Failed to build the parameter source")?
        }
    };

    // ---- CONTROLLER INITIALISATION ----

    let mut optimizer = Optimizer::new();
    optimizer
        .configure(&source)
        .wrap_err("Failed to configure the optimizer")?;

    info!("Optimizer configured");

    // Straight path to a goal 5 m ahead
    let path = RefPath::from_waypoints(&[
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (2.0, 0.0, 0.0),
        (3.0, 0.0, 0.0),
        (4.0, 0.0, 0.0),
        (5.0, 0.0, 0.0),
    ]);

    // ---- MAIN LOOP ----

    let mut pose = Pose::new(0.0, 0.0, 0.0);
    let mut velocity = Velocity::default();

    for cycle in 0..MAX_CYCLES {
        let output = optimizer
            .evaluate(&pose, &velocity, &path)
            .wrap_err("Control cycle failed")?;

        // Propagate the simulated robot with the commanded velocities
        let cmd = output.command;
        pose.position_m.x += cmd.linear_x_ms * pose.heading_rad.cos() * CYCLE_DT_S;
        pose.position_m.y += cmd.linear_x_ms * pose.heading_rad.sin() * CYCLE_DT_S;
        pose.heading_rad += cmd.angular_z_rads * CYCLE_DT_S;
        velocity = cmd;

        let dist_to_goal_m =
            ((pose.position_m.x - 5.0).powi(2) + pose.position_m.y.powi(2)).sqrt();

        if cycle % 20 == 0 {
            info!(
                "Cycle {:4}: pose ({:.2}, {:.2}) m, cmd ({:.3} m/s, {:.3} rad/s), {:.2} m to go",
                cycle,
                pose.position_m.x,
                pose.position_m.y,
                cmd.linear_x_ms,
                cmd.angular_z_rads,
                dist_to_goal_m
            );
        }

        if dist_to_goal_m < GOAL_TOLERANCE_M {
            info!("Goal reached after {} cycles", cycle + 1);
            break;
        }
    }

    let status = optimizer.status();
    info!(
        "Degraded cycles: {} non-finite rollouts, {} uniform weight fallbacks",
        status.nonfinite_trajectories, status.uniform_weight_fallbacks
    );

    optimizer.shutdown();

    Ok(())
}
