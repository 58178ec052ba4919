//! # Cartpole Core
//!
//! Real-time control and simulation engine for a cart-pendulum
//! ("inverted pendulum") actuator.
//!
//! The crate provides the pieces of a closed control loop running at a
//! fixed 100 Hz rate:
//!
//! - [`plant`]: nonlinear and linearized physics models that stand in for
//!   the physical rig when no hardware is attached
//! - [`control`]: the pluggable control laws (PID, cascaded PID, LQR and
//!   two swing-up strategies) plus a static controller registry
//! - [`swingup`]: the swing-up → stabilization handoff state machine
//! - [`state`]: lock-free shared scalar cells the loops exchange plant and
//!   actuation values through
//! - [`runtime`]: the fixed-period loop scheduler and the stalled-command
//!   watchdog
//! - [`session`]: lifecycle management for one control session
//!
//! ## Angle convention
//!
//! All published angles are wrapped to [0, 2π) with 0 = pendulum hanging
//! down and π = upright, increasing counter-clockwise. Every component of
//! the crate holds this convention at its boundaries; models that use a
//! different internal parametrization convert before writing shared state.

pub mod config;
pub mod control;
pub mod plant;
pub mod runtime;
pub mod session;
pub mod state;
pub mod swingup;

/// Gravity constant [m/s²]
pub const GRAVITY: f64 = 9.81;

/// Fixed integration and control timestep [s] (100 Hz)
pub const CONTROL_DT: f64 = 0.01;

/// Upright setpoint in the canonical angle convention [rad]
pub const UPRIGHT: f64 = std::f64::consts::PI;

/// Wrap an angle to the canonical [0, 2π) range
pub fn wrap_angle(theta: f64) -> f64 {
    theta.rem_euclid(2.0 * std::f64::consts::PI)
}
