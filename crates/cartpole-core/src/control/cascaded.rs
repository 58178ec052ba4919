//! Cascaded position/angle PID controller
//!
//! Two nested loops. The outer loop turns the cart position error into a
//! small desired lean, the inner loop drives the pendulum to that lean.
//! Leaning the pendulum makes the stabilizing inner loop carry the cart
//! back toward the track center.

use crate::config::CascadedConfig;
use crate::UPRIGHT;

use super::{Actuation, ControlLaw, Measurement};

/// Outer-loop offset → angle scale. Full scale corresponds to a 5° lean.
const OFFSET_SCALE: f64 = std::f64::consts::PI / 36.0 / 8000.0;

/// Maximum commanded lean from upright [rad]
const MAX_LEAN: f64 = std::f64::consts::PI / 36.0; // 5°

/// Cascaded PID controller
///
/// The outer loop recomputes its offset every `outer_divisor` ticks and
/// holds the last value in between (held, never interpolated). The inner
/// loop integral only accumulates while the angle error is inside the
/// controllable region, so leaving the linear regime does not wind it up.
#[derive(Debug, Clone)]
pub struct CascadedPidController {
    config: CascadedConfig,
    tick: u64,
    // Outer (position) loop state
    pos_integral: f64,
    pos_prev_error: f64,
    offset: f64,
    // Inner (angle) loop state
    angle_integral: f64,
    angle_prev_error: f64,
}

impl CascadedPidController {
    pub fn new(config: CascadedConfig) -> Self {
        Self {
            config,
            tick: 0,
            pos_integral: 0.0,
            pos_prev_error: 0.0,
            offset: 0.0,
            angle_integral: 0.0,
            angle_prev_error: 0.0,
        }
    }

    /// Inner-loop integral term, exposed for validation
    pub fn inner_integral(&self) -> f64 {
        self.angle_integral
    }

    fn outer_tick(&mut self, position: f64, dt: f64) {
        let error = -position; // setpoint: track center

        if error.abs() < self.config.deadband {
            // Close enough to center: command no lean and drop any error
            // accumulated while crossing the dead zone
            self.offset = 0.0;
            self.pos_integral = 0.0;
        } else {
            self.pos_integral += error * dt;
            let derivative = (error - self.pos_prev_error) / dt;
            self.offset = self.config.outer.kp * error
                + self.config.outer.ki * self.pos_integral
                + self.config.outer.kd * derivative;
        }
        self.pos_prev_error = error;
    }
}

impl ControlLaw for CascadedPidController {
    fn name(&self) -> &'static str {
        "cascaded_pid"
    }

    fn tick(&mut self, measurement: Measurement, dt: f64) -> Actuation {
        let outer_divisor = self.config.outer_divisor.max(1) as u64;
        if self.tick % outer_divisor == 0 {
            let outer_dt = dt * outer_divisor as f64;
            self.outer_tick(measurement.position, outer_dt);
        }
        self.tick += 1;

        let desired_angle =
            (UPRIGHT - self.offset * OFFSET_SCALE).clamp(UPRIGHT - MAX_LEAN, UPRIGHT + MAX_LEAN);

        let error = desired_angle - measurement.angle;
        if error.abs() <= self.config.max_controllable_angle {
            self.angle_integral += error * dt;
        }
        let derivative = (error - self.angle_prev_error) / dt;
        self.angle_prev_error = error;

        let force = self.config.inner.kp * error
            + self.config.inner.ki * self.angle_integral
            + self.config.inner.kd * derivative;

        Actuation {
            force,
            desired_angle: Some(desired_angle),
            handoff: false,
        }
    }
}
