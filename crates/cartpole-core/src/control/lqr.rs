//! Linear-quadratic regulator
//!
//! Full-state feedback about the upright equilibrium:
//!
//! u = −(Kx·x + Kẋ·ẋ + Kθ·(θ−π) + Kθ̇·θ̇)
//!
//! The gain vector is designed offline against the linearized model and
//! supplied as constants at session start. Velocities are estimated by
//! backward finite difference across ticks; there is no separate state
//! estimator or filter.

use crate::config::LqrGains;
use crate::UPRIGHT;

use super::{Actuation, BackwardDifference, ControlLaw, Measurement};

/// LQR full-state feedback controller
#[derive(Debug, Clone)]
pub struct LqrController {
    gains: LqrGains,
    position_rate: BackwardDifference,
    angle_rate: BackwardDifference,
}

impl LqrController {
    pub fn new(gains: LqrGains) -> Self {
        Self {
            gains,
            position_rate: BackwardDifference::new(),
            angle_rate: BackwardDifference::new(),
        }
    }
}

impl ControlLaw for LqrController {
    fn name(&self) -> &'static str {
        "lqr"
    }

    fn tick(&mut self, measurement: Measurement, dt: f64) -> Actuation {
        let x = measurement.position;
        let x_dot = self.position_rate.rate(x, dt);
        let theta_error = measurement.angle - UPRIGHT;
        let theta_dot = self.angle_rate.rate(measurement.angle, dt);

        let u = -(self.gains.k_x * x
            + self.gains.k_x_dot * x_dot
            + self.gains.k_theta * theta_error
            + self.gains.k_theta_dot * theta_dot);

        Actuation::force(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn measure(position: f64, angle: f64) -> Measurement {
        Measurement { position, angle }
    }

    #[test]
    fn test_equilibrium_gives_zero_command() {
        let mut lqr = LqrController::new(LqrGains::default());
        let out = lqr.tick(measure(0.0, PI), 0.01);
        assert_relative_eq!(out.force, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_feedback_sign() {
        let mut lqr = LqrController::new(LqrGains {
            k_x: 0.0,
            k_x_dot: 0.0,
            k_theta: 20.0,
            k_theta_dot: 0.0,
        });
        // Leaning counter-clockwise past upright → negative command
        let out = lqr.tick(measure(0.0, PI + 0.1), 0.01);
        assert_relative_eq!(out.force, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_velocity_terms_use_backward_difference() {
        let mut lqr = LqrController::new(LqrGains {
            k_x: 0.0,
            k_x_dot: 1.0,
            k_theta: 0.0,
            k_theta_dot: 1.0,
        });
        let dt = 0.01;

        // First tick has no history, so estimated rates are zero
        let first = lqr.tick(measure(0.0, PI), dt);
        assert_relative_eq!(first.force, 0.0, epsilon = 1e-12);

        // Position moved 0.01 in one tick → ẋ = 1.0; angle moved 0.02 → θ̇ = 2.0
        let second = lqr.tick(measure(0.01, PI + 0.02), dt);
        assert_relative_eq!(second.force, -(1.0 + 2.0), epsilon = 1e-9);
    }

    #[test]
    fn test_full_state_combination() {
        let gains = LqrGains {
            k_x: 2.0,
            k_x_dot: 0.0,
            k_theta: 10.0,
            k_theta_dot: 0.0,
        };
        let mut lqr = LqrController::new(gains);
        let out = lqr.tick(measure(0.5, PI - 0.1), 0.01);
        assert_relative_eq!(out.force, -(2.0 * 0.5 + 10.0 * (-0.1)), epsilon = 1e-9);
    }
}
