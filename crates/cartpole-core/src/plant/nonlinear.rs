//! Nonlinear cart-pendulum dynamics
//!
//! Full equations of motion for the cart-pendulum system:
//!
//! θ̈ = (g·sinθ + cosθ·f − b_p·θ̇/(m·l)) / (l·(4/3 − m·cos²θ/M))
//! ẍ = f − m·l·θ̈·cosθ/M
//!
//! with f = (u + m·l·θ̇²·sinθ − b_c·ẋ)/M, M the total mass and θ measured
//! from the upright equilibrium (counter-clockwise positive). Integrated
//! with explicit Euler at the fixed control timestep.

use crate::config::{InitialState, PlantParams};
use crate::{wrap_angle, CONTROL_DT, GRAVITY};

use super::{PlantModel, PlantOutput, SimpleRng};

/// Nonlinear plant model
///
/// Valid at any angle; numerical behavior is only as good as the supplied
/// parameters (physically absurd values are not guarded against).
#[derive(Debug, Clone)]
pub struct NonlinearPlant {
    params: PlantParams,
    /// Cart position [m]
    x: f64,
    /// Cart velocity [m/s]
    x_dot: f64,
    /// Pendulum angle from upright [rad], counter-clockwise positive
    theta: f64,
    /// Angular velocity [rad/s]
    theta_dot: f64,
}

impl NonlinearPlant {
    /// Create a plant with the initial angle/velocity jittered so the
    /// pendulum never starts in a perfectly unstable equilibrium.
    pub fn new(params: PlantParams, initial: &InitialState) -> Self {
        let mut rng = SimpleRng::new(initial.seed);
        Self {
            params,
            x: 0.0,
            x_dot: 0.0,
            theta: initial.theta + rng.next_symmetric(initial.theta_jitter),
            theta_dot: rng.next_symmetric(initial.theta_dot_jitter),
        }
    }

    /// Create a plant at an exact state, bypassing the jitter.
    ///
    /// `theta` is the deviation from upright [rad].
    pub fn at_rest(params: PlantParams, theta: f64) -> Self {
        Self {
            params,
            x: 0.0,
            x_dot: 0.0,
            theta,
            theta_dot: 0.0,
        }
    }

    /// Current angular velocity [rad/s]
    pub fn theta_dot(&self) -> f64 {
        self.theta_dot
    }

    /// Current cart velocity [m/s]
    pub fn x_dot(&self) -> f64 {
        self.x_dot
    }
}

impl PlantModel for NonlinearPlant {
    fn step(&mut self, force: f64) -> PlantOutput {
        let p = &self.params;
        let dt = CONTROL_DT;

        let sin_theta = self.theta.sin();
        let cos_theta = self.theta.cos();

        let total_mass = p.cart_mass + p.pendulum_mass;
        let pendulum_mass_length = p.pendulum_mass * p.length;

        // Cart-side force balance, cart friction included
        let temp = (force + pendulum_mass_length * self.theta_dot.powi(2) * sin_theta
            - p.friction * self.x_dot)
            / total_mass;

        // Pivot damping enters the angular acceleration
        let theta_acc = (GRAVITY * sin_theta + cos_theta * temp
            - p.damping * self.theta_dot / pendulum_mass_length)
            / (p.length * (4.0 / 3.0 - p.pendulum_mass * cos_theta.powi(2) / total_mass));

        let x_acc = temp - pendulum_mass_length * theta_acc * cos_theta / total_mass;

        self.x_dot += x_acc * dt;
        self.x += self.x_dot * dt;
        self.theta_dot += theta_acc * dt;
        self.theta += self.theta_dot * dt;

        PlantOutput {
            position: self.x,
            angle: wrap_angle(self.theta + std::f64::consts::PI),
        }
    }
}
