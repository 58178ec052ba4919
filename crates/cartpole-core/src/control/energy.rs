//! Energy-shaping swing-up
//!
//! Pumps mechanical energy into the pendulum until it approaches the
//! upright region, then signals handoff to a stabilizing controller.
//! The command law is u = k·θ̇·cosθ·E with E the mechanical energy
//! relative to upright, which injects energy whenever pushing the cart
//! in phase with the swing does work on the pendulum.

use crate::config::{PlantParams, SwingUpConfig};
use crate::{GRAVITY, UPRIGHT};

use super::{
    cart_range_correction, Actuation, BackwardDifference, CatchWindow, ControlLaw, Measurement,
};

/// Energy-based swing-up stage
#[derive(Debug, Clone)]
pub struct EnergySwingUp {
    config: SwingUpConfig,
    /// Pendulum mass [kg], taken from the plant parameters
    mass: f64,
    /// Pendulum length [m], taken from the plant parameters
    length: f64,
    angle_rate: BackwardDifference,
    position_rate: BackwardDifference,
    catch: CatchWindow,
    done: bool,
}

impl EnergySwingUp {
    pub fn new(config: SwingUpConfig, plant: &PlantParams) -> Self {
        let catch = CatchWindow::new(config.stable_window);
        Self {
            config,
            mass: plant.pendulum_mass,
            length: plant.length,
            angle_rate: BackwardDifference::new(),
            position_rate: BackwardDifference::new(),
            catch,
            done: false,
        }
    }

    /// Mechanical energy relative to the upright position
    fn energy(&self, theta: f64, theta_dot: f64) -> f64 {
        let potential = self.mass * GRAVITY * self.length * (1.0 - theta.cos());
        let kinetic = 0.5 * self.mass * self.length.powi(2) * theta_dot.powi(2);
        potential + kinetic
    }
}

impl ControlLaw for EnergySwingUp {
    fn name(&self) -> &'static str {
        "energy_swingup"
    }

    fn tick(&mut self, measurement: Measurement, dt: f64) -> Actuation {
        if self.done {
            return Actuation {
                force: 0.0,
                desired_angle: None,
                handoff: true,
            };
        }

        let theta = measurement.angle - UPRIGHT;
        let theta_dot = self.angle_rate.rate(measurement.angle, dt);
        let x = measurement.position;
        let x_dot = self.position_rate.rate(x, dt);

        let energy = self.energy(theta, theta_dot);
        let mut force = self.config.energy_gain * theta_dot * theta.cos() * energy;
        force += cart_range_correction(x, x_dot, self.config.max_cart_range);
        force = force.clamp(-self.config.max_force, self.config.max_force);

        let caught = theta.abs() < self.config.catch_angle
            && theta_dot.abs() < self.config.catch_momentum
            && x.abs() <= self.config.max_cart_range;

        if self.catch.observe(caught) {
            self.done = true;
            return Actuation {
                force: 0.0,
                desired_angle: None,
                handoff: true,
            };
        }

        Actuation::force(force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn swingup(window: u32) -> EnergySwingUp {
        let config = SwingUpConfig {
            stable_window: window,
            ..SwingUpConfig::default()
        };
        EnergySwingUp::new(config, &PlantParams::default())
    }

    fn measure(position: f64, angle: f64) -> Measurement {
        Measurement { position, angle }
    }

    #[test]
    fn test_energy_zero_at_upright_rest() {
        let law = swingup(20);
        assert_relative_eq!(law.energy(0.0, 0.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_energy_maximal_hanging_down() {
        let law = swingup(20);
        let hanging = law.energy(PI, 0.0);
        assert_relative_eq!(
            hanging,
            2.0 * 0.2 * GRAVITY * 0.5, // 2·m·g·l
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_command_clamped_to_max_force() {
        let mut law = swingup(20);
        // Build up an artificial large rate: hanging down, huge angle jump
        law.tick(measure(0.0, 0.1), 0.01);
        let out = law.tick(measure(0.0, 2.0), 0.01);
        assert!(out.force.abs() <= law.config.max_force + 1e-12);
    }

    #[test]
    fn test_single_caught_tick_does_not_hand_off() {
        let mut law = swingup(20);
        law.tick(measure(0.0, PI + 1.0), 0.01);
        let out = law.tick(measure(0.0, PI + 1.0), 0.01); // θ̇ = 0, but θ too big
        assert!(!out.handoff);

        // One tick inside thresholds must not be enough
        let out = law.tick(measure(0.0, PI + 0.01), 0.01);
        assert!(!out.handoff || law.config.stable_window == 1);
    }

    #[test]
    fn test_handoff_after_full_window_and_zero_command() {
        let mut law = swingup(5);
        // Hold the pendulum essentially upright and still
        let mut out = law.tick(measure(0.0, PI), 0.01);
        for _ in 0..10 {
            out = law.tick(measure(0.0, PI), 0.01);
            if out.handoff {
                break;
            }
        }
        assert!(out.handoff);
        assert_eq!(out.force, 0.0);

        // Once done it stays done
        let after = law.tick(measure(0.0, 0.5), 0.01);
        assert!(after.handoff);
        assert_eq!(after.force, 0.0);
    }

    #[test]
    fn test_out_of_range_cart_blocks_catch() {
        let mut law = swingup(2);
        law.tick(measure(2.0, PI), 0.01);
        let mut handed_off = false;
        for _ in 0..10 {
            handed_off |= law.tick(measure(2.0, PI), 0.01).handoff;
        }
        assert!(!handed_off);
    }
}
