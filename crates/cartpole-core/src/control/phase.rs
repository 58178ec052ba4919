//! Phase-based swing-up
//!
//! Bang-bang alternative to the energy-shaping law. A short constant
//! "kick" breaks the symmetry of the hanging rest state, then a constant
//! pump force is applied whenever the pendulum's phase (θ, θ̇) is in a
//! quadrant where pushing adds swing amplitude.

use crate::config::SwingUpConfig;
use crate::UPRIGHT;

use super::{
    cart_range_correction, Actuation, BackwardDifference, CatchWindow, ControlLaw, Measurement,
};

/// Quadrant-pumping swing-up stage
#[derive(Debug, Clone)]
pub struct PhaseSwingUp {
    config: SwingUpConfig,
    /// Remaining ticks of the symmetry-breaking kick phase
    kick_ticks_left: u32,
    angle_rate: BackwardDifference,
    position_rate: BackwardDifference,
    catch: CatchWindow,
    done: bool,
}

impl PhaseSwingUp {
    pub fn new(config: SwingUpConfig, dt: f64) -> Self {
        let kick_ticks = (config.kick_duration / dt).round() as u32;
        let catch = CatchWindow::new(config.stable_window);
        Self {
            config,
            kick_ticks_left: kick_ticks,
            angle_rate: BackwardDifference::new(),
            position_rate: BackwardDifference::new(),
            catch,
            done: false,
        }
    }
}

impl ControlLaw for PhaseSwingUp {
    fn name(&self) -> &'static str {
        "phase_swingup"
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

        let mut force = if self.kick_ticks_left > 0 {
            self.kick_ticks_left -= 1;
            // Constant kick opposing the current angular sign
            if theta > 0.0 {
                -self.config.kick_force
            } else {
                self.config.kick_force
            }
        } else if theta < 0.0 && theta_dot < 0.0 {
            -self.config.pump_force
        } else if theta > 0.0 && theta_dot > 0.0 {
            self.config.pump_force
        } else {
            0.0
        };

        force += cart_range_correction(x, x_dot, self.config.max_cart_range);

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
