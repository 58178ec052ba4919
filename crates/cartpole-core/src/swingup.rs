//! Swing-up → stabilization supervisor
//!
//! Small state machine hosting the swing-up stage and the stabilizing
//! controller in a single control loop:
//!
//! SwingingUp → Stabilizing → Stopped
//!
//! The supervisor runs the swing-up law until it signals handoff, then
//! switches to the stabilizer (constructed up front with its captured
//! tuning values) until the session is stopped. There is no swing-up
//! timeout: a pendulum that never reaches the catch window keeps the
//! supervisor in `SwingingUp` until an external stop.

use tracing::info;

use crate::control::{Actuation, ControlLaw, Measurement};

/// Supervisor phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorPhase {
    /// Running the swing-up stage
    SwingingUp,
    /// Running the stabilizing controller
    Stabilizing,
    /// Externally stopped; command forced to zero
    Stopped,
}

/// Swing-up supervisor, itself usable as a [`ControlLaw`]
pub struct SwingUpSupervisor {
    phase: SupervisorPhase,
    swingup: Box<dyn ControlLaw>,
    stabilizer: Box<dyn ControlLaw>,
}

impl SwingUpSupervisor {
    pub fn new(swingup: Box<dyn ControlLaw>, stabilizer: Box<dyn ControlLaw>) -> Self {
        Self {
            phase: SupervisorPhase::SwingingUp,
            swingup,
            stabilizer,
        }
    }

    pub fn phase(&self) -> SupervisorPhase {
        self.phase
    }

    /// Force the terminal phase; subsequent ticks command zero force.
    pub fn stop(&mut self) {
        if self.phase != SupervisorPhase::Stopped {
            info!(phase = ?self.phase, "supervisor stopped");
            self.phase = SupervisorPhase::Stopped;
        }
    }
}

impl ControlLaw for SwingUpSupervisor {
    fn name(&self) -> &'static str {
        "swingup_supervisor"
    }

    fn tick(&mut self, measurement: Measurement, dt: f64) -> Actuation {
        match self.phase {
            SupervisorPhase::SwingingUp => {
                let out = self.swingup.tick(measurement, dt);
                if out.handoff {
                    info!(
                        stabilizer = self.stabilizer.name(),
                        "swing-up caught the pendulum, handing off"
                    );
                    self.phase = SupervisorPhase::Stabilizing;
                    // The swing-up zeroes its command on completion; hold
                    // that for this tick and stabilize from the next one.
                    return Actuation::force(0.0);
                }
                out
            }
            SupervisorPhase::Stabilizing => self.stabilizer.tick(measurement, dt),
            SupervisorPhase::Stopped => Actuation::idle(),
        }
    }
}
