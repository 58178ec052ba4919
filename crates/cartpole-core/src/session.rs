//! Control session lifecycle
//!
//! A [`Session`] owns the shared state and the loop handles of one
//! control run: one plant loop (a simulation model here; the hardware
//! bridge crate provides the physical equivalent) and one control loop,
//! optionally hosting the swing-up supervisor.
//!
//! Dropping a handle or calling [`Session::stop`] ends the loops between
//! ticks; stop additionally zeroes the actuation command so a restarted
//! plant never sees a stale force.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::control::{registry, ControlLaw, Measurement};
use crate::plant::{LinearPlant, NonlinearPlant, PlantModel};
use crate::runtime::{CommandWatchdog, LoopBuilder, LoopHandle};
use crate::state::SharedState;
use crate::swingup::SwingUpSupervisor;
use crate::CONTROL_DT;

/// Which simulation model stands in for the plant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationModel {
    /// Small-angle state-space model
    Linear,
    /// Full nonlinear equations of motion
    Nonlinear,
}

/// One control session: shared state plus the loops acting on it
pub struct Session {
    config: SessionConfig,
    shared: Arc<SharedState>,
    plant_loop: Option<LoopHandle>,
    control_loop: Option<LoopHandle>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            shared: SharedState::new(),
            plant_loop: None,
            control_loop: None,
        }
    }

    /// The session's shared cells, for wiring external loops (hardware
    /// bridge) or display polling.
    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start the simulated plant loop.
    ///
    /// The loop reads the latest actuation command through the stalled-
    /// writer watchdog, advances the model one timestep and publishes
    /// position and angle.
    pub fn start_simulation(&mut self, model: SimulationModel) {
        if self.plant_loop.is_some() {
            warn!("plant loop already running");
            return;
        }

        let mut plant: Box<dyn PlantModel> = match model {
            SimulationModel::Linear => Box::new(LinearPlant::new(
                self.config.plant.clone(),
                &self.config.initial,
            )),
            SimulationModel::Nonlinear => Box::new(NonlinearPlant::new(
                self.config.plant.clone(),
                &self.config.initial,
            )),
        };

        let shared = self.shared();
        let mut watchdog = CommandWatchdog::default();

        let handle = LoopBuilder::new("plant", Duration::from_secs_f64(CONTROL_DT)).spawn(
            move || {
                let command = watchdog.filter(shared.control_seq(), shared.control());
                let out = plant.step(command);
                shared.set_position(out.position);
                shared.set_angle(out.angle);
                ControlFlow::Continue(())
            },
        );

        info!(?model, "simulation started");
        self.plant_loop = Some(handle);
    }

    /// Start the control loop.
    ///
    /// With a swing-up stage configured the loop hosts the full
    /// [`SwingUpSupervisor`] lifecycle, otherwise the stabilizer alone.
    /// The loop exits on its own when the shared run flag goes false.
    pub fn start_controller(&mut self) {
        if self.control_loop.is_some() {
            warn!("control loop already running");
            return;
        }

        let stabilizer = registry::build_stabilizer(&self.config.controller);
        let mut law: Box<dyn ControlLaw> = match &self.config.swingup {
            Some(swingup_config) => {
                let swingup =
                    registry::build_swingup(swingup_config, &self.config.plant, CONTROL_DT);
                Box::new(SwingUpSupervisor::new(swingup, stabilizer))
            }
            None => stabilizer,
        };

        info!(controller = law.name(), "controller started");
        self.shared.set_running(true);

        let shared = self.shared();
        let timing = self.shared();

        let handle = LoopBuilder::new("control", Duration::from_secs_f64(CONTROL_DT))
            .duration_sink(move |seconds| timing.set_loop_time(seconds))
            .spawn(move || {
                if !shared.is_running() {
                    // Stop actuating and exit between ticks
                    shared.set_control(0.0);
                    return ControlFlow::Break(());
                }

                let measurement = Measurement {
                    position: shared.position(),
                    angle: shared.angle(),
                };
                let out = law.tick(measurement, CONTROL_DT);

                if let Some(desired) = out.desired_angle {
                    shared.set_desired_angle(desired);
                }
                shared.set_control(out.force);
                ControlFlow::Continue(())
            });

        self.control_loop = Some(handle);
    }

    /// True while any loop of the session is still alive.
    pub fn is_active(&self) -> bool {
        let plant_alive = self
            .plant_loop
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        let control_alive = self
            .control_loop
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        plant_alive || control_alive
    }

    /// Stop all loops and zero the actuation command.
    pub fn stop(&mut self) {
        self.shared.set_running(false);

        if let Some(handle) = self.control_loop.take() {
            handle.stop();
        }
        // The controller is gone; make sure no stale force survives
        self.shared.set_control(0.0);

        if let Some(handle) = self.plant_loop.take() {
            handle.stop();
        }
        info!("session stopped");
    }
}
