//! Shared state cells
//!
//! One control session runs its plant (or hardware bridge) loop and its
//! control loop on independent threads. The loops never block on each
//! other; they exchange values exclusively through the scalar cells
//! defined here.
//!
//! Every cell is an atomic. A reader may observe a value that is up to one
//! tick stale — that is accepted by design for a 10 ms control period and
//! must not be "fixed" with locks, which would couple the loop timings.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free `f64` cell backed by the bit pattern in an `AtomicU64`.
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Read-only copy of the shared cells for display polling.
///
/// The GUI/plotting layer may poll this at an arbitrary rate; it must never
/// be the timing source for control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    /// Cart position (m in simulation, mm on hardware)
    pub position: f64,
    /// Pendulum angle [rad], 0 = down, π = upright
    pub angle: f64,
    /// Last actuation command written by the controller
    pub control: f64,
    /// Last measured control loop execution time [s]
    pub loop_time: f64,
    /// Setpoint written by the outer loop of a cascaded controller [rad]
    pub desired_angle: f64,
    /// Session run flag
    pub running: bool,
}

/// The scalar cells shared by the loops of one control session.
///
/// Created once at session start, shared via [`Arc`], discarded when the
/// session stops. Each cell has a single intended writer: the plant or
/// bridge loop writes `position` and `angle`, the control loop writes
/// `control`, `loop_time` and `desired_angle`, the session owner writes
/// `running`.
#[derive(Debug, Default)]
pub struct SharedState {
    position: AtomicF64,
    angle: AtomicF64,
    control: AtomicF64,
    loop_time: AtomicF64,
    desired_angle: AtomicF64,
    running: AtomicBool,
    /// Bumped on every command write; consumers watch it to detect a
    /// controller that stopped producing output.
    control_seq: AtomicU64,
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn position(&self) -> f64 {
        self.position.load()
    }

    pub fn set_position(&self, value: f64) {
        self.position.store(value);
    }

    pub fn angle(&self) -> f64 {
        self.angle.load()
    }

    pub fn set_angle(&self, value: f64) {
        self.angle.store(value);
    }

    pub fn control(&self) -> f64 {
        self.control.load()
    }

    /// Write a new actuation command and bump the command sequence.
    pub fn set_control(&self, value: f64) {
        self.control.store(value);
        self.control_seq.fetch_add(1, Ordering::Relaxed);
    }

    /// Sequence number of the latest command write.
    pub fn control_seq(&self) -> u64 {
        self.control_seq.load(Ordering::Relaxed)
    }

    pub fn loop_time(&self) -> f64 {
        self.loop_time.load()
    }

    pub fn set_loop_time(&self, seconds: f64) {
        self.loop_time.store(seconds);
    }

    pub fn desired_angle(&self) -> f64 {
        self.desired_angle.load()
    }

    pub fn set_desired_angle(&self, value: f64) {
        self.desired_angle.store(value);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            position: self.position(),
            angle: self.angle(),
            control: self.control(),
            loop_time: self.loop_time(),
            desired_angle: self.desired_angle(),
            running: self.is_running(),
        }
    }
}
