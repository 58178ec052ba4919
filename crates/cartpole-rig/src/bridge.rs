//! Hardware bridge loop
//!
//! Substitutes for the simulated plant loop when the physical rig is
//! attached. Because the serial bus is shared, one loop iteration
//! combines all three duties: drain and decode telemetry, pull the
//! controller's command through the stalled-writer watchdog, and
//! transmit the scaled, envelope-checked motor command.
//!
//! The bridge exclusively owns the serial link for the session. On
//! shutdown or an unrecoverable serial fault it writes a final zero
//! command and drops the port; it never retries on its own, since
//! silently reconnecting to a misbehaving actuator is unsafe.

use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use cartpole_core::config::{HardwareConfig, SafetyConfig};
use cartpole_core::runtime::{CommandWatchdog, LoopBuilder, LoopHandle};
use cartpole_core::state::SharedState;

use crate::drive::{scale_output, SafetyEnvelope};
use crate::frame::{encode_command, find_last_frame};

/// Bridge loop period. The link is drained well above the 10 ms control
/// rate so fresh telemetry and commands see minimal latency.
const BRIDGE_PERIOD: Duration = Duration::from_millis(1);

/// Watchdog grace at the bridge rate (~0.5 s) before command decay
const WATCHDOG_HORIZON_TICKS: u32 = 500;
const WATCHDOG_DECAY: f64 = 0.98;

/// Upper bound on bytes drained per tick; anything older is stale anyway
const DRAIN_LIMIT: usize = 4096;

/// Serial transport faults
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },
    #[error("serial I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// The read → control-apply → write cycle over one serial link.
///
/// Generic over the port so the protocol and safety behavior are
/// testable against an in-memory double; production uses the boxed
/// serial port from [`spawn_bridge`].
pub struct HardwareBridge<P: Read + Write> {
    port: P,
    shared: Arc<SharedState>,
    envelope: SafetyEnvelope,
    invert_command: bool,
    watchdog: CommandWatchdog,
    scratch: Vec<u8>,
    last_sent: Option<i16>,
    inside_envelope: bool,
}

impl<P: Read + Write> HardwareBridge<P> {
    pub fn new(
        port: P,
        shared: Arc<SharedState>,
        safety: &SafetyConfig,
        invert_command: bool,
    ) -> Self {
        Self {
            port,
            shared,
            envelope: SafetyEnvelope::new(safety),
            invert_command,
            watchdog: CommandWatchdog::new(WATCHDOG_HORIZON_TICKS, WATCHDOG_DECAY),
            scratch: Vec::with_capacity(DRAIN_LIMIT),
            last_sent: None,
            inside_envelope: true,
        }
    }

    /// One bridge iteration.
    pub fn tick(&mut self) -> Result<(), BridgeError> {
        self.drain()?;

        // Missing telemetry for one tick is expected channel noise; the
        // last published values simply stay in place.
        if let Some(frame) = find_last_frame(&self.scratch) {
            self.shared.set_position(frame.position_mm());
            self.shared.set_angle(frame.angle_rad());
        }

        let raw = self
            .watchdog
            .filter(self.shared.control_seq(), self.shared.control());
        let scaled = scale_output(raw);

        let angle = self.shared.angle();
        let position = self.shared.position();
        let inside = self.envelope.permits(angle, position);
        if inside != self.inside_envelope {
            self.inside_envelope = inside;
            if inside {
                info!("plant back inside the safety envelope");
            } else {
                warn!(angle, position, "safety envelope violated, forcing zero command");
            }
        }

        let mut command = self.envelope.apply(scaled, angle, position);
        if self.invert_command {
            command = -command;
        }

        // The firmware latches the last command; only changes go out
        if self.last_sent != Some(command) {
            self.send(command)?;
            self.last_sent = Some(command);
        }

        Ok(())
    }

    /// Read everything currently buffered on the link into `scratch`.
    fn drain(&mut self) -> Result<(), BridgeError> {
        self.scratch.clear();
        let mut chunk = [0u8; 64];
        loop {
            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    self.scratch.extend_from_slice(&chunk[..n]);
                    if self.scratch.len() >= DRAIN_LIMIT {
                        break;
                    }
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    break
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    fn send(&mut self, command: i16) -> Result<(), BridgeError> {
        self.port.write_all(&encode_command(command))?;
        self.port.flush()?;
        Ok(())
    }
}

impl<P: Read + Write> Drop for HardwareBridge<P> {
    fn drop(&mut self) {
        // Best effort: never leave the motor running on the way out
        let _ = self.port.write_all(&encode_command(0));
        let _ = self.port.flush();
    }
}

/// Open the configured serial port and run the bridge on its own loop.
///
/// The returned handle stops the loop between ticks; the final zero
/// command goes out when the bridge is dropped. A transport fault ends
/// the loop with an error log and no automatic retry — restarting is an
/// explicit external action.
pub fn spawn_bridge(
    hardware: &HardwareConfig,
    safety: &SafetyConfig,
    shared: Arc<SharedState>,
) -> Result<LoopHandle, BridgeError> {
    let port = serialport::new(hardware.port.as_str(), hardware.baud_rate)
        .timeout(Duration::from_millis(1))
        .open()
        .map_err(|source| BridgeError::Open {
            port: hardware.port.clone(),
            source,
        })?;

    info!(
        port = %hardware.port,
        baud = hardware.baud_rate,
        "serial link opened"
    );

    let mut bridge = HardwareBridge::new(port, shared, safety, hardware.invert_command);

    Ok(
        LoopBuilder::new("bridge", BRIDGE_PERIOD).spawn(move || match bridge.tick() {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                error!(%err, "serial fault, stopping bridge loop");
                ControlFlow::Break(())
            }
        }),
    )
}
