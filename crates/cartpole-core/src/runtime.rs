//! Fixed-rate loop scheduling
//!
//! Every active loop of a session (plant or hardware bridge, controller)
//! runs on its own thread at a fixed period. A tick measures its own
//! wall-clock execution time and the scheduler sleeps away the remainder
//! of the period; missed ticks are never caught up, so persistent overrun
//! degrades the effective rate instead of failing.
//!
//! Shutdown is message-passing: dropping or signaling the handle ends the
//! loop between ticks. No in-flight work is interrupted.

use std::ops::ControlFlow;
use std::sync::mpsc::{self, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Handle of a spawned loop; signals shutdown on [`LoopHandle::stop`].
pub struct LoopHandle {
    name: &'static str,
    shutdown: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Request shutdown and join the loop thread.
    pub fn stop(mut self) {
        // A dead receiver means the loop already ended on its own
        let _ = self.shutdown.send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(loop_name = self.name, "loop thread panicked");
            }
        }
    }

    /// True once the loop thread has exited (tick returned `Break`,
    /// panicked, or reacted to shutdown).
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map(|thread| thread.is_finished())
            .unwrap_or(true)
    }
}

/// Builder for a fixed-rate loop.
pub struct LoopBuilder {
    name: &'static str,
    period: Duration,
    duration_sink: Option<Box<dyn Fn(f64) + Send>>,
}

impl LoopBuilder {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            duration_sink: None,
        }
    }

    /// Report each tick's measured execution time [s] through `sink`.
    ///
    /// The control loop wires this to the shared `loop_time` cell so the
    /// display layer can watch scheduling headroom.
    pub fn duration_sink(mut self, sink: impl Fn(f64) + Send + 'static) -> Self {
        self.duration_sink = Some(Box::new(sink));
        self
    }

    /// Spawn the loop thread. `tick` runs once per period until it
    /// returns [`ControlFlow::Break`] or the handle signals shutdown.
    pub fn spawn(
        self,
        mut tick: impl FnMut() -> ControlFlow<()> + Send + 'static,
    ) -> LoopHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let name = self.name;
        let period = self.period;
        let sink = self.duration_sink;

        let thread = thread::spawn(move || {
            info!(loop_name = name, period_ms = period.as_millis() as u64, "loop started");
            loop {
                match shutdown_rx.try_recv() {
                    Err(TryRecvError::Empty) => {}
                    // Signaled or handle dropped: stop between ticks
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                }

                let start = Instant::now();
                let flow = tick();
                let elapsed = start.elapsed();

                if let Some(sink) = &sink {
                    sink(elapsed.as_secs_f64());
                }
                if flow.is_break() {
                    break;
                }
                if elapsed < period {
                    thread::sleep(period - elapsed);
                }
            }
            info!(loop_name = name, "loop ended");
        });

        LoopHandle {
            name,
            shutdown: shutdown_tx,
            thread: Some(thread),
        }
    }
}

/// Stalled-controller watchdog.
///
/// The plant (or hardware bridge) side feeds every tick's command through
/// the watchdog together with the command sequence number. While the
/// controller keeps writing, commands pass through untouched. Once the
/// sequence stops advancing for more than the horizon, the last command
/// decays geometrically toward zero instead of being held forever — a
/// crashed control loop must not leave the motor pushing.
#[derive(Debug, Clone)]
pub struct CommandWatchdog {
    /// Ticks a command may stay unrefreshed before decay starts
    horizon: u32,
    /// Per-tick decay factor once stale
    decay: f64,
    last_seq: Option<u64>,
    stale_ticks: u32,
    held: f64,
}

impl CommandWatchdog {
    pub fn new(horizon: u32, decay: f64) -> Self {
        Self {
            horizon,
            decay,
            last_seq: None,
            stale_ticks: 0,
            held: 0.0,
        }
    }

    /// Pass a command through, decaying it if the writer has stalled.
    pub fn filter(&mut self, seq: u64, command: f64) -> f64 {
        if self.last_seq != Some(seq) {
            self.last_seq = Some(seq);
            self.stale_ticks = 0;
            self.held = command;
            return command;
        }

        self.stale_ticks = self.stale_ticks.saturating_add(1);
        if self.stale_ticks == self.horizon + 1 {
            warn!(
                stale_ticks = self.stale_ticks,
                "command writer stalled, decaying command toward zero"
            );
        }
        if self.stale_ticks > self.horizon {
            self.held *= self.decay;
        }
        self.held
    }
}

impl Default for CommandWatchdog {
    fn default() -> Self {
        // Half a second of grace at the 100 Hz control rate
        Self::new(50, 0.8)
    }
}
