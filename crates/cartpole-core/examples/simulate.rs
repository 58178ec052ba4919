//! Run a simulated swing-up → stabilize session and print the state.
//!
//! ```sh
//! cargo run --example simulate
//! ```

use std::f64::consts::PI;
use std::time::Duration;

use cartpole_core::config::{ControllerConfig, InitialState, LqrGains, SessionConfig, SwingUpConfig};
use cartpole_core::session::{Session, SimulationModel};

fn main() {
    tracing_subscriber::fmt::init();

    let config = SessionConfig {
        initial: InitialState {
            theta: PI, // hanging down
            ..InitialState::default()
        },
        controller: ControllerConfig::Lqr(LqrGains::default()),
        swingup: Some(SwingUpConfig::default()),
        ..SessionConfig::default()
    };

    let mut session = Session::new(config);
    session.start_simulation(SimulationModel::Nonlinear);
    session.start_controller();

    let shared = session.shared();
    for _ in 0..40 {
        std::thread::sleep(Duration::from_millis(250));
        let snap = shared.snapshot();
        println!(
            "x = {:+.3} m  angle = {:.3} rad  u = {:+.2}  loop = {:.1} µs",
            snap.position,
            snap.angle,
            snap.control,
            snap.loop_time * 1e6,
        );
    }

    session.stop();
}
