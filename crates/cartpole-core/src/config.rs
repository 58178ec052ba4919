//! Session configuration
//!
//! Plain-data structures supplied by the embedding application at session
//! start. All values are immutable for the duration of a session; changing
//! a parameter means stopping the session and starting a new one.

use serde::{Deserialize, Serialize};

/// Physical parameters of the cart-pendulum plant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantParams {
    /// Cart mass [kg]
    pub cart_mass: f64,
    /// Pendulum mass [kg]
    pub pendulum_mass: f64,
    /// Length from pivot to pendulum center of mass [m]
    pub length: f64,
    /// Cart viscous friction coefficient [N·s/m]
    pub friction: f64,
    /// Pendulum pivot damping coefficient [N·m·s]
    pub damping: f64,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            cart_mass: 0.5,
            pendulum_mass: 0.2,
            length: 0.5,
            friction: 0.01,
            damping: 0.01,
        }
    }
}

/// Initial state of a simulated plant
///
/// The pendulum starts near the given deviation from upright with a small
/// random jitter on angle and angular velocity, so a stabilizing
/// controller never sees a perfectly unstable equilibrium.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialState {
    /// Start deviation from upright [rad] (0 = upright, π = hanging down)
    pub theta: f64,
    /// Uniform jitter amplitude on the start angle [rad]
    pub theta_jitter: f64,
    /// Uniform jitter amplitude on the start angular velocity [rad/s]
    pub theta_dot_jitter: f64,
    /// RNG seed for the jitter
    pub seed: u64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            theta: 0.0,
            theta_jitter: 0.2,
            theta_dot_jitter: 0.1,
            seed: 12345,
        }
    }
}

/// Gains of a single PID loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        // Stabilizes the simulated plant near upright
        Self {
            kp: 20.0,
            ki: 0.0,
            kd: 1.0,
        }
    }
}

/// Configuration of the cascaded position/angle controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadedConfig {
    /// Outer loop: cart position → desired angle offset
    pub outer: PidGains,
    /// Inner loop: pendulum angle → actuation command
    pub inner: PidGains,
    /// The outer loop recomputes its offset every this many inner ticks;
    /// skipped ticks reuse the last offset
    pub outer_divisor: u32,
    /// Position error magnitude below which the outer loop outputs a zero
    /// offset and resets its integral
    pub deadband: f64,
    /// Angle error magnitude beyond which the inner integral freezes [rad]
    pub max_controllable_angle: f64,
}

impl Default for CascadedConfig {
    fn default() -> Self {
        Self {
            outer: PidGains {
                kp: 1.0,
                ki: 0.0,
                kd: 0.0,
            },
            inner: PidGains::default(),
            outer_divisor: 1,
            deadband: 0.3,
            max_controllable_angle: 15f64.to_radians(),
        }
    }
}

/// Full-state feedback gains for the LQR controller
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LqrGains {
    /// Cart position gain
    pub k_x: f64,
    /// Cart velocity gain
    pub k_x_dot: f64,
    /// Angle deviation gain
    pub k_theta: f64,
    /// Angular velocity gain
    pub k_theta_dot: f64,
}

impl Default for LqrGains {
    fn default() -> Self {
        Self {
            k_x: 1.0,
            k_x_dot: 1.0,
            k_theta: 20.0,
            k_theta_dot: 1.5,
        }
    }
}

/// Swing-up strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingUpStrategy {
    /// Energy-shaping pump law
    Energy,
    /// Bang-bang quadrant pumping with an initial kick
    Phase,
}

/// Swing-up stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingUpConfig {
    pub strategy: SwingUpStrategy,
    /// Deviation from upright below which a tick counts toward the catch
    /// window [rad]
    pub catch_angle: f64,
    /// Angular velocity magnitude below which a tick counts toward the
    /// catch window [rad/s]
    pub catch_momentum: f64,
    /// Consecutive in-threshold ticks required before handoff
    pub stable_window: u32,
    /// Energy pump gain (energy strategy)
    pub energy_gain: f64,
    /// Constant pump force magnitude (phase strategy) [N]
    pub pump_force: f64,
    /// Symmetry-breaking kick force magnitude (phase strategy) [N]
    pub kick_force: f64,
    /// Kick phase duration (phase strategy) [s]
    pub kick_duration: f64,
    /// Cart travel beyond which the pull-back correction engages
    pub max_cart_range: f64,
    /// Actuation clamp applied to the swing-up command [N]
    pub max_force: f64,
}

impl Default for SwingUpConfig {
    fn default() -> Self {
        Self {
            strategy: SwingUpStrategy::Energy,
            catch_angle: 0.2,
            catch_momentum: 0.5,
            stable_window: 20,
            energy_gain: 10.0,
            pump_force: 3.62,
            kick_force: 5.0,
            kick_duration: 0.3,
            max_cart_range: 0.5,
            max_force: 10.0,
        }
    }
}

/// Stabilizing controller selection with its tuning values.
///
/// Serialized with a `type` tag so the embedding configuration layer can
/// express the selection as data; see [`crate::control::registry`] for the
/// matching parameter schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerConfig {
    Pid(PidGains),
    CascadedPid(CascadedConfig),
    Lqr(LqrGains),
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::Pid(PidGains::default())
    }
}

/// Serial link and unit-conversion constants of the physical rig
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// Serial port identifier, e.g. `/dev/ttyACM0` or `COM5`
    pub port: String,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Flip the sign of the transmitted command (motor wiring polarity)
    pub invert_command: bool,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".into(),
            baud_rate: 115_200,
            invert_command: true,
        }
    }
}

/// Safety envelope enforced by the hardware bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Allowed angle deviation from upright (180°) [deg]
    pub max_angle_deg: f64,
    /// Allowed cart travel magnitude [mm]
    pub max_position: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_angle_deg: 15.0,
            max_position: 220.0,
        }
    }
}

/// Everything a control session needs at start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub plant: PlantParams,
    pub initial: InitialState,
    pub controller: ControllerConfig,
    /// Swing-up stage to run before the stabilizer; `None` starts the
    /// stabilizer directly
    pub swingup: Option<SwingUpConfig>,
    pub hardware: HardwareConfig,
    pub safety: SafetyConfig,
}
