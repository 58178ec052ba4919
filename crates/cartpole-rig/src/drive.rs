//! Motor output shaping and safety envelope
//!
//! The rig's DC motor does not move below a minimum drive level, so the
//! controller's continuous command is mapped onto `[threshold, 255]`
//! (sign preserved) with a fixed static-friction offset on any non-zero
//! output. Independently of the controller, the envelope forces the
//! command to zero whenever the pendulum leaves the stabilizable angle
//! band or the cart nears the end of its track.

use cartpole_core::config::SafetyConfig;

use crate::frame::COMMAND_LIMIT;

/// Controller command magnitude mapped to full motor output
const MAX_INPUT: f64 = 100.0;
/// Minimum drive level that actually moves the motor
const FRICTION_THRESHOLD: i16 = 10;

/// Map a controller command onto the motor's usable output range.
///
/// Zero stays zero; any other value is clipped to ±[`MAX_INPUT`], scaled
/// into the span above the static-friction threshold and offset by the
/// threshold so the motor always overcomes stiction.
pub fn scale_output(raw: f64) -> i16 {
    if raw == 0.0 {
        return 0;
    }

    let clipped = raw.clamp(-MAX_INPUT, MAX_INPUT);
    let norm = clipped / MAX_INPUT;
    let mut scaled = (norm * f64::from(COMMAND_LIMIT - FRICTION_THRESHOLD)) as i16;

    if scaled > 0 {
        scaled += FRICTION_THRESHOLD;
    } else if scaled < 0 {
        scaled -= FRICTION_THRESHOLD;
    }

    scaled
}

/// Motion safety envelope
///
/// Violations are not errors: the envelope zeroes the command, the loop
/// keeps running, and normal actuation resumes if the plant comes back
/// within bounds.
#[derive(Debug, Clone)]
pub struct SafetyEnvelope {
    /// Allowed angle band around upright [deg]
    max_angle_deg: f64,
    /// Allowed cart travel magnitude [mm]
    max_position: f64,
}

impl SafetyEnvelope {
    pub fn new(config: &SafetyConfig) -> Self {
        Self {
            max_angle_deg: config.max_angle_deg,
            max_position: config.max_position,
        }
    }

    /// True while the plant is inside the envelope.
    pub fn permits(&self, angle_rad: f64, position_mm: f64) -> bool {
        let angle_deg = angle_rad.to_degrees();
        angle_deg >= 180.0 - self.max_angle_deg
            && angle_deg <= 180.0 + self.max_angle_deg
            && position_mm.abs() <= self.max_position
    }

    /// The command to actually transmit: the scaled controller command
    /// inside the envelope, exactly zero outside.
    pub fn apply(&self, command: i16, angle_rad: f64, position_mm: f64) -> i16 {
        if self.permits(angle_rad, position_mm) {
            command
        } else {
            0
        }
    }
}
