//! Serial wire format
//!
//! The rig's microcontroller streams 5-byte telemetry frames and accepts
//! 3-byte command frames:
//!
//! ```text
//! device → host:  [0xAA][u16 LE raw position][u16 LE raw angle]
//! host → device:  [0x55][i16 LE command]
//! ```
//!
//! Telemetry arrives faster than the host consumes it, so a read drains
//! everything buffered and only the most recent complete frame counts.
//! Partial or garbled data simply yields no frame for that tick.

use std::f64::consts::PI;

/// Telemetry frame sync byte
pub const TELEMETRY_SYNC: u8 = 0xAA;
/// Command frame sync byte
pub const COMMAND_SYNC: u8 = 0x55;
/// Telemetry frame length including sync
pub const TELEMETRY_LEN: usize = 5;

/// Encoder counts per pendulum revolution
const ANGLE_COUNTS_PER_REV: f64 = 1200.0;
/// Raw count of the track center
const POSITION_CENTER: f64 = 16220.0 / 2.0;
/// Encoder counts per millimeter of cart travel
const POSITION_COUNTS_PER_MM: f64 = 27.0;

/// Motor command ceiling accepted by the firmware
pub const COMMAND_LIMIT: i16 = 255;

/// One decoded telemetry frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telemetry {
    /// Raw cart position count
    pub raw_position: u16,
    /// Raw angle count in [0, 1200)
    pub raw_angle: u16,
}

impl Telemetry {
    /// Cart position [mm], zero at track center
    pub fn position_mm(&self) -> f64 {
        (f64::from(self.raw_position) - POSITION_CENTER) / POSITION_COUNTS_PER_MM
    }

    /// Pendulum angle [rad] in the canonical convention (0 = hanging down)
    pub fn angle_rad(&self) -> f64 {
        f64::from(self.raw_angle) * 2.0 * PI / ANGLE_COUNTS_PER_REV
    }
}

/// Find the most recent complete telemetry frame in a drained buffer.
///
/// Scans backward from the end for a sync byte followed by a full 4-byte
/// payload; earlier frames and trailing partial frames are discarded.
/// Returns `None` when the buffer holds no complete frame.
pub fn find_last_frame(buffer: &[u8]) -> Option<Telemetry> {
    if buffer.len() < TELEMETRY_LEN {
        return None;
    }
    for i in (0..=buffer.len() - TELEMETRY_LEN).rev() {
        if buffer[i] == TELEMETRY_SYNC {
            let payload = &buffer[i + 1..i + TELEMETRY_LEN];
            return Some(Telemetry {
                raw_position: u16::from_le_bytes([payload[0], payload[1]]),
                raw_angle: u16::from_le_bytes([payload[2], payload[3]]),
            });
        }
    }
    None
}

/// Encode a motor command frame, clamping to the firmware's ±255 range.
pub fn encode_command(command: i16) -> [u8; 3] {
    let clamped = command.clamp(-COMMAND_LIMIT, COMMAND_LIMIT);
    let bytes = clamped.to_le_bytes();
    [COMMAND_SYNC, bytes[0], bytes[1]]
}
