//! # Cartpole Rig
//!
//! Hardware bridge for driving the physical cart-pendulum rig over a
//! serial link. Replaces the simulated plant loop of `cartpole-core`
//! when real hardware is attached:
//!
//! - [`frame`]: the fixed binary wire format (telemetry in, commands out)
//! - [`drive`]: motor output scaling with static-friction compensation
//!   and the motion safety envelope
//! - [`bridge`]: the per-tick read → control-apply → write loop owning
//!   the serial link

pub mod bridge;
pub mod drive;
pub mod frame;

pub use bridge::{spawn_bridge, BridgeError, HardwareBridge};
