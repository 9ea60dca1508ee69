//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate, never on each other's internals.
//!
//! ## Time Model
//! - Both input streams share one clock: milliseconds since the Unix epoch (`u64`)
//! - Telemetry may lag positions; ordering is only guaranteed per vehicle, per stream

mod blueprint;
mod emission;
mod engine_config;
mod error;
mod event;
mod fleet;
mod sink;
mod state;
mod window;

pub use blueprint::*;
pub use emission::*;
pub use engine_config::*;
pub use error::*;
pub use event::*;
pub use fleet::*;
pub use sink::*;
pub use state::*;
pub use window::*;

/// Vehicle identifier. Opaque; every distinct value is a distinct vehicle.
pub type VehicleId = String;

/// Event time in milliseconds since the Unix epoch.
pub type TimestampMs = u64;
