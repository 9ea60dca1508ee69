//! # Emission Model
//!
//! Pure per-reading emission inference:
//! - `model`: CO₂ estimate from speed, load and idle time
//! - `classifier`: compliance alert rules
//! - `transform`: `VehicleState` -> `EmissionRecord`
//!
//! Everything here is deterministic and side-effect free (apart from tracing).

mod classifier;
mod model;
mod transform;

pub use classifier::{classify, AlertDecision};
pub use model::{estimate, load_penalty, speed_multiplier, EmissionEstimate};
pub use transform::EmissionTransform;
