//! Asset rotation for a single sign.

mod scheduler;
mod types;

pub use scheduler::RotationScheduler;
pub use types::{DisplayMode, RenderDirective, RotationState};
