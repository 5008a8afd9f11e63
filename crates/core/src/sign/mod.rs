//! Sign controllers and the actors that run them.

mod actor;
mod controller;
mod fleet;
mod handle;
mod sink;
mod types;

pub use actor::SignActor;
pub use controller::SignController;
pub use fleet::SignFleet;
pub use handle::{SignCommand, SignHandle};
pub use sink::{NullRenderSink, RenderSink};
pub use types::{ActiveShowState, SignError, SignStatus, Transition};
