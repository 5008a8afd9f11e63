//! Operator diagnostics: an append-only log of uploads, reloads and sign
//! transitions.

mod events;
mod handle;
mod sqlite;
mod store;
mod writer;

pub use events::*;
pub use handle::*;
pub use sqlite::*;
pub use store::*;
pub use writer::*;
