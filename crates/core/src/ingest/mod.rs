//! Upload intake and show-event parsing.

mod gateway;
mod parser;
mod router;
mod types;

pub use gateway::IngestGateway;
pub use parser::{parse, ParseError, MAX_AUDITORIUM_CHARS, MAX_NAME_CHARS};
pub use router::{Routing, ShowRouter};
pub use types::{IngestError, IngestReceipt, ShowEvent};
