pub mod audit;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod routes;
pub mod signs;
pub mod ws;

pub use routes::create_router;
pub use ws::{RenderBroadcaster, RendererMessage};
