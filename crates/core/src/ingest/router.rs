use async_trait::async_trait;
use serde::Serialize;

use super::types::ShowEvent;

/// Where a show event ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Routing {
    /// Signs whose queue accepted the event.
    pub delivered_to: Vec<String>,
    /// Addressed signs whose controller is no longer running.
    pub dropped: Vec<String>,
}

impl Routing {
    /// No sign was addressed at all.
    pub fn is_unrouted(&self) -> bool {
        self.delivered_to.is_empty() && self.dropped.is_empty()
    }
}

/// Delivers parsed show events to sign controllers.
#[async_trait]
pub trait ShowRouter: Send + Sync {
    /// Queue `event` for every sign in its auditorium, or for every sign when
    /// it carries no auditorium.
    async fn route(&self, event: ShowEvent) -> Routing;
}
