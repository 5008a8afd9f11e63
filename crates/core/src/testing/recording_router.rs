use std::sync::Mutex;

use async_trait::async_trait;

use crate::ingest::{Routing, ShowEvent, ShowRouter};

/// Show router that records events and reports a fixed set of recipients.
#[derive(Debug, Default)]
pub struct RecordingRouter {
    events: Mutex<Vec<ShowEvent>>,
    recipients: Vec<String>,
}

impl RecordingRouter {
    /// Report every event as delivered to `sign_ids`.
    pub fn delivering(sign_ids: &[&str]) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            recipients: sign_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn events(&self) -> Vec<ShowEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShowRouter for RecordingRouter {
    async fn route(&self, event: ShowEvent) -> Routing {
        self.events.lock().unwrap().push(event);
        Routing {
            delivered_to: self.recipients.clone(),
            dropped: Vec::new(),
        }
    }
}
