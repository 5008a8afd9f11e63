use std::sync::Mutex;

use crate::rotation::RenderDirective;
use crate::sign::RenderSink;

/// Render sink that remembers every directive it was given.
#[derive(Debug, Default)]
pub struct RecordingRenderSink {
    directives: Mutex<Vec<RenderDirective>>,
}

impl RecordingRenderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    pub fn directives(&self) -> Vec<RenderDirective> {
        self.directives.lock().unwrap().clone()
    }

    pub fn for_sign(&self, sign_id: &str) -> Vec<RenderDirective> {
        self.directives
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.sign_id() == sign_id)
            .cloned()
            .collect()
    }

    pub fn last_for(&self, sign_id: &str) -> Option<RenderDirective> {
        self.for_sign(sign_id).pop()
    }

    pub fn clear(&self) {
        self.directives.lock().unwrap().clear();
    }
}

impl RenderSink for RecordingRenderSink {
    fn publish(&self, directive: &RenderDirective) {
        self.directives.lock().unwrap().push(directive.clone());
    }
}
