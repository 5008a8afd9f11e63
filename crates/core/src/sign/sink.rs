use crate::rotation::RenderDirective;

/// Consumer of render directives (the display surface).
///
/// Called from sign actors on their tick path, so implementations must not
/// block: hand the directive off and return.
pub trait RenderSink: Send + Sync {
    fn publish(&self, directive: &RenderDirective);
}

/// Sink that drops every directive.
#[derive(Debug, Default)]
pub struct NullRenderSink;

impl RenderSink for NullRenderSink {
    fn publish(&self, _directive: &RenderDirective) {}
}
