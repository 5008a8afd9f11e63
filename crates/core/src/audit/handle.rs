use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, warn};

use super::AuditEvent;
use crate::metrics::AUDIT_EVENTS_DROPPED;

/// An audit event stamped with the time it was emitted.
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl AuditEventEnvelope {
    fn now(event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Sending side of the audit log.
///
/// The ingest gateway and reload path use [`emit`](Self::emit) and may wait
/// for room in the channel. Sign actors use [`try_emit`](Self::try_emit):
/// a sign keeps rotating even when the writer falls behind, and the lost
/// transition is counted in `marquee_audit_events_dropped_total`.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Queue an event, waiting for channel capacity.
    ///
    /// Fails only when the writer is gone; that is logged, not returned.
    pub async fn emit(&self, event: AuditEvent) {
        let event_type = event.event_type();
        if self.tx.send(AuditEventEnvelope::now(event)).await.is_err() {
            AUDIT_EVENTS_DROPPED.with_label_values(&["closed"]).inc();
            error!(event_type, "Audit writer is gone, event dropped");
        }
    }

    /// Queue an event if there is room right now. Returns false if it was dropped.
    pub fn try_emit(&self, event: AuditEvent) -> bool {
        match self.tx.try_send(AuditEventEnvelope::now(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(envelope)) => {
                AUDIT_EVENTS_DROPPED.with_label_values(&["full"]).inc();
                warn!(
                    event_type = envelope.event.event_type(),
                    sign_id = envelope.event.sign_id(),
                    "Audit channel full, event dropped"
                );
                false
            }
            Err(TrySendError::Closed(envelope)) => {
                AUDIT_EVENTS_DROPPED.with_label_values(&["closed"]).inc();
                error!(
                    event_type = envelope.event.event_type(),
                    "Audit writer is gone, event dropped"
                );
                false
            }
        }
    }
}
