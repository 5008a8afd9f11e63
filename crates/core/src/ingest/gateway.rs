//! Upload intake: authenticate, parse, route.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::parser;
use super::router::ShowRouter;
use super::types::{IngestError, IngestReceipt};
use crate::audit::{AuditEvent, AuditHandle};
use crate::auth::{create_authenticator, UploadSession};
use crate::config::ConfigStore;
use crate::metrics::{SHOW_EVENTS_DELIVERED, SHOW_EVENTS_UNROUTED, UPLOADS_TOTAL};

/// Turns authenticated uploads into show events for the sign fleet.
///
/// Parsing is stateless, so concurrent uploads need no coordination here;
/// ordering per sign is provided by each sign's command queue.
pub struct IngestGateway {
    config: ConfigStore,
    router: Arc<dyn ShowRouter>,
    audit: Option<AuditHandle>,
}

impl IngestGateway {
    pub fn new(config: ConfigStore, router: Arc<dyn ShowRouter>, audit: Option<AuditHandle>) -> Self {
        Self {
            config,
            router,
            audit,
        }
    }

    /// Handle one upload session.
    ///
    /// The body is not looked at unless the session authenticates against the
    /// password of the active configuration.
    pub async fn ingest(
        &self,
        session: &UploadSession,
        body: &[u8],
    ) -> Result<IngestReceipt, IngestError> {
        let upload_id = Uuid::new_v4().to_string();
        let snapshot = self.config.snapshot();
        let ingest_config = &snapshot.config().ingest;
        let source_ip = session.source_ip.map(|ip| ip.to_string());

        let authenticator = create_authenticator(ingest_config);
        if let Err(e) = authenticator.authenticate(session).await {
            warn!(upload_id = %upload_id, source_ip = ?source_ip, "Upload rejected: {}", e);
            UPLOADS_TOTAL.with_label_values(&[e.reason()]).inc();
            self.emit(AuditEvent::UploadRejected {
                upload_id,
                reason: e.reason().to_string(),
                source_ip,
            })
            .await;
            return Err(e.into());
        }

        let event = match parser::parse(body, ingest_config.max_upload_bytes) {
            Ok(event) => event,
            Err(e) => {
                warn!(upload_id = %upload_id, size_bytes = body.len(), "Upload not parsed: {}", e);
                UPLOADS_TOTAL.with_label_values(&["parse_failed"]).inc();
                self.emit(AuditEvent::UploadParseFailed {
                    upload_id,
                    error: e.to_string(),
                    size_bytes: body.len(),
                })
                .await;
                return Err(e.into());
            }
        };

        let raw_name = event.raw_name.clone();
        let auditorium = event.auditorium.clone();
        let routing = self.router.route(event).await;

        UPLOADS_TOTAL.with_label_values(&["accepted"]).inc();
        SHOW_EVENTS_DELIVERED.inc_by(routing.delivered_to.len() as u64);

        if !routing.dropped.is_empty() {
            warn!(upload_id = %upload_id, dropped = ?routing.dropped, "Show event not delivered to stopped signs");
        }

        match &auditorium {
            Some(aud) if routing.is_unrouted() => {
                SHOW_EVENTS_UNROUTED.inc();
                warn!(upload_id = %upload_id, auditorium = %aud, raw_name = %raw_name, "No sign in auditorium");
                self.emit(AuditEvent::ShowUnrouted {
                    upload_id: upload_id.clone(),
                    raw_name: raw_name.clone(),
                    auditorium: aud.clone(),
                })
                .await;
            }
            _ => {
                info!(
                    upload_id = %upload_id,
                    raw_name = %raw_name,
                    auditorium = ?auditorium,
                    signs = routing.delivered_to.len(),
                    "Show event delivered"
                );
            }
        }

        self.emit(AuditEvent::UploadAccepted {
            upload_id: upload_id.clone(),
            raw_name: raw_name.clone(),
            auditorium: auditorium.clone(),
            delivered_to: routing.delivered_to.clone(),
            source_ip,
        })
        .await;

        Ok(IngestReceipt {
            upload_id,
            raw_name,
            auditorium,
            delivered_to: routing.delivered_to,
        })
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.emit(event).await;
        }
    }
}
