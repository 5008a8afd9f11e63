use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AuditEventEnvelope, AuditHandle, AuditRecord, AuditStore};

/// Background task that persists audit events
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditEventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Consume events until every `AuditHandle` has been dropped.
    ///
    /// Spawn this as a background task. Store failures are logged and skipped.
    pub async fn run(mut self) {
        tracing::info!("Audit writer started");

        while let Some(envelope) = self.rx.recv().await {
            let record = AuditRecord {
                id: 0, // assigned by the store
                timestamp: envelope.timestamp,
                event_type: envelope.event.event_type().to_string(),
                sign_id: envelope.event.sign_id().map(String::from),
                auditorium: envelope.event.auditorium().map(String::from),
                data: envelope.event,
            };

            if let Err(e) = self.store.insert(&record) {
                tracing::error!(event_type = %record.event_type, "Failed to write audit event: {}", e);
            }
        }

        tracing::info!("Audit writer shutting down");
    }
}

/// Create a complete audit system
///
/// Returns the `AuditHandle` to clone into components and the `AuditWriter`
/// to spawn with `tokio::spawn(writer.run())`.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = AuditHandle::new(tx);
    let writer = AuditWriter::new(rx, store);
    (handle, writer)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::audit::{AuditError, AuditEvent, AuditFilter};

    /// Store that keeps records in memory, optionally failing every insert
    struct MemoryStore {
        records: Mutex<Vec<AuditRecord>>,
        should_fail: bool,
    }

    impl MemoryStore {
        fn new(should_fail: bool) -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                should_fail,
            })
        }

        fn records(&self) -> Vec<AuditRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    impl AuditStore for MemoryStore {
        fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
            if self.should_fail {
                return Err(AuditError::Database("disk full".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            let mut stored = record.clone();
            stored.id = records.len() as i64 + 1;
            records.push(stored);
            Ok(records.len() as i64)
        }

        fn query(&self, _filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
            Ok(self.records())
        }

        fn count(&self, _filter: &AuditFilter) -> Result<i64, AuditError> {
            Ok(self.records.lock().unwrap().len() as i64)
        }
    }

    fn transition(sign_id: &str) -> AuditEvent {
        AuditEvent::SignTransition {
            sign_id: sign_id.to_string(),
            auditorium: Some("4".to_string()),
            kind: "started".to_string(),
            raw_name: Some("Heat".to_string()),
            pattern: Some("Heat".to_string()),
            profile_id: None,
            revision: 1,
        }
    }

    #[tokio::test]
    async fn test_writer_persists_events_in_order() {
        let store = MemoryStore::new(false);
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let writer_task = tokio::spawn(writer.run());

        handle
            .emit(AuditEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc".to_string(),
            })
            .await;
        handle.emit(transition("lobby-left")).await;
        handle
            .emit(AuditEvent::ServiceStopped {
                reason: "graceful_shutdown".to_string(),
            })
            .await;
        drop(handle);
        writer_task.await.unwrap();

        let records = store.records();
        let types: Vec<_> = records.iter().map(|r| r.event_type.as_str()).collect();
        assert_eq!(types, ["service_started", "sign_transition", "service_stopped"]);
    }

    #[tokio::test]
    async fn test_writer_extracts_sign_and_auditorium() {
        let store = MemoryStore::new(false);
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let writer_task = tokio::spawn(writer.run());

        handle.emit(transition("lobby-right")).await;
        drop(handle);
        writer_task.await.unwrap();

        let records = store.records();
        assert_eq!(records[0].sign_id.as_deref(), Some("lobby-right"));
        assert_eq!(records[0].auditorium.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_writer_continues_on_insert_failure() {
        let store = MemoryStore::new(true);
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let writer_task = tokio::spawn(writer.run());

        handle.emit(transition("a")).await;
        handle.emit(transition("b")).await;
        drop(handle);

        writer_task.await.unwrap();
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_writer_waits_for_all_handles_to_drop() {
        let store = MemoryStore::new(false);
        let (main_handle, writer) = create_audit_system(store.clone(), 10);
        let sign_handle = main_handle.clone();
        let writer_task = tokio::spawn(writer.run());

        assert!(sign_handle.try_emit(transition("a")));
        drop(main_handle);
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        assert!(!writer_task.is_finished());

        drop(sign_handle);
        let result = tokio::time::timeout(tokio::time::Duration::from_secs(1), writer_task).await;
        assert!(result.is_ok(), "writer should exit once all handles are gone");
        assert_eq!(store.records().len(), 1);
    }
}
