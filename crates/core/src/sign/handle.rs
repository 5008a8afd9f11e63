use tokio::sync::{mpsc, oneshot};

use super::types::{SignError, SignStatus};
use crate::ingest::ShowEvent;

/// Messages accepted by a sign actor.
#[derive(Debug)]
pub enum SignCommand {
    Show(ShowEvent),
    PlaybackComplete {
        cue: u64,
        reply: oneshot::Sender<bool>,
    },
    Status(oneshot::Sender<SignStatus>),
}

/// Cloneable address of one sign actor.
#[derive(Debug, Clone)]
pub struct SignHandle {
    sign_id: String,
    tx: mpsc::Sender<SignCommand>,
}

impl SignHandle {
    pub fn new(sign_id: impl Into<String>, tx: mpsc::Sender<SignCommand>) -> Self {
        Self {
            sign_id: sign_id.into(),
            tx,
        }
    }

    pub fn sign_id(&self) -> &str {
        &self.sign_id
    }

    /// Queue a show event. Waits for room if the queue is full.
    pub async fn deliver(&self, event: ShowEvent) -> Result<(), SignError> {
        self.tx
            .send(SignCommand::Show(event))
            .await
            .map_err(|_| self.stopped())
    }

    /// Report that the video shown under `cue` finished.
    ///
    /// Returns whether the sign advanced (false for a stale cue).
    pub async fn playback_complete(&self, cue: u64) -> Result<bool, SignError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SignCommand::PlaybackComplete { cue, reply })
            .await
            .map_err(|_| self.stopped())?;
        rx.await.map_err(|_| self.stopped())
    }

    pub async fn status(&self) -> Result<SignStatus, SignError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SignCommand::Status(reply))
            .await
            .map_err(|_| self.stopped())?;
        rx.await.map_err(|_| self.stopped())
    }

    fn stopped(&self) -> SignError {
        SignError::Stopped(self.sign_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_enqueues_show_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = SignHandle::new("left", tx);

        handle.deliver(ShowEvent::new("Heat", None)).await.unwrap();
        match rx.recv().await {
            Some(SignCommand::Show(event)) => assert_eq!(event.raw_name, "Heat"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_playback_complete_waits_for_reply() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = SignHandle::new("left", tx);

        let mut pending = tokio_test::task::spawn(handle.playback_complete(5));
        tokio_test::assert_pending!(pending.poll());

        match rx.recv().await {
            Some(SignCommand::PlaybackComplete { cue, reply }) => {
                assert_eq!(cue, 5);
                reply.send(true).unwrap();
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(tokio_test::assert_ready!(pending.poll()), Ok(true));
    }

    #[tokio::test]
    async fn test_closed_queue_reports_stopped() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let handle = SignHandle::new("left", tx);

        assert_eq!(
            handle.deliver(ShowEvent::new("Heat", None)).await,
            Err(SignError::Stopped("left".to_string()))
        );
        assert_eq!(
            handle.playback_complete(3).await,
            Err(SignError::Stopped("left".to_string()))
        );
    }

    #[tokio::test]
    async fn test_dropped_reply_reports_stopped() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = SignHandle::new("left", tx);

        let responder = tokio::spawn(async move {
            // Receive and drop the request without answering.
            let _ = rx.recv().await;
        });
        assert!(handle.status().await.is_err());
        responder.await.unwrap();
    }
}
