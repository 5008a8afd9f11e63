//! WebSocket render stream: directives out to a sign's renderer, playback
//! completions back in.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use marquee_core::{RenderDirective, RenderSink};

use super::handlers::ErrorResponse;
use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES};
use crate::state::AppState;

/// Message a renderer may send back on its render stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RendererMessage {
    /// The video shown under `cue` reached its end.
    PlaybackComplete { cue: u64 },
}

/// Fans render directives out to connected renderers.
///
/// This is the sign fleet's `RenderSink`; every directive goes to every
/// subscriber and each connection keeps the ones for its own sign.
#[derive(Debug, Clone)]
pub struct RenderBroadcaster {
    sender: broadcast::Sender<RenderDirective>,
}

impl RenderBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to receive directives.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderDirective> {
        self.sender.subscribe()
    }
}

impl Default for RenderBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

impl RenderSink for RenderBroadcaster {
    fn publish(&self, directive: &RenderDirective) {
        // No renderer connected is not an error.
        let _ = self.sender.send(directive.clone());
    }
}

fn directive_type(directive: &RenderDirective) -> &'static str {
    match directive {
        RenderDirective::Show { .. } => "show",
        RenderDirective::Idle { .. } => "idle",
    }
}

/// WebSocket upgrade handler for `GET /signs/{id}/render`.
pub async fn render_stream(
    ws: WebSocketUpgrade,
    Path(sign_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if let Err(e) = state.fleet().handle(&sign_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, sign_id))
}

/// What the sign is showing right now, straight from its actor.
async fn current_directive(state: &AppState, sign_id: &str) -> Option<RenderDirective> {
    match state.fleet().status(sign_id).await {
        Ok(status) => Some(status.directive),
        Err(e) => {
            warn!(sign_id = %sign_id, "No current directive for renderer: {}", e);
            None
        }
    }
}

/// Handle a single renderer connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, sign_id: String) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before asking for the current directive so nothing published
    // in between is lost. The renderer may see that directive twice.
    let mut rx = state.renderers().subscribe();
    let current = current_directive(&state, &sign_id).await;

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!(sign_id = %sign_id, "Renderer connected");

    let stream_sign = sign_id.clone();
    let stream_state = Arc::clone(&state);
    let send_task = tokio::spawn(async move {
        let mut pending = current;
        loop {
            let received = match pending.take() {
                Some(directive) => Ok(directive),
                None => rx.recv().await,
            };
            let directive = match received {
                Ok(directive) if directive.sign_id() == stream_sign => directive,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(sign_id = %stream_sign, "Renderer lagged, skipped {} directives", n);
                    WS_LAG_EVENTS.inc();
                    // The skipped directives may include a new cue for this
                    // sign. Drop the backlog and resend what is showing now.
                    rx = rx.resubscribe();
                    match current_directive(&stream_state, &stream_sign).await {
                        Some(directive) => directive,
                        None => continue,
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Render broadcast channel closed");
                    break;
                }
            };

            WS_MESSAGES
                .with_label_values(&["out", directive_type(&directive)])
                .inc();
            match serde_json::to_string(&directive) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, renderer disconnected");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize RenderDirective: {}", e);
                }
            }
        }
    });

    // Completions from the renderer
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<RendererMessage>(text.as_str()) {
                Ok(RendererMessage::PlaybackComplete { cue }) => {
                    WS_MESSAGES
                        .with_label_values(&["in", "playback_complete"])
                        .inc();
                    match state.fleet().playback_complete(&sign_id, cue).await {
                        Ok(advanced) => debug!(sign_id = %sign_id, cue, advanced, "Playback complete"),
                        Err(e) => {
                            warn!(sign_id = %sign_id, "Playback completion not delivered: {}", e);
                            break;
                        }
                    }
                }
                Err(e) => {
                    WS_MESSAGES.with_label_values(&["in", "invalid"]).inc();
                    debug!(sign_id = %sign_id, "Ignoring renderer message: {}", e);
                }
            },
            Ok(Message::Close(_)) => {
                debug!("Renderer requested close");
                break;
            }
            Ok(_) => {
                // Ping/pong is handled by axum
            }
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!(sign_id = %sign_id, "Renderer disconnected");
}
