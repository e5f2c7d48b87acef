//! WebSocket upgrade handlers for the feed relay and the renderer

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::snapshot::{parse_feed, FeedMsg};
use crate::game::SessionInput;
use crate::util::rate_limit::{BridgeRateLimiter, RENDER_RATE_LIMIT};
use crate::ws::protocol::RenderMsg;

type WsStream = futures::stream::SplitStream<WebSocket>;

/// Feed relay upgrade handler
pub async fn feed_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("Feed relay connecting");
    ws.on_upgrade(move |socket| handle_feed(socket, state))
}

/// Renderer upgrade handler
pub async fn render_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("Renderer connecting");
    ws.on_upgrade(move |socket| handle_render(socket, state))
}

/// Parse one feed frame. Malformed snapshots are dropped with a warning and
/// leave the session untouched.
pub fn route_feed(text: &str) -> Option<SessionInput> {
    match parse_feed(text) {
        Ok(FeedMsg::Snapshot(snapshot)) => Some(SessionInput::Snapshot(snapshot)),
        Ok(FeedMsg::Status(status)) => Some(SessionInput::Status(status)),
        Err(e) => {
            warn!(error = %e, "Rejected feed message, keeping previous state");
            None
        }
    }
}

/// Parse one renderer frame
pub fn route_render(text: &str) -> Option<SessionInput> {
    match RenderMsg::parse(text) {
        Ok(RenderMsg::TargetFound { player }) => Some(SessionInput::TargetSignal {
            player,
            acquired: true,
        }),
        Ok(RenderMsg::TargetLost { player }) => Some(SessionInput::TargetSignal {
            player,
            acquired: false,
        }),
        Ok(RenderMsg::LocalAction { action }) => Some(SessionInput::LocalAction(action)),
        Err(e) => {
            warn!(error = %e, "Rejected renderer message");
            None
        }
    }
}

async fn handle_feed(socket: WebSocket, state: AppState) {
    let (mut ws_sink, ws_stream) = socket.split();

    // Writer task: notifications -> relay
    let mut notify_rx = state.session.notify_tx.subscribe();
    let writer_handle = tokio::spawn(async move {
        loop {
            match notify_rx.recv().await {
                Ok(notification) => {
                    if let Err(e) = ws_sink.send(Message::Text(notification.topic())).await {
                        debug!(error = %e, "Feed send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged_count = n, "Feed relay lagged, skipping {} notifications", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Notification channel closed");
                    break;
                }
            }
        }
    });

    let limiter = BridgeRateLimiter::new(state.config.feed_rate_limit);
    read_loop("feed", ws_stream, &limiter, &state, route_feed).await;

    writer_handle.abort();
    info!("Feed relay disconnected");
}

async fn handle_render(socket: WebSocket, state: AppState) {
    let (mut ws_sink, ws_stream) = socket.split();

    // Writer task: render frames -> renderer
    let mut frame_rx = state.session.frame_tx.subscribe();
    let writer_handle = tokio::spawn(async move {
        loop {
            match frame_rx.recv().await {
                Ok(frame) => {
                    let json = match serde_json::to_string(&frame) {
                        Ok(json) => json,
                        Err(e) => {
                            error!(error = %e, "Failed to encode render frame");
                            continue;
                        }
                    };
                    if let Err(e) = ws_sink.send(Message::Text(json)).await {
                        debug!(error = %e, "Renderer send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Frames are full state, the next one catches up
                    debug!(lagged_count = n, "Renderer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Frame channel closed");
                    break;
                }
            }
        }
    });

    let limiter = BridgeRateLimiter::new(RENDER_RATE_LIMIT);
    read_loop("render", ws_stream, &limiter, &state, route_render).await;

    writer_handle.abort();
    info!("Renderer disconnected");
}

/// Reader loop shared by both bridges: socket -> session queue
async fn read_loop(
    bridge: &'static str,
    mut ws_stream: WsStream,
    limiter: &BridgeRateLimiter,
    state: &AppState,
    route: fn(&str) -> Option<SessionInput>,
) {
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !limiter.check() {
                    warn!(bridge, "Rate limited inbound message");
                    continue;
                }

                if let Some(input) = route(&text) {
                    if state.session.input_tx.send(input).await.is_err() {
                        debug!(bridge, "Session input channel closed");
                        break;
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(bridge, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(bridge, "Peer initiated close");
                break;
            }
            Err(e) => {
                error!(bridge, error = %e, "WebSocket error");
                break;
            }
        }
    }
}
