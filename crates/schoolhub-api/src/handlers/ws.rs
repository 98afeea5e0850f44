//! Realtime notification feed over WebSocket.
//!
//! Delivery is best-effort: a client that lags behind the hub loses the
//! skipped notifications and reconciles by listing.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use schoolhub_core::error::AppError;
use schoolhub_service::context::RequestContext;

use crate::dto::request::WsQuery;
use crate::extractors::auth::authenticate_token;
use crate::state::AppState;

/// GET /ws/notifications?token={jwt}
pub async fn ws_notifications(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, AppError> {
    // Authenticate before upgrade
    let ctx = authenticate_token(&state, &query.token).await?;
    Ok(ws.on_upgrade(move |socket| handle_connection(state, ctx, socket)))
}

async fn handle_connection(state: AppState, ctx: RequestContext, socket: WebSocket) {
    let viewer = ctx.viewer();
    let mut feed = state.services.notifications.hub().subscribe();
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!(user_id = %viewer.user_id, "WebSocket connection established");

    loop {
        tokio::select! {
            received = feed.recv() => match received {
                Ok(notification) => {
                    if !notification.is_visible_to(&viewer) {
                        continue;
                    }
                    let payload = match serde_json::to_string(&notification) {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(notification_id = %notification.id, error = %e, "Failed to encode notification");
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %viewer.user_id, skipped, "WebSocket client lagging, notifications dropped");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(user_id = %viewer.user_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    info!(user_id = %viewer.user_id, "WebSocket connection closed");
}
