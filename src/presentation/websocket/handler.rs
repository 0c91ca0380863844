//! WebSocket Connection Handler
//!
//! One realtime session per connection. Outbound events arrive through the
//! session's [`WsTransport`]; inbound text frames carry presence reports and
//! typing pings.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::transport::{Outbound, WsTransport};
use crate::application::dto::request::ClientFrame;
use crate::domain::{ServerEvent, SessionId, SessionTransport, UserId};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// How the inbound side of a connection ended
enum Termination {
    Closed,
    Failed,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, user_id: UserId) {
    let session_id = SessionId::new();
    tracing::debug!(user_id = %user_id, session_id = %session_id, "New WebSocket connection");

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    // Forward queued events to the socket until closed
    let mut sender_task = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let event = match outbound {
                Outbound::Event(event) => event,
                Outbound::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let transport = Arc::new(WsTransport::new(tx));
    if let Err(e) = state
        .presence
        .open(user_id, session_id, transport.clone())
        .await
    {
        tracing::info!(user_id = %user_id, error = %e, "Session rejected");
        let _ = transport.send(&ServerEvent::close_session(e.to_string()));
        transport.close();
        drop(transport);
        let _ = sender_task.await;
        return;
    }
    drop(transport);

    let termination = loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_frame(&text, user_id, session_id, &state).await {
                            tracing::debug!(
                                session_id = %session_id,
                                error = %e,
                                "Error handling frame"
                            );
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break Termination::Closed,
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %session_id, error = %e, "WebSocket error");
                        break Termination::Failed;
                    }
                    // Pong is handled automatically by axum
                    _ => {}
                }
            }
            // Writer finished: the server closed this session
            _ = &mut sender_task => break Termination::Closed,
        }
    };

    // Both hooks are no-ops for a session already removed
    match termination {
        Termination::Closed => state.presence.close(session_id).await,
        Termination::Failed => state.presence.error(session_id).await,
    };
    sender_task.abort();

    tracing::info!(user_id = %user_id, session_id = %session_id, "User disconnected");
}

/// Handle one inbound text frame
async fn handle_frame(
    text: &str,
    user_id: UserId,
    session_id: SessionId,
    state: &AppState,
) -> Result<(), AppError> {
    let frame: ClientFrame = serde_json::from_str(text)
        .map_err(|e| AppError::Invalid(format!("Invalid frame: {}", e)))?;

    match frame {
        ClientFrame::Status { status } => {
            state.presence.set_status(user_id, session_id, status).await?;
        }
        ClientFrame::Typing { to } => {
            state.messages.send_typing_to_user(user_id, to).await?;
        }
        ClientFrame::GroupTyping { group_id } => {
            state.messages.send_typing_to_group(user_id, group_id).await?;
        }
    }
    Ok(())
}
