//! `GET /ws` — forwards every Change Notifier (C6) `stateChanged` broadcast
//! to the connected client as a text frame, replacing the original's
//! `flask_socketio` `emit("stateChanged")`. A client-sent `"ping"` is
//! answered with `"pong"`, mirroring `app/events.py`'s heartbeat handler.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use tracing::debug;

use crate::AppState;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut changes = state.notifier.subscribe();

    loop {
        tokio::select! {
            changed = changes.recv() => {
                match changed {
                    Ok(_) => {
                        if socket.send(Message::Text("stateChanged".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "ws client lagged behind stateChanged broadcasts");
                        if socket.send(Message::Text("stateChanged".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) if text == "ping" => {
                        if socket.send(Message::Text("pong".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
}
