//! WebSocket bridge between axum sockets and the hub.

use std::future;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use blox_app::hub::Hub;
use blox_domain::error::{BloxError, ChannelError, ProtocolViolation};

use crate::state::AppState;

/// `GET /wss/` — upgrade and serve the connection until it ends.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state.hub))
}

/// Run one upgraded socket: a writer task drains the client's queue into the
/// sink while the hub consumes the inbound frames.
///
/// When the hub ends the connection its queue sender is dropped, the writer
/// flushes what was already queued and closes the socket.
pub async fn serve_socket(socket: WebSocket, hub: Arc<Hub>) {
    let (mut sink, stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Outcome is logged by the hub.
    let _ = hub.serve_connection(text_frames(stream), tx).await;

    if let Err(err) = writer.await {
        tracing::warn!(error = %err, "socket writer task failed");
    }
}

/// Turn raw socket messages into the hub's inbound frames.
///
/// Ends at the first close frame; control frames are skipped.
pub fn text_frames<S>(messages: S) -> impl Stream<Item = Result<String, BloxError>> + Unpin + Send
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
{
    messages
        .take_while(|message| future::ready(!matches!(message, Ok(Message::Close(_)))))
        .filter_map(|message| future::ready(frame_text(message)))
}

fn frame_text(message: Result<Message, axum::Error>) -> Option<Result<String, BloxError>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(text.to_string())),
        Ok(Message::Binary(bytes)) => Some(
            String::from_utf8(bytes.to_vec())
                .map_err(|_| ProtocolViolation::UnsupportedFrame.into()),
        ),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Close(_)) => None,
        Err(err) => Some(Err(ChannelError::Receive(err.to_string()).into())),
    }
}
