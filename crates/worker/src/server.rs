// SPDX-License-Identifier: MIT

//! Accepts client WebSocket connections and drives each one's frames through
//! the `SessionManager`. One task per connection; binary frames are rejected
//! with a protocol error rather than closing the socket.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use signrt_core::{ClientId, Clock};
use signrt_wire::{Inbound, Outbound};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::error::WorkerError;
use crate::session::SessionManager;

pub async fn serve<C: Clock + 'static>(
    port: u16,
    sessions: Arc<SessionManager<C>>,
) -> Result<(), WorkerError> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| WorkerError::Bind { port, source: e })?;

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };
                let sessions = sessions.clone();
                tokio::spawn(async move {
                    handle_connection(stream, addr, sessions).await;
                });
            }
            () = sessions.wait_for_idle_shutdown() => {
                tracing::info!("idle timeout elapsed with no connected clients, shutting down");
                return Ok(());
            }
        }
    }
}

async fn handle_connection<C: Clock>(stream: TcpStream, addr: SocketAddr, sessions: Arc<SessionManager<C>>) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(%addr, error = %e, "websocket handshake failed");
            return;
        }
    };

    let client_id = ClientId::new(addr.to_string());
    sessions.on_connect(client_id.clone());
    tracing::info!(client = %client_id, "client connected");

    let (mut write, mut read) = ws_stream.split();

    while let Some(message) = read.next().await {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                tracing::info!(client = %client_id, error = %e, "connection error");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                let outbound = handle_text(&sessions, &client_id, &text);
                let mut send_failed = false;
                for reply in &outbound {
                    if send(&mut write, reply).await.is_err() {
                        send_failed = true;
                        break;
                    }
                }
                if send_failed {
                    break;
                }
            }
            Message::Binary(_) => {
                let err = Outbound::error("binary frames are not supported; send JSON text frames");
                if send(&mut write, &err).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }

    sessions.on_disconnect(&client_id);
    tracing::info!(client = %client_id, "client disconnected");
}

/// Handles one inbound text frame, returning every `Outbound` message it
/// produces in order. A `LandmarksSequence` batch processes each contained
/// frame in order and reports a `classification_result` for each one that
/// actually produced an event, not just the last.
fn handle_text<C: Clock>(sessions: &SessionManager<C>, client_id: &ClientId, text: &str) -> Vec<Outbound> {
    let inbound: Inbound = match serde_json::from_str(text) {
        Ok(inbound) => inbound,
        Err(e) => return vec![Outbound::error(format!("malformed message: {e}"))],
    };

    match inbound {
        Inbound::Ping => vec![Outbound::Pong],
        Inbound::Landmarks { data } => sessions
            .on_frame(client_id, data)
            .map(|event| {
                vec![Outbound::ClassificationResult {
                    data: classification_data(&event.smoothed, sessions),
                    timestamp: epoch_seconds(),
                    frame_index: Some(event.frame_index),
                }]
            })
            .unwrap_or_default(),
        Inbound::LandmarksSequence { data } => data
            .sequence
            .into_iter()
            .filter_map(|frame| sessions.on_frame(client_id, frame))
            .map(|event| Outbound::ClassificationResult {
                data: classification_data(&event.smoothed, sessions),
                timestamp: epoch_seconds(),
                frame_index: Some(event.frame_index),
            })
            .collect(),
    }
}

fn classification_data<C: Clock>(
    smoothed: &crate::smoother::SmoothedResult,
    sessions: &SessionManager<C>,
) -> signrt_wire::ClassificationResult {
    let labels = sessions.labels();
    let prediction = labels.get(smoothed.argmax).cloned().unwrap_or_else(|| "unknown".to_string());
    let probabilities = labels
        .iter()
        .zip(smoothed.probabilities.iter())
        .map(|(label, &p)| (label.clone(), p))
        .collect();

    signrt_wire::ClassificationResult {
        prediction,
        confidence: smoothed.confidence,
        probabilities,
        buffer_size: None,
    }
}

fn epoch_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

async fn send(
    write: &mut (impl SinkExt<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
    outbound: &Outbound,
) -> Result<(), ()> {
    let text = match serde_json::to_string(outbound) {
        Ok(text) => text,
        Err(_) => return Err(()),
    };
    write.send(Message::Text(text.into())).await.map_err(|_| ())
}
