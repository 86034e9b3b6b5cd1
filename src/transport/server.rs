//! WebSocket broker
//!
//! Minimal WebSocket server exposing a shared `Broker` to remote
//! transports. Responsibilities:
//! - Accept TCP/WebSocket connections, up to `max_connections`
//! - Create a `Client` for each connection and register it with the `Broker`
//! - Translate `ClientMessage` frames into broker operations
//! - Forward broker messages to the connection as `ServerMessage` frames
//! - Clean the client up exactly once when either direction ends

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tungstenite::protocol::Message as WsMessage;

use super::message::{ClientMessage, ServerMessage};
use crate::broker::{Broker, Message};
use crate::client::Client;
use crate::config::BrokerSettings;

/// Binds `addr` and serves the broker until the task is dropped.
pub async fn start_websocket_server(
    addr: &str,
    broker: Arc<Mutex<Broker>>,
    settings: BrokerSettings,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("WebSocket broker listening on ws://{}", listener.local_addr()?);
    serve(listener, broker, settings).await;
    Ok(())
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, broker: Arc<Mutex<Broker>>, settings: BrokerSettings) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tokio::spawn(handle_connection(
                    stream,
                    peer,
                    broker.clone(),
                    settings.clone(),
                ));
            }
            Err(e) => tracing::warn!("failed to accept connection: {e}"),
        }
    }
}

fn lock(broker: &Mutex<Broker>) -> MutexGuard<'_, Broker> {
    broker.lock().unwrap_or_else(PoisonError::into_inner)
}

fn encode(msg: &ServerMessage) -> Option<WsMessage> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(WsMessage::text(json)),
        Err(e) => {
            tracing::error!("failed to serialize server message: {e}");
            None
        }
    }
}

fn error_frame(message: &str) -> Option<WsMessage> {
    encode(&ServerMessage::Error {
        message: message.to_string(),
    })
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    broker: Arc<Mutex<Broker>>,
    settings: BrokerSettings,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(%peer, "WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    let admitted = {
        let mut broker = lock(&broker);
        if broker.client_count() >= settings.max_connections {
            false
        } else {
            broker.register_client(client);
            true
        }
    };
    if !admitted {
        tracing::warn!(%peer, "connection limit reached, rejecting");
        if let Some(frame) = error_frame("too many connections") {
            let _ = ws_sender.send(frame).await;
        }
        let _ = ws_sender.close().await;
        return;
    }
    tracing::debug!(%peer, client = %client_id, "client connected");

    let cleanup_called = Arc::new(AtomicBool::new(false));
    let do_cleanup = {
        let broker = broker.clone();
        let client_id = client_id.clone();
        let cleanup_called = cleanup_called.clone();

        move || {
            if !cleanup_called.swap(true, Ordering::SeqCst) {
                lock(&broker).cleanup_client(&client_id);
            }
        }
    };

    // Replies that originate from this connection rather than the broker.
    let (control_tx, mut control_rx) = mpsc::unbounded_channel::<WsMessage>();

    {
        let client_id = client_id.clone();
        let do_cleanup = do_cleanup.clone();

        tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    Some(msg) = rx.recv() => encode(&ServerMessage::from(msg)),
                    Some(frame) = control_rx.recv() => Some(frame),
                    else => break,
                };
                let Some(frame) = frame else { continue };
                if let Err(e) = ws_sender.send(frame).await {
                    tracing::debug!(client = %client_id, "send loop closed: {e}");
                    break;
                }
            }
            do_cleanup();
        });
    }

    while let Some(Ok(msg)) = ws_receiver.next().await {
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else { continue };

        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Subscribe { topic }) => {
                lock(&broker).subscribe(&topic, client_id.clone());
                tracing::debug!(client = %client_id, %topic, "subscribed");
            }
            Ok(ClientMessage::Unsubscribe { topic }) => {
                lock(&broker).unsubscribe(&topic, &client_id);
                tracing::debug!(client = %client_id, %topic, "unsubscribed");
            }
            Ok(ClientMessage::Publish { topic, payload }) => {
                let delivered = lock(&broker).publish(Message {
                    topic: topic.clone(),
                    payload,
                    timestamp: chrono::Utc::now().timestamp_millis(),
                    message_id: uuid::Uuid::new_v4().to_string(),
                });
                tracing::debug!(client = %client_id, %topic, delivered, "published");
            }
            Err(err) => {
                tracing::warn!(
                    client = %client_id,
                    "invalid client message: {err} | {}",
                    text.chars().take(100).collect::<String>()
                );
                if let Some(frame) = error_frame("invalid message") {
                    let _ = control_tx.send(frame);
                }
            }
        }
    }

    tracing::debug!(client = %client_id, "client disconnected");
    // Cleanup drops the broker's sender; with control_tx gone too the
    // writer drains and exits.
    do_cleanup();
}
