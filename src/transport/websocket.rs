//! WebSocket client transport
//!
//! Connects to the bundled broker and speaks the `ClientMessage` /
//! `ServerMessage` protocol. Two tasks own the socket:
//! - the writer drains the outgoing queue and sends keep-alive pings
//! - the reader routes inbound `message` frames through the route table;
//!   it is the delivery context of every subscription on this connection
//!
//! Operations only enqueue frames, so they never wait on the network. The
//! broker handles frames of one connection in order, which is what makes
//! subscribe-then-publish race free.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_tungstenite::connect_async;
use tungstenite::protocol::Message as WsMessage;

use super::Transport;
use super::message::{ClientMessage, ServerMessage};
use super::routes::RouteTable;
use crate::config::ClientSettings;
use crate::registry::Delivery;
use crate::utils::error::{ConnectionError, TransportError};

#[derive(Debug)]
pub struct WebSocketTransport {
    client_id: String,
    outgoing: mpsc::UnboundedSender<WsMessage>,
    routes: RouteTable,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Connects to `settings.broker_url`.
    ///
    /// Fails with `ConnectionError` instead of retrying; backoff is the
    /// caller's decision.
    pub async fn connect(settings: &ClientSettings) -> Result<Self, ConnectionError> {
        let timeout = Duration::from_secs(settings.connect_timeout_secs);
        let (ws_stream, _response) =
            tokio::time::timeout(timeout, connect_async(settings.broker_url.as_str()))
                .await
                .map_err(|_| ConnectionError::Timeout(timeout))??;
        tracing::info!(
            client = %settings.client_id,
            url = %settings.broker_url,
            "connected to broker"
        );

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<WsMessage>();
        let routes = RouteTable::default();
        let closed = Arc::new(AtomicBool::new(false));

        let mut keep_alive = (settings.keep_alive_secs > 0).then(|| {
            let period = Duration::from_secs(settings.keep_alive_secs);
            tokio::time::interval_at(Instant::now() + period, period)
        });

        {
            let closed = closed.clone();
            let client_id = settings.client_id.clone();
            tokio::spawn(async move {
                loop {
                    let frame = tokio::select! {
                        frame = outgoing_rx.recv() => match frame {
                            Some(frame) => frame,
                            None => break,
                        },
                        _ = tick(&mut keep_alive) => WsMessage::Ping(Default::default()),
                    };
                    let is_close = frame.is_close();
                    if let Err(e) = ws_sender.send(frame).await {
                        tracing::warn!(client = %client_id, "send to broker failed: {e}");
                        break;
                    }
                    if is_close {
                        break;
                    }
                }
                closed.store(true, Ordering::SeqCst);
            });
        }

        let reader = {
            let routes = routes.clone();
            let closed = closed.clone();
            let client_id = settings.client_id.clone();
            tokio::spawn(async move {
                while let Some(frame) = ws_receiver.next().await {
                    let frame = match frame {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!(client = %client_id, "broker connection error: {e}");
                            break;
                        }
                    };
                    if frame.is_close() {
                        break;
                    }
                    if !frame.is_text() {
                        continue;
                    }
                    let Ok(text) = frame.to_text() else { continue };
                    match serde_json::from_str::<ServerMessage>(text) {
                        Ok(ServerMessage::Message { topic, payload, .. }) => {
                            routes.dispatch(&topic, payload.into_bytes());
                        }
                        Ok(ServerMessage::Error { message }) => {
                            tracing::warn!(client = %client_id, "broker reported error: {message}");
                        }
                        Err(e) => {
                            tracing::warn!(client = %client_id, "invalid broker message: {e}");
                        }
                    }
                }
                closed.store(true, Ordering::SeqCst);
                // Waits on this connection can no longer be answered.
                let ended = routes.close_all();
                tracing::info!(client = %client_id, ended, "disconnected from broker");
            })
        };

        Ok(Self {
            client_id: settings.client_id.clone(),
            outgoing,
            routes,
            closed,
            reader,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn send(&self, msg: &ClientMessage) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let json = serde_json::to_string(msg)?;
        self.outgoing
            .send(WsMessage::text(json))
            .map_err(|_| TransportError::Closed)
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn subscribe(&self, topic: &str, delivery: Delivery) -> Result<(), TransportError> {
        self.routes.insert(topic, delivery);
        let result = self.send(&ClientMessage::Subscribe {
            topic: topic.to_string(),
        });
        if result.is_err() {
            self.routes.remove(topic);
        }
        result
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let payload = String::from_utf8(payload).map_err(|_| TransportError::NotUtf8)?;
        self.send(&ClientMessage::Publish {
            topic: topic.to_string(),
            payload,
        })
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.routes.remove(topic);
        self.send(&ClientMessage::Unsubscribe {
            topic: topic.to_string(),
        })
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        // The writer sends the close frame and exits once the queue is gone.
        let _ = self.outgoing.send(WsMessage::Close(None));
        self.reader.abort();
    }
}
