// SPDX-License-Identifier: MIT

//! WebSocket bridge.
//!
//! Subscribes to the broadcast topics and fans every event out to all
//! connected clients as `{type, event, data, timestamp}` frames. Each
//! client gets a bounded send queue; a client that cannot drain it is
//! disconnected so one slow consumer never blocks the rest. Accepts
//! `{"type":"ping"}` keep-alives and answers `{"type":"pong"}`.

use futures_util::{SinkExt, StreamExt};
use maestro_core::{MaestroEvent, BROADCAST_TOPICS};
use maestro_engine::EventBus;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outbound frames buffered per client before it is considered stuck.
const CLIENT_BUFFER: usize = 256;

/// Interval between server-initiated heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

type ClientMap = Arc<Mutex<HashMap<String, mpsc::Sender<Message>>>>;

/// Run the bridge until shutdown: subscribe to the bus, accept clients,
/// heartbeat, and close everything with a normal code on the way out.
pub async fn run(listener: TcpListener, bus: EventBus, shutdown: CancellationToken) {
    let clients: ClientMap = Arc::new(Mutex::new(HashMap::new()));

    let subscriptions = bus.on_topics(BROADCAST_TOPICS, {
        let clients = Arc::clone(&clients);
        move |event| {
            broadcast(&clients, event);
            Ok(())
        }
    });

    let heartbeat = tokio::spawn(heartbeat_loop(Arc::clone(&clients), shutdown.clone()));

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!(%addr, "websocket connection");
                    tokio::spawn(handle_client(stream, Arc::clone(&clients), shutdown.clone()));
                }
                Err(err) => warn!(error = %err, "websocket accept error"),
            },
        }
    }

    for id in subscriptions {
        bus.off(id);
    }
    close_all(&clients);
    let _ = heartbeat.await;
    info!("websocket bridge stopped");
}

/// Fan one event out to every client; drop the ones that cannot keep up.
fn broadcast(clients: &ClientMap, event: &MaestroEvent) {
    let topic = event.topic().as_str();
    let frame = serde_json::json!({
        "type": topic,
        "event": topic,
        "data": event.payload_json(),
        "timestamp": epoch_ms(),
    })
    .to_string();

    let mut stuck = Vec::new();
    {
        let map = clients.lock();
        for (id, tx) in map.iter() {
            if tx.try_send(Message::Text(frame.clone().into())).is_err() {
                stuck.push(id.clone());
            }
        }
    }
    if !stuck.is_empty() {
        let mut map = clients.lock();
        for id in stuck {
            map.remove(&id);
            warn!(client = %id, "dropping websocket client with full send queue");
        }
    }
}

async fn handle_client(stream: TcpStream, clients: ClientMap, shutdown: CancellationToken) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(error = %err, "websocket handshake failed");
            return;
        }
    };
    let id = nanoid::nanoid!(8);
    let (tx, mut rx) = mpsc::channel::<Message>(CLIENT_BUFFER);
    clients.lock().insert(id.clone(), tx.clone());

    let (mut sink, mut source) = ws.split();
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = keepalive_reply(&text) {
                        let _ = tx.try_send(Message::Text(reply.into()));
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = tx.try_send(Message::Pong(payload));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(client = %id, error = %err, "websocket read error");
                    break;
                }
            },
        }
    }

    clients.lock().remove(&id);
    drop(tx);
    let _ = writer.await;
    debug!(client = %id, "websocket client gone");
}

/// `{"type":"ping"}` → `{"type":"pong"}`.
fn keepalive_reply(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    (value.get("type")?.as_str()? == "ping").then(|| r#"{"type":"pong"}"#.to_string())
}

async fn heartbeat_loop(clients: ClientMap, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            _ = interval.tick() => {
                let map = clients.lock();
                for tx in map.values() {
                    let _ = tx.try_send(Message::Ping(Vec::new().into()));
                }
            }
        }
    }
}

/// Close every client with a normal code and clear the registry.
fn close_all(clients: &ClientMap) {
    let mut map = clients.lock();
    for (id, tx) in map.drain() {
        let frame = CloseFrame { code: CloseCode::Normal, reason: "server shutdown".into() };
        if tx.try_send(Message::Close(Some(frame))).is_err() {
            debug!(client = %id, "client queue full during shutdown close");
        }
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
