// SPDX-License-Identifier: MIT

use super::*;
use futures_util::{SinkExt, StreamExt};
use maestro_core::TaskId;

async fn start_bridge() -> (String, EventBus, CancellationToken) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let bus = EventBus::new();
    let shutdown = CancellationToken::new();
    tokio::spawn(run(listener, bus.clone(), shutdown.clone()));
    (format!("ws://{addr}"), bus, shutdown)
}

async fn next_text(
    ws: &mut tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<TcpStream>,
    >,
) -> serde_json::Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("frame timeout")
            .expect("stream ended")
            .expect("read error");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn events_are_framed_and_broadcast() {
    let (url, bus, shutdown) = start_bridge().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    // Let the server register the client before emitting.
    tokio::time::sleep(Duration::from_millis(50)).await;

    bus.emit(MaestroEvent::TaskDeleted { id: TaskId::from_string("task_1") });

    let frame = next_text(&mut ws).await;
    assert_eq!(frame["type"], "task:deleted");
    assert_eq!(frame["event"], "task:deleted");
    assert_eq!(frame["data"]["id"], "task_1");
    assert!(frame["timestamp"].as_u64().unwrap() > 0);

    shutdown.cancel();
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let (url, _bus, shutdown) = start_bridge().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    ws.send(Message::Text(r#"{"type":"ping"}"#.into())).await.unwrap();

    let frame = next_text(&mut ws).await;
    assert_eq!(frame["type"], "pong");

    shutdown.cancel();
}

#[tokio::test]
async fn every_client_receives_every_event() {
    let (url, bus, shutdown) = start_bridge().await;
    let (mut first, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let (mut second, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    bus.emit(MaestroEvent::TaskDeleted { id: TaskId::from_string("task_2") });

    for ws in [&mut first, &mut second] {
        let frame = next_text(ws).await;
        assert_eq!(frame["data"]["id"], "task_2");
    }

    shutdown.cancel();
}

#[tokio::test]
async fn shutdown_closes_clients_normally() {
    let (url, _bus, shutdown) = start_bridge().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    shutdown.cancel();

    let mut saw_close = false;
    while let Ok(Some(Ok(message))) =
        tokio::time::timeout(Duration::from_secs(2), ws.next()).await
    {
        if matches!(message, Message::Close(_)) {
            saw_close = true;
            break;
        }
    }
    assert!(saw_close);
}
