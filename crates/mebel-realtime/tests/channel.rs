//! Signaling channel against a local WebSocket server.

use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use mebel_common::UserId;
use mebel_realtime::envelope::{decode, encode};
use mebel_realtime::{
    ChannelConfig, ChannelState, Envelope, EnvelopeBody, EnvelopeKind, OutboundEnvelope,
    SignalingChannel,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

type ServerSocket = WebSocketStream<TcpStream>;

const WAIT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Accept WebSocket connections forever, handing each to the test.
async fn start_server() -> (String, mpsc::UnboundedReceiver<ServerSocket>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/api/v2/ws", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = accept_async(stream).await {
                if tx.send(ws).is_err() {
                    break;
                }
            }
        }
    });

    (url, rx)
}

fn config(url: &str, reconnect_ms: u64) -> ChannelConfig {
    ChannelConfig {
        reconnect_delay: Duration::from_millis(reconnect_ms),
        connect_timeout: Duration::from_secs(2),
        ..ChannelConfig::new(url)
    }
}

fn collecting(
    config: ChannelConfig,
) -> (SignalingChannel, mpsc::UnboundedReceiver<Envelope>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let channel = SignalingChannel::connect(config, move |envelope| {
        let _ = tx.send(envelope);
    });
    (channel, rx)
}

async fn wait_for_state(channel: &SignalingChannel, want: ChannelState) {
    let mut rx = channel.subscribe_state();
    timeout(WAIT, rx.wait_for(|state| *state == want))
        .await
        .expect("timed out waiting for channel state")
        .expect("state channel closed");
}

async fn next_socket(rx: &mut mpsc::UnboundedReceiver<ServerSocket>) -> ServerSocket {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a connection")
        .expect("server stopped")
}

async fn next_text(ws: &mut ServerSocket) -> String {
    loop {
        let frame = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket ended")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return text.as_str().to_string();
        }
    }
}

fn chat_message(id: &str, content: &str) -> OutboundEnvelope {
    OutboundEnvelope {
        conversation_id: "chat-42".into(),
        sender_id: UserId::from("seller-7"),
        recipient_ids: vec![UserId::from("buyer-3")],
        body: EnvelopeBody::Message {
            message_id: id.into(),
            content: content.into(),
        },
    }
}

fn frame(id: &str) -> Message {
    let envelope = chat_message(id, "Sofa ships on Monday").stamp("2026-03-01T10:00:00.000Z");
    Message::Text(encode(&envelope).unwrap().into())
}

fn text(raw: &str) -> Message {
    Message::Text(raw.to_string().into())
}

fn message_id(envelope: &Envelope) -> &str {
    match &envelope.body {
        EnvelopeBody::Message { message_id, .. } => message_id,
        other => panic!("expected message body, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delivers_inbound_in_order_and_drops_malformed() {
    let (url, mut sockets) = start_server().await;
    let (channel, mut inbound) = collecting(config(&url, 200));
    let mut ws = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;

    ws.send(frame("m1")).await.unwrap();
    ws.send(text("not json at all")).await.unwrap();
    ws.send(text(r#"{"chat_id":"chat-42","sender_id":"x"}"#))
        .await
        .unwrap();
    ws.send(text(
        r#"{"type":"message","chat_id":"chat-42","sender_id":"x","timestamp":"t"}"#,
    ))
    .await
    .unwrap();
    ws.send(Message::Binary(vec![1u8, 2, 3].into())).await.unwrap();
    ws.send(frame("m2")).await.unwrap();
    ws.send(frame("m3")).await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let envelope = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
        ids.push(message_id(&envelope).to_string());
    }
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
    assert_eq!(channel.state(), ChannelState::Connected);

    // Nothing else made it through.
    assert!(timeout(Duration::from_millis(100), inbound.recv()).await.is_err());
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_stamps_and_serializes() {
    let (url, mut sockets) = start_server().await;
    let (channel, _inbound) = collecting(config(&url, 200));
    let mut ws = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;

    channel.send(chat_message("m1", "Is the wardrobe still for sale?"));
    let text = next_text(&mut ws).await;

    let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(raw["type"], "message");
    assert_eq!(raw["chat_id"], "chat-42");
    assert_eq!(raw["recipients"], serde_json::json!(["buyer-3"]));

    let envelope = decode(&text).unwrap();
    assert_eq!(envelope.kind(), EnvelopeKind::Message);
    assert!(envelope.timestamp.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(&envelope.timestamp).is_ok());
}

#[tokio::test]
async fn sends_arrive_in_call_order() {
    let (url, mut sockets) = start_server().await;
    let (channel, _inbound) = collecting(config(&url, 200));
    let mut ws = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;

    for i in 0..5 {
        channel.send(chat_message(&format!("m{i}"), "x"));
    }
    for i in 0..5 {
        let envelope = decode(&next_text(&mut ws).await).unwrap();
        assert_eq!(message_id(&envelope), format!("m{i}"));
    }
}

#[tokio::test]
async fn send_without_connection_is_a_silent_noop() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    drop(listener);

    let (channel, _inbound) = collecting(config(&url, 50));
    channel.send(chat_message("m1", "lost"));
    assert!(!channel.is_connected());
    channel.disconnect();
    assert_eq!(channel.state(), ChannelState::Disconnected);
}

#[tokio::test]
async fn sends_while_disconnected_are_not_replayed() {
    let (url, mut sockets) = start_server().await;
    let (channel, _inbound) = collecting(config(&url, 500));
    let mut first = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;

    first.close(None).await.unwrap();
    wait_for_state(&channel, ChannelState::Disconnected).await;
    channel.send(chat_message("lost", "dropped"));

    let mut second = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;
    channel.send(chat_message("kept", "delivered"));

    let envelope = decode(&next_text(&mut second).await).unwrap();
    assert_eq!(message_id(&envelope), "kept");
}

// ---------------------------------------------------------------------------
// Reconnect / disconnect
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reconnects_after_fixed_delay() {
    let delay = Duration::from_millis(300);
    let (url, mut sockets) = start_server().await;
    let (channel, _inbound) = collecting(config(&url, delay.as_millis() as u64));

    let mut first = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;

    let closed_at = Instant::now();
    first.close(None).await.unwrap();

    let second = next_socket(&mut sockets).await;
    assert!(closed_at.elapsed() >= delay);
    wait_for_state(&channel, ChannelState::Connected).await;

    // And again: no cap on attempts.
    drop(second);
    let _third = next_socket(&mut sockets).await;
}

#[tokio::test]
async fn reconnect_after_failed_attempts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (channel, _inbound) = collecting(config(&format!("ws://{addr}/ws"), 100));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!channel.is_connected());

    // The endpoint comes up later; the channel finds it on its own.
    let listener = TcpListener::bind(addr).await.unwrap();
    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let _ws = accept_async(stream).await.unwrap();
    wait_for_state(&channel, ChannelState::Connected).await;
}

#[tokio::test]
async fn disconnect_cancels_pending_reconnect() {
    let (url, mut sockets) = start_server().await;
    let (channel, _inbound) = collecting(config(&url, 300));
    let mut first = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;

    first.close(None).await.unwrap();
    wait_for_state(&channel, ChannelState::Disconnected).await;
    channel.disconnect();

    assert!(timeout(Duration::from_millis(900), sockets.recv())
        .await
        .is_err());
    assert_eq!(channel.state(), ChannelState::Disconnected);
}

#[tokio::test]
async fn no_delivery_after_disconnect() {
    let (url, mut sockets) = start_server().await;
    let (channel, mut inbound) = collecting(config(&url, 100));
    let mut ws = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;

    channel.disconnect();
    channel.disconnect();
    assert_eq!(channel.state(), ChannelState::Disconnected);

    let _ = ws.send(frame("late")).await;
    assert!(matches!(
        timeout(Duration::from_millis(300), inbound.recv()).await,
        Err(_) | Ok(None)
    ));
    assert!(timeout(Duration::from_millis(300), sockets.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn dropping_the_handle_closes_the_socket() {
    let (url, mut sockets) = start_server().await;
    let (channel, _inbound) = collecting(config(&url, 100));
    let mut ws = next_socket(&mut sockets).await;
    wait_for_state(&channel, ChannelState::Connected).await;

    drop(channel);

    let ended = timeout(WAIT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(ended.is_ok());
}
