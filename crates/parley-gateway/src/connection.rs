use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tracing::{error, info, trace, warn};
use uuid::Uuid;

use parley_types::events::GatewayEvent;

use crate::hub::{ConnectionHandle, Hub};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const MAX_MISSED_HEARTBEATS: u8 = 2;

/// Drive a WebSocket whose bearer credential was already validated at the
/// HTTP upgrade layer.
///
/// Whatever ends the loop (close frame, socket error, heartbeat timeout),
/// the connection is deregistered from the hub before this returns.
pub async fn handle_connection(socket: WebSocket, hub: Hub, user_id: Uuid) {
    let ConnectionHandle {
        id: conn_id,
        conversation_count,
        mut events,
        ..
    } = match hub.on_connect(user_id).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to register connection for {}: {:#}", user_id, e);
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    info!(
        "{} connected to gateway (connection {}, {} live)",
        user_id,
        conn_id,
        hub.connection_count(user_id).await
    );

    let ready = GatewayEvent::Ready {
        user_id,
        conversation_count,
    };

    if send_event(&mut sender, &ready).await {
        let pong_received = Arc::new(AtomicBool::new(true));
        let pong_flag_send = pong_received.clone();
        let pong_flag_recv = pong_received;

        // Forward hub events -> client, with heartbeat
        let mut send_task = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;
            let mut missed_heartbeats: u8 = 0;

            loop {
                tokio::select! {
                    event = events.recv() => {
                        let Some(event) = event else { break };
                        if !send_event(&mut sender, &event).await {
                            break;
                        }
                    }
                    _ = heartbeat.tick() => {
                        if pong_flag_send.swap(false, Ordering::Acquire) {
                            missed_heartbeats = 0;
                        } else {
                            missed_heartbeats += 1;
                            if missed_heartbeats >= MAX_MISSED_HEARTBEATS {
                                warn!(
                                    "{} heartbeat timeout (missed {} pongs), dropping connection",
                                    user_id, missed_heartbeats
                                );
                                break;
                            }
                        }
                        if sender.send(Message::Ping(Default::default())).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        // Clients have nothing to say on this channel beyond control frames
        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Pong(_) => {
                        pong_flag_recv.store(true, Ordering::Release);
                    }
                    Message::Close(_) => break,
                    Message::Text(text) => {
                        trace!("{} sent ignored text frame ({} bytes)", user_id, text.len());
                    }
                    _ => {}
                }
            }
        });

        // Wait for either task to finish
        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }
    }

    hub.on_disconnect(conn_id).await;
    info!("{} disconnected from gateway (connection {})", user_id, conn_id);
}

/// Serialize and send one event. Returns false once the socket is unusable.
async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &GatewayEvent) -> bool {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            // Not the socket's fault; keep the connection
            warn!("Failed to serialize {} event: {}", event.name(), e);
            return true;
        }
    };
    sender.send(Message::Text(text.into())).await.is_ok()
}
