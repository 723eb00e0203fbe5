//! Live viewer connection: one hub subscription pumped into one WebSocket.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use thermowatch_broadcast::{BroadcastHub, Subscription};
use thermowatch_protocol::LiveMessage;
use thermowatch_protocol::constants::{WS_PING_PERIOD, WS_PONG_WAIT};
use tokio_util::sync::CancellationToken;

/// Serves one live viewer until either side goes away or the server shuts
/// down, then unsubscribes it.
pub(crate) async fn serve_socket(
    socket: WebSocket,
    hub: Arc<BroadcastHub>,
    server_cancel: CancellationToken,
) {
    let subscription = hub.subscribe();
    let id = subscription.id();
    let cancel = server_cancel.child_token();
    tracing::info!(%id, viewers = hub.subscriber_count(), "viewer connected");

    let (ws_sink, ws_stream) = socket.split();

    let write_cancel = cancel.clone();
    let writer = tokio::spawn(async move {
        write_pump(ws_sink, subscription, write_cancel.clone()).await;
        // When the write pump exits, stop reading too.
        write_cancel.cancel();
    });

    read_pump(ws_stream, cancel.clone()).await;
    cancel.cancel();
    if let Err(e) = writer.await {
        tracing::error!(%id, "write pump failed: {e}");
    }

    hub.unsubscribe(id);
    tracing::info!(%id, "viewer disconnected");
}

/// Write pump: drains the subscription into the socket and sends pings.
///
/// Ends when the hub drops the subscription, the socket fails, or the
/// connection is cancelled.
async fn write_pump<S>(mut sink: S, mut subscription: Subscription, cancel: CancellationToken)
where
    S: futures_util::Sink<WsMessage, Error = axum::Error> + Send + Unpin,
{
    let mut ping_interval = tokio::time::interval(WS_PING_PERIOD);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; the first ping goes out one
    // period after connecting.
    ping_interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            event = subscription.recv() => {
                let Some(event) = event else {
                    tracing::debug!(id = %subscription.id(), "subscription closed by hub");
                    break;
                };
                let msg = LiveMessage::from(event);
                let json = match msg.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(kind = msg.kind(), "failed to encode live message: {e}");
                        continue;
                    }
                };
                if let Err(e) = sink.send(WsMessage::Text(json.into())).await {
                    tracing::debug!("write pump send error: {e}");
                    break;
                }
            }

            _ = ping_interval.tick() => {
                if let Err(e) = sink.send(WsMessage::Ping(Vec::new().into())).await {
                    tracing::debug!("write pump ping error: {e}");
                    break;
                }
            }
        }
    }

    // Best-effort close frame.
    let _ = sink.close().await;
}

/// Read pump: watches for close and liveness. Inbound payloads are ignored.
async fn read_pump<S>(mut stream: S, cancel: CancellationToken)
where
    S: futures_util::Stream<Item = Result<WsMessage, axum::Error>> + Send + Unpin,
{
    let mut deadline = tokio::time::interval(WS_PONG_WAIT);
    deadline.reset();
    let mut alive = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = deadline.tick() => {
                if !alive {
                    tracing::warn!("pong timeout, closing viewer connection");
                    break;
                }
                alive = false;
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(WsMessage::Text(text))) => {
                        alive = true;
                        tracing::trace!(len = text.len(), "ignoring inbound text frame");
                    }
                    // Pongs and anything else prove the peer is alive.
                    Some(Ok(_)) => alive = true,
                    Some(Err(e)) => {
                        tracing::debug!("read pump error: {e}");
                        break;
                    }
                }
            }
        }
    }
}
