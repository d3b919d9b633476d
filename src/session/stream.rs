use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use tracing::debug;

use crate::broker::BrokerHandle;
use crate::broker::message::{EventKind, Message};
use crate::broker::room::SubscriberId;
use crate::session::Subscription;
use crate::transport::codec;

/// Issues the session's unsubscribe when dropped.
///
/// The session must leave the room exactly once no matter how its loop ends:
/// client disconnect, heartbeat timeout, write failure, or a panic unwinding
/// through the task. Tying the unsubscribe to `Drop` covers all of them.
struct UnsubscribeGuard {
    broker: BrokerHandle,
    room: String,
    id: SubscriberId,
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        self.broker.unsubscribe(&self.room, self.id);
    }
}

/// Drives one subscriber session until the connection ends.
///
/// Bridges the subscription's inbound queue to `out`, the frame channel the
/// HTTP response body streams from. The loop waits on whichever happens
/// first:
///
/// - a message arrives on the inbound queue: encode it and push the frame
///   downstream. A `timeout`-kind message ends the session after the frame
///   goes out.
/// - `out` closes: the client dropped the connection.
/// - the heartbeat interval passes with no message: push one synthetic
///   `timeout` frame and end the session so the client reconnects. The timer
///   re-arms after every delivered message, so it measures idle time.
pub async fn run(
    mut subscription: Subscription,
    broker: BrokerHandle,
    heartbeat: Duration,
    out: mpsc::Sender<String>,
) {
    let room = subscription.room.clone();
    let id = subscription.id;
    let _guard = UnsubscribeGuard {
        broker,
        room: room.clone(),
        id,
    };
    debug!(room = %room, subscriber = %id, "session started");

    loop {
        tokio::select! {
            received = subscription.receiver.recv() => match received {
                Some(msg) => {
                    let terminal = msg.event == EventKind::Timeout;
                    if out.send(codec::encode(&msg)).await.is_err() {
                        debug!(room = %room, subscriber = %id, "client gone mid-write");
                        break;
                    }
                    if terminal {
                        break;
                    }
                }
                // The broker dropped our queue's send half: process shutdown.
                None => break,
            },
            _ = out.closed() => {
                debug!(room = %room, subscriber = %id, "client closed the connection");
                break;
            }
            _ = time::sleep(heartbeat) => {
                let frame = codec::encode(&Message::timeout(heartbeat));
                let _ = out.send(frame).await;
                debug!(room = %room, subscriber = %id, "heartbeat timeout, closing stream");
                break;
            }
        }
    }

    debug!(room = %room, subscriber = %id, "session ended");
}
