use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use super::Subscription;
use super::stream;
use crate::broker::engine::{BrokerHandle, BrokerRequest};
use crate::broker::message::{EventKind, Message};

/// A session wired to a hand-held request channel, so tests can observe
/// exactly what the session asks of the broker.
struct Harness {
    requests: mpsc::UnboundedReceiver<BrokerRequest>,
    inbound: mpsc::Sender<Message>,
    frames: mpsc::Receiver<String>,
    session: tokio::task::JoinHandle<()>,
    id: Uuid,
}

fn spawn_session(heartbeat: Duration) -> Harness {
    let (req_tx, requests) = mpsc::unbounded_channel();
    let handle = BrokerHandle::new(req_tx);

    let (inbound, receiver) = mpsc::channel(8);
    let id = Uuid::new_v4();
    let subscription = Subscription::new(id, "alpha".to_string(), receiver);

    let (frames_tx, frames) = mpsc::channel(8);
    let session = tokio::spawn(stream::run(subscription, handle, heartbeat, frames_tx));

    Harness {
        requests,
        inbound,
        frames,
        session,
        id,
    }
}

/// Asserts the session issued exactly one unsubscribe, for itself.
async fn assert_single_unsubscribe(mut harness: Harness) {
    harness.session.await.unwrap();
    match harness.requests.recv().await {
        Some(BrokerRequest::Unsubscribe { room, subscriber }) => {
            assert_eq!(room, "alpha");
            assert_eq!(subscriber, harness.id);
        }
        other => panic!("expected an unsubscribe request, got {:?}", other),
    }
    assert!(harness.requests.try_recv().is_err());
}

#[tokio::test]
async fn forwards_messages_as_encoded_frames() {
    let mut harness = spawn_session(Duration::from_secs(30));

    harness
        .inbound
        .send(Message {
            id: 7,
            event: EventKind::Message,
            data: "hi".to_string(),
        })
        .await
        .unwrap();

    let frame = harness.frames.recv().await.unwrap();
    assert_eq!(frame, "id: 7\nevent: message\ndata: hi\n\n");
}

#[tokio::test]
async fn idle_heartbeat_emits_timeout_and_ends_session() {
    let mut harness = spawn_session(Duration::from_millis(50));

    let frame = timeout(Duration::from_secs(2), harness.frames.recv())
        .await
        .expect("heartbeat frame should arrive")
        .unwrap();
    assert_eq!(frame, "id: 0\nevent: timeout\ndata: 0s\n\n");

    // The stream ends after the timeout frame.
    assert!(harness.frames.recv().await.is_none());
    assert_single_unsubscribe(harness).await;
}

#[tokio::test]
async fn message_traffic_rearms_the_heartbeat() {
    let mut harness = spawn_session(Duration::from_millis(500));

    // Three messages spaced well inside the heartbeat window: each delivery
    // pushes the timeout out again.
    for n in 1..=3 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        harness
            .inbound
            .send(Message {
                id: n,
                event: EventKind::Message,
                data: format!("tick {}", n),
            })
            .await
            .unwrap();
        let frame = harness.frames.recv().await.unwrap();
        assert!(frame.contains("event: message\n"), "got {:?}", frame);
    }

    // Silence now lets the heartbeat fire.
    let frame = timeout(Duration::from_secs(2), harness.frames.recv())
        .await
        .expect("heartbeat frame should arrive")
        .unwrap();
    assert!(frame.contains("event: timeout\n"));
    assert_single_unsubscribe(harness).await;
}

#[tokio::test]
async fn client_disconnect_ends_session() {
    let harness = spawn_session(Duration::from_secs(30));

    // Dropping the frame receiver is what the transport does when the
    // client hangs up.
    let Harness {
        requests,
        inbound,
        frames,
        session,
        id,
    } = harness;
    drop(frames);

    session.await.unwrap();
    let mut requests = requests;
    match requests.recv().await {
        Some(BrokerRequest::Unsubscribe { room, subscriber }) => {
            assert_eq!(room, "alpha");
            assert_eq!(subscriber, id);
        }
        other => panic!("expected an unsubscribe request, got {:?}", other),
    }
    assert!(requests.try_recv().is_err());
    drop(inbound);
}

#[tokio::test]
async fn terminal_event_kind_ends_session_after_delivery() {
    let mut harness = spawn_session(Duration::from_secs(30));

    harness
        .inbound
        .send(Message::timeout(Duration::from_secs(30)))
        .await
        .unwrap();

    let frame = harness.frames.recv().await.unwrap();
    assert_eq!(frame, "id: 0\nevent: timeout\ndata: 30s\n\n");
    assert!(harness.frames.recv().await.is_none());
    assert_single_unsubscribe(harness).await;
}

#[tokio::test]
async fn broker_shutdown_ends_session() {
    let harness = spawn_session(Duration::from_secs(30));
    let Harness {
        requests,
        inbound,
        frames,
        session,
        id,
    } = harness;

    // The broker dropping the queue's send half means process shutdown.
    drop(inbound);

    session.await.unwrap();
    let mut requests = requests;
    match requests.recv().await {
        Some(BrokerRequest::Unsubscribe { subscriber, .. }) => assert_eq!(subscriber, id),
        other => panic!("expected an unsubscribe request, got {:?}", other),
    }
    drop(frames);
}
