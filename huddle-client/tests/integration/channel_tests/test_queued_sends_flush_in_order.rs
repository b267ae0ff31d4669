use std::time::Duration;

use huddle_client::SignalingClient;
use huddle_core::{ActionKind, Claims, RoleKind, Signal};

use crate::integration::init_tracing;
use crate::utils::MockTransport;

fn claims() -> Claims {
    Claims {
        name: "alice".to_string(),
        id: "peer-1".to_string(),
        room_id: "room-1".to_string(),
        role: RoleKind::Host,
    }
}

#[tokio::test]
async fn test_queued_sends_flush_in_order() {
    init_tracing();

    let transport = MockTransport::new();
    let signaling = SignalingClient::new("ws://mock", transport.clone());

    // Sent before any connection attempt; all three must queue.
    let claims = claims();
    signaling.send_action(&claims, ActionKind::AudioOn);
    signaling.send_action(&claims, ActionKind::VideoOn);
    signaling.send_action(&claims, ActionKind::AudioOff);
    assert!(transport.drain_sent().is_empty());

    signaling.connect();
    assert!(signaling.wait_until_open(Duration::from_secs(1)).await);

    // Issued after open; must come after the backlog.
    signaling.send_action(&claims, ActionKind::Leave);

    let sent = transport.wait_for_sent(4, 1000).await;
    let kinds: Vec<ActionKind> = sent
        .iter()
        .map(|signal| match signal {
            Signal::Action(action) => action.kind,
            other => panic!("expected action, got {:?}", other),
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            ActionKind::AudioOn,
            ActionKind::VideoOn,
            ActionKind::AudioOff,
            ActionKind::Leave,
        ]
    );
}
