use std::time::{Duration, Instant};

use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

use huddle_client::{RtcConfig, RtcConnection};
use huddle_core::PcKind;

use crate::integration::init_tracing;

#[tokio::test]
async fn test_wait_for_connected_times_out() {
    init_tracing();

    let link = RtcConnection::new(PcKind::Pub, &RtcConfig::host_only())
        .await
        .expect("link");

    // Never negotiated: the wait must elapse and report the still-new state
    // as not connected, without hanging past the deadline.
    let started = Instant::now();
    let connected = link.wait_for_connected(Duration::from_millis(200)).await;

    assert!(!connected);
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(link.connection_state(), RTCPeerConnectionState::New);

    link.close().await.unwrap();
}

#[tokio::test]
async fn test_wait_for_connected_sees_close() {
    init_tracing();

    let link = RtcConnection::new(PcKind::Sub, &RtcConfig::host_only())
        .await
        .expect("link");

    let watcher = {
        let watch = link.state_watch();
        tokio::spawn(async move {
            let mut watch = watch;
            loop {
                if *watch.borrow_and_update() == RTCPeerConnectionState::Closed {
                    return true;
                }
                if watch.changed().await.is_err() {
                    return false;
                }
            }
        })
    };

    link.close().await.unwrap();
    assert!(
        watcher.await.unwrap(),
        "state watch never observed the close"
    );

    // A wait started after the close settles false immediately.
    let started = Instant::now();
    assert!(!link.wait_for_connected(Duration::from_secs(5)).await);
    assert!(started.elapsed() < Duration::from_millis(500));
}
