use std::time::Duration;

use huddle_core::{Ice, PcKind, Signal};

use crate::integration::{create_test_session, init_tracing};
use crate::utils::synthetic_audio_track;

fn sub_candidate() -> Signal {
    Signal::Ice(Ice {
        pc: PcKind::Sub,
        candidate: "candidate:1 1 udp 2130706431 127.0.0.1 50123 typ host".to_string(),
        sdp_mid: "0".to_string(),
        sdp_m_line_index: 0,
        username_fragment: "frag".to_string(),
    })
}

#[tokio::test]
async fn test_remote_ice_routed_by_tag() {
    init_tracing();

    let (transport, session) = create_test_session().await;
    session
        .start(&[synthetic_audio_track()])
        .await
        .expect("bootstrap");

    transport.inject(&sub_candidate());

    // Neither link has a remote description, so the candidate must land in
    // the subscriber's inbox and nowhere else.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if session.subscriber().pending_remote_candidates().await == 1 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "candidate never reached the subscriber"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(session.publisher().pending_remote_candidates().await, 0);

    session.close().await;
}
