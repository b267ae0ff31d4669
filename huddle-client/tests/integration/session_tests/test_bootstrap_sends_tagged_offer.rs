use huddle_core::{PcKind, SdpKind, Signal};

use crate::integration::{create_test_session, init_tracing};
use crate::utils::synthetic_audio_track;

#[tokio::test]
async fn test_bootstrap_sends_tagged_offer() {
    init_tracing();

    let (transport, session) = create_test_session().await;

    session
        .start(&[synthetic_audio_track()])
        .await
        .expect("bootstrap");
    assert!(session.publisher().has_local_tracks());

    let sent = transport.wait_for_sent(1, 2000).await;
    let offer = sent
        .iter()
        .find_map(|signal| match signal {
            Signal::Sdp(sdp) => Some(sdp.clone()),
            _ => None,
        })
        .expect("bootstrap must emit an sdp");

    assert_eq!(offer.pc, PcKind::Pub);
    assert_eq!(offer.kind, SdpKind::Offer);
    assert!(offer.sdp.contains("v=0"));

    session.close().await;
}
