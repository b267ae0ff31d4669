use std::time::{Duration, Instant};

use crate::integration::{create_test_session, init_tracing};

#[tokio::test]
async fn test_wait_without_media_fails_fast() {
    init_tracing();

    let (_transport, session) = create_test_session().await;

    // Publisher media was never attached: the gate must refuse immediately,
    // not sit out the five seconds.
    let started = Instant::now();
    let ready = session.wait_until_both_connected(Duration::from_secs(5)).await;

    assert!(!ready);
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "precondition failure must not wait for the timeout"
    );

    session.close().await;
}

#[tokio::test]
async fn test_start_rejects_empty_tracks() {
    init_tracing();

    let (_transport, session) = create_test_session().await;

    assert!(session.start(&[]).await.is_err());
    assert!(!session.publisher().has_local_tracks());

    session.close().await;
}
