use std::sync::Arc;
use std::time::Duration;

use huddle_core::{Ice, PcKind, Sdp, SdpKind};
use tokio::join;
use tracing::{debug, info, warn};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::track::track_local::TrackLocal;

use crate::error::ClientError;
use crate::rtc::RtcConnection;
use crate::signaling::SignalingClient;

/// Binds the publisher and subscriber connections to one signaling channel
/// and runs the dual-connection bootstrap.
///
/// All routing is by the `pc` tag: inbound SDP and ICE go to the connection
/// with the matching tag, each connection's local candidates go out tagged
/// with its identity. The session owns its two connections; the channel is
/// shared with whoever else subscribes to room events.
pub struct RtcSession {
    publisher: Arc<RtcConnection>,
    subscriber: Arc<RtcConnection>,
    signaling: SignalingClient,
}

impl RtcSession {
    /// The two connections must carry the tags they will be routed by.
    pub fn new(
        publisher: Arc<RtcConnection>,
        subscriber: Arc<RtcConnection>,
        signaling: SignalingClient,
    ) -> Self {
        assert_eq!(publisher.kind(), PcKind::Pub, "publisher must be tagged pub");
        assert_eq!(subscriber.kind(), PcKind::Sub, "subscriber must be tagged sub");

        Self {
            publisher,
            subscriber,
            signaling,
        }
    }

    pub fn publisher(&self) -> &Arc<RtcConnection> {
        &self.publisher
    }

    pub fn subscriber(&self) -> &Arc<RtcConnection> {
        &self.subscriber
    }

    pub fn signaling(&self) -> &SignalingClient {
        &self.signaling
    }

    /// Attaches local media to the publisher, wires the signal routing, and
    /// sends the initial publisher offer. Media is required up front;
    /// bootstrapping without it is reported, not tolerated.
    pub async fn start(
        &self,
        tracks: &[Arc<dyn TrackLocal + Send + Sync>],
    ) -> Result<(), ClientError> {
        if tracks.is_empty() {
            return Err(ClientError::NoLocalMedia);
        }
        self.publisher.attach_local_tracks(tracks).await?;
        self.wire();

        let offer = self.publisher.create_offer_and_set_local().await?;
        self.signaling.send_sdp(PcKind::Pub, SdpKind::Offer, offer);
        info!("publisher offer sent");
        Ok(())
    }

    /// Point-in-time readiness gate: false immediately if publisher media
    /// was never attached, otherwise true iff both connections reach
    /// connected within the deadline.
    pub async fn wait_until_both_connected(&self, timeout: Duration) -> bool {
        if !self.publisher.has_local_tracks() {
            warn!("publisher media never attached; refusing to wait for connections");
            return false;
        }

        let (pub_ok, sub_ok) = join!(
            self.publisher.wait_for_connected(timeout),
            self.subscriber.wait_for_connected(timeout),
        );
        debug!(pub_ok, sub_ok, "dual connection wait settled");
        pub_ok && sub_ok
    }

    pub async fn close(&self) {
        if let Err(e) = self.publisher.close().await {
            warn!("failed to close publisher connection: {e}");
        }
        if let Err(e) = self.subscriber.close().await {
            warn!("failed to close subscriber connection: {e}");
        }
        self.signaling.close();
    }

    fn wire(&self) {
        let publisher = self.publisher.clone();
        let subscriber = self.subscriber.clone();
        let signaling = self.signaling.clone();
        self.signaling.on_sdp(move |sdp| {
            let Some(link) = pick(&publisher, &subscriber, sdp.pc) else {
                warn!("dropping sdp without a connection tag");
                return;
            };
            let signaling = signaling.clone();
            tokio::spawn(async move {
                if let Err(e) = route_remote_sdp(sdp, &link, &signaling).await {
                    warn!("remote sdp rejected: {e}");
                }
            });
        });

        let publisher = self.publisher.clone();
        let subscriber = self.subscriber.clone();
        self.signaling.on_ice(move |ice| {
            let Some(link) = pick(&publisher, &subscriber, ice.pc) else {
                warn!("dropping candidate without a connection tag");
                return;
            };
            tokio::spawn(async move {
                if let Err(e) = link.add_remote_candidate(engine_candidate(&ice)).await {
                    warn!(pc = %ice.pc, "remote candidate rejected: {e}");
                }
            });
        });

        for link in [&self.publisher, &self.subscriber] {
            let signaling = self.signaling.clone();
            let kind = link.kind();
            link.on_local_candidate(move |init| {
                signaling.send_ice(wire_candidate(kind, &init));
            });
        }
    }
}

fn pick(
    publisher: &Arc<RtcConnection>,
    subscriber: &Arc<RtcConnection>,
    tag: PcKind,
) -> Option<Arc<RtcConnection>> {
    match tag {
        PcKind::Pub => Some(publisher.clone()),
        PcKind::Sub => Some(subscriber.clone()),
        PcKind::PcUnspecified => None,
    }
}

// Answers apply directly; offers produce an answer that goes back out under
// the same tag. The relay only ever offers on the subscriber leg, but the
// routing itself is tag-agnostic.
async fn route_remote_sdp(
    sdp: Sdp,
    link: &RtcConnection,
    signaling: &SignalingClient,
) -> Result<(), ClientError> {
    match sdp.kind {
        SdpKind::Answer => {
            link.set_remote_answer(sdp.sdp).await?;
            debug!(pc = %link.kind(), "remote answer applied");
            Ok(())
        }
        SdpKind::Offer => {
            let answer = link.answer_remote_offer(sdp.sdp).await?;
            signaling.send_sdp(sdp.pc, SdpKind::Answer, answer);
            debug!(pc = %link.kind(), "answered remote offer");
            Ok(())
        }
    }
}

fn engine_candidate(ice: &Ice) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: ice.candidate.clone(),
        sdp_mid: Some(ice.sdp_mid.clone()),
        sdp_mline_index: Some(ice.sdp_m_line_index),
        username_fragment: (!ice.username_fragment.is_empty())
            .then(|| ice.username_fragment.clone()),
    }
}

fn wire_candidate(pc: PcKind, init: &RTCIceCandidateInit) -> Ice {
    Ice {
        pc,
        candidate: init.candidate.clone(),
        sdp_mid: init.sdp_mid.clone().unwrap_or_default(),
        sdp_m_line_index: init.sdp_mline_index.unwrap_or_default(),
        username_fragment: init.username_fragment.clone().unwrap_or_default(),
    }
}
