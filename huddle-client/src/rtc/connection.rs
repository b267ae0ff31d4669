use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use huddle_core::PcKind;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::error::ClientError;
use crate::rtc::config::RtcConfig;

struct IceInbox {
    remote_set: bool,
    pending: Vec<RTCIceCandidateInit>,
}

/// One half of the dual-connection pair: wraps a single RTCPeerConnection
/// and owns its description lifecycle and remote-candidate buffering.
///
/// The engine must never see a candidate before a remote description, and no
/// candidate may be silently dropped; candidates arriving early are held in
/// the inbox and applied in arrival order right after the remote description
/// lands.
pub struct RtcConnection {
    kind: PcKind,
    pc: Arc<RTCPeerConnection>,
    inbox: Mutex<IceInbox>,
    attached: AtomicBool,
    attach_gate: Mutex<()>,
    state_rx: watch::Receiver<RTCPeerConnectionState>,
}

impl RtcConnection {
    pub async fn new(kind: PcKind, config: &RtcConfig) -> Result<Self, ClientError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: if config.ice_servers.is_empty() {
                Vec::new()
            } else {
                vec![RTCIceServer {
                    urls: config.ice_servers.clone(),
                    ..Default::default()
                }]
            },
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        // One persistent observer; waiters watch the mirror instead of
        // racing to replace the engine callback.
        let (state_tx, state_rx) = watch::channel(RTCPeerConnectionState::New);
        let state_kind = kind;
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            info!(pc = %state_kind, ?state, "connection state changed");
            let _ = state_tx.send(state);
            Box::pin(async {})
        }));

        Ok(Self {
            kind,
            pc,
            inbox: Mutex::new(IceInbox {
                remote_set: false,
                pending: Vec::new(),
            }),
            attached: AtomicBool::new(false),
            attach_gate: Mutex::new(()),
            state_rx,
        })
    }

    pub fn kind(&self) -> PcKind {
        self.kind
    }

    pub fn connection_state(&self) -> RTCPeerConnectionState {
        self.pc.connection_state()
    }

    /// Live view of the engine's state transitions, for observers that want
    /// more than the one-shot [`wait_for_connected`](Self::wait_for_connected).
    pub fn state_watch(&self) -> watch::Receiver<RTCPeerConnectionState> {
        self.state_rx.clone()
    }

    /// Registers every track with the engine once. Repeated calls are no-ops;
    /// tracks are never added twice.
    pub async fn attach_local_tracks(
        &self,
        tracks: &[Arc<dyn TrackLocal + Send + Sync>],
    ) -> Result<(), ClientError> {
        let _gate = self.attach_gate.lock().await;
        if self.attached.load(Ordering::Acquire) {
            debug!(pc = %self.kind, "local tracks already attached");
            return Ok(());
        }

        for track in tracks {
            self.pc.add_track(track.clone()).await?;
        }
        self.attached.store(true, Ordering::Release);
        info!(pc = %self.kind, count = tracks.len(), "local tracks attached");
        Ok(())
    }

    pub fn has_local_tracks(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub async fn create_offer_and_set_local(&self) -> Result<String, ClientError> {
        let offer = self.pc.create_offer(None).await?;
        self.pc.set_local_description(offer.clone()).await?;
        Ok(offer.sdp)
    }

    /// Applies a remote answer, then flushes the candidate inbox. A failure
    /// to set the description is fatal and leaves the inbox untouched.
    pub async fn set_remote_answer(&self, sdp: String) -> Result<(), ClientError> {
        let desc = RTCSessionDescription::answer(sdp)?;
        self.pc.set_remote_description(desc).await?;
        self.flush_pending_ice().await;
        Ok(())
    }

    /// Applies a remote offer, produces and applies the matching answer,
    /// flushes the inbox, and returns the answer SDP for the relay.
    pub async fn answer_remote_offer(&self, sdp: String) -> Result<String, ClientError> {
        let desc = RTCSessionDescription::offer(sdp)?;
        self.pc.set_remote_description(desc).await?;

        let answer = self.pc.create_answer(None).await?;
        self.pc.set_local_description(answer.clone()).await?;
        self.flush_pending_ice().await;
        Ok(answer.sdp)
    }

    /// Applies immediately once a remote description is set, buffers
    /// otherwise.
    pub async fn add_remote_candidate(
        &self,
        candidate: RTCIceCandidateInit,
    ) -> Result<(), ClientError> {
        let mut inbox = self.inbox.lock().await;
        if !inbox.remote_set {
            debug!(pc = %self.kind, "buffering candidate until remote description");
            inbox.pending.push(candidate);
            return Ok(());
        }
        drop(inbox);

        self.pc.add_ice_candidate(candidate).await?;
        Ok(())
    }

    pub async fn pending_remote_candidates(&self) -> usize {
        self.inbox.lock().await.pending.len()
    }

    // Holds the inbox across the whole pass so late arrivals cannot
    // interleave with the backlog. A candidate the engine rejects is
    // reported and skipped; the flush never aborts.
    async fn flush_pending_ice(&self) {
        let mut inbox = self.inbox.lock().await;
        inbox.remote_set = true;
        let pending = std::mem::take(&mut inbox.pending);
        if pending.is_empty() {
            return;
        }

        debug!(pc = %self.kind, count = pending.len(), "flushing buffered candidates");
        for candidate in pending {
            if let Err(e) = self.pc.add_ice_candidate(candidate).await {
                warn!(pc = %self.kind, "failed to apply buffered candidate: {e}");
            }
        }
    }

    /// True the instant the connection first reports connected; false on
    /// failed/disconnected/closed. On timeout the state at that instant
    /// decides, so a connection that made it exactly at the boundary still
    /// counts. The waiter leaves nothing registered behind on any path.
    pub async fn wait_for_connected(&self, timeout: Duration) -> bool {
        let mut state_rx = self.state_rx.clone();
        let settled = tokio::time::timeout(timeout, async {
            loop {
                match *state_rx.borrow_and_update() {
                    RTCPeerConnectionState::Connected => return true,
                    RTCPeerConnectionState::Failed
                    | RTCPeerConnectionState::Disconnected
                    | RTCPeerConnectionState::Closed => return false,
                    _ => {}
                }
                if state_rx.changed().await.is_err() {
                    return false;
                }
            }
        })
        .await;

        match settled {
            Ok(connected) => connected,
            Err(_) => self.pc.connection_state() == RTCPeerConnectionState::Connected,
        }
    }

    /// Trickle ICE: locally gathered candidates surface here, already
    /// marshalled for the wire. One consumer at a time.
    pub fn on_local_candidate(&self, handler: impl Fn(RTCIceCandidateInit) + Send + Sync + 'static) {
        let kind = self.kind;
        let handler = Arc::new(handler);
        self.pc
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                let handler = handler.clone();
                Box::pin(async move {
                    let Some(candidate) = candidate else { return };
                    match candidate.to_json() {
                        Ok(init) => handler(init),
                        Err(e) => warn!(pc = %kind, "failed to marshal local candidate: {e}"),
                    }
                })
            }));
    }

    /// Remote track arrival as a subscription, so consumers bind streams on
    /// notification instead of polling.
    pub fn on_remote_track(&self, handler: impl Fn(Arc<TrackRemote>) + Send + Sync + 'static) {
        let handler = Arc::new(handler);
        self.pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let handler = handler.clone();
            Box::pin(async move { handler(track) })
        }));
    }

    pub async fn close(&self) -> Result<(), ClientError> {
        self.pc.close().await?;
        Ok(())
    }
}
