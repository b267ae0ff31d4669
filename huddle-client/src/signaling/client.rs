use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use huddle_core::{ActionKind, Claims, Ice, PcKind, PeerAction, PeerEvent, Sdp, SdpKind, Signal};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::room::{EventRouter, EventSubscription};
use crate::signaling::transport::{SignalTransport, TransportPipe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Connecting,
    Open,
    Closed,
}

type SdpHandler = Arc<dyn Fn(Sdp) + Send + Sync>;
type IceHandler = Arc<dyn Fn(Ice) + Send + Sync>;
type ActionHandler = Arc<dyn Fn(PeerAction) + Send + Sync>;

struct ChannelInner {
    state: TransportState,
    queue: VecDeque<Signal>,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

struct Handlers {
    sdp: Mutex<Option<SdpHandler>>,
    ice: Mutex<Option<IceHandler>>,
    action: Mutex<Option<ActionHandler>>,
    events: EventRouter,
}

impl Handlers {
    fn clear(&self) {
        *self.sdp.lock().unwrap() = None;
        *self.ice.lock().unwrap() = None;
        *self.action.lock().unwrap() = None;
        self.events.clear();
    }
}

struct ChannelShared {
    url: String,
    transport: Arc<dyn SignalTransport>,
    inner: Mutex<ChannelInner>,
    state_tx: watch::Sender<TransportState>,
    handlers: Handlers,
}

/// Client end of the signaling relay. Messages sent before the transport is
/// open are queued and drained FIFO the moment it opens; inbound frames are
/// decoded once and fanned out by kind.
#[derive(Clone)]
pub struct SignalingClient {
    shared: Arc<ChannelShared>,
}

impl SignalingClient {
    pub fn new(url: impl Into<String>, transport: Arc<dyn SignalTransport>) -> Self {
        let (state_tx, _) = watch::channel(TransportState::Idle);

        Self {
            shared: Arc::new(ChannelShared {
                url: url.into(),
                transport,
                inner: Mutex::new(ChannelInner {
                    state: TransportState::Idle,
                    queue: VecDeque::new(),
                    outbound: None,
                }),
                state_tx,
                handlers: Handlers {
                    sdp: Mutex::new(None),
                    ice: Mutex::new(None),
                    action: Mutex::new(None),
                    events: EventRouter::new(),
                },
            }),
        }
    }

    pub fn state(&self) -> TransportState {
        self.shared.inner.lock().unwrap().state
    }

    /// Establishes the transport. Calling while already connecting or open
    /// has no effect; calling after a close starts a fresh attempt.
    pub fn connect(&self) {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            if matches!(
                inner.state,
                TransportState::Connecting | TransportState::Open
            ) {
                return;
            }
            inner.state = TransportState::Connecting;
        }
        let _ = self.shared.state_tx.send(TransportState::Connecting);

        let shared = self.shared.clone();
        tokio::spawn(async move {
            let pipe = match shared.transport.open(&shared.url).await {
                Ok(pipe) => pipe,
                Err(e) => {
                    warn!("signaling connect failed: {e}");
                    Self::mark_closed(&shared);
                    return;
                }
            };
            let TransportPipe {
                outbound,
                mut inbound,
            } = pipe;

            {
                let mut inner = shared.inner.lock().unwrap();
                if inner.state == TransportState::Closed {
                    // closed while connecting; dropping the pipe shuts the socket
                    return;
                }
                while let Some(queued) = inner.queue.pop_front() {
                    Self::transmit(&outbound, &queued);
                }
                inner.outbound = Some(outbound);
                inner.state = TransportState::Open;
            }
            let _ = shared.state_tx.send(TransportState::Open);
            info!("signaling channel open");

            while let Some(text) = inbound.recv().await {
                Self::dispatch(&shared, &text);
            }

            Self::mark_closed(&shared);
        });
    }

    /// Transmits immediately when open, otherwise queues. Nothing is dropped
    /// for being sent too early.
    pub fn send(&self, signal: Signal) {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.state == TransportState::Open {
            if let Some(outbound) = &inner.outbound {
                Self::transmit(outbound, &signal);
                return;
            }
        }
        debug!("queueing signal while channel is not open");
        inner.queue.push_back(signal);
    }

    pub fn send_sdp(&self, pc: PcKind, kind: SdpKind, sdp: String) {
        self.send(Signal::Sdp(Sdp { pc, kind, sdp }));
    }

    pub fn send_ice(&self, ice: Ice) {
        self.send(Signal::Ice(ice));
    }

    pub fn send_action(&self, claims: &Claims, action: ActionKind) {
        self.send(Signal::Action(PeerAction {
            peer_id: claims.id.clone(),
            room_id: claims.room_id.clone(),
            kind: action,
            role: claims.role,
        }));
    }

    /// True once the channel is open, triggering `connect` if needed; false
    /// on close or timeout, whichever settles first.
    pub async fn wait_until_open(&self, timeout: Duration) -> bool {
        if self.state() == TransportState::Open {
            return true;
        }
        self.connect();

        let mut state_rx = self.shared.state_tx.subscribe();
        let settled = tokio::time::timeout(timeout, async {
            loop {
                match *state_rx.borrow_and_update() {
                    TransportState::Open => return true,
                    TransportState::Closed => return false,
                    _ => {}
                }
                if state_rx.changed().await.is_err() {
                    return false;
                }
            }
        })
        .await;

        match settled {
            Ok(opened) => opened,
            Err(_) => self.state() == TransportState::Open,
        }
    }

    pub fn on_sdp(&self, handler: impl Fn(Sdp) + Send + Sync + 'static) {
        *self.shared.handlers.sdp.lock().unwrap() = Some(Arc::new(handler));
    }

    pub fn on_ice(&self, handler: impl Fn(Ice) + Send + Sync + 'static) {
        *self.shared.handlers.ice.lock().unwrap() = Some(Arc::new(handler));
    }

    pub fn on_action(&self, handler: impl Fn(PeerAction) + Send + Sync + 'static) {
        *self.shared.handlers.action.lock().unwrap() = Some(Arc::new(handler));
    }

    /// Subscribes to room lifecycle events. Subscriptions are independent;
    /// disposing one leaves the others registered.
    pub fn on_event(
        &self,
        handler: impl Fn(&PeerEvent) + Send + Sync + 'static,
    ) -> EventSubscription {
        self.shared.handlers.events.subscribe(handler)
    }

    /// Closes the transport if it is up, then clears the queue and every
    /// handler reference so nothing registered outlives the session.
    pub fn close(&self) {
        let prev = {
            let mut inner = self.shared.inner.lock().unwrap();
            let prev = inner.state;
            inner.state = TransportState::Closed;
            inner.outbound = None;
            inner.queue.clear();
            prev
        };
        if prev != TransportState::Closed {
            let _ = self.shared.state_tx.send(TransportState::Closed);
            info!("signaling channel closed");
        }
        self.shared.handlers.clear();
    }

    fn mark_closed(shared: &Arc<ChannelShared>) {
        {
            let mut inner = shared.inner.lock().unwrap();
            if inner.state == TransportState::Closed {
                return;
            }
            inner.state = TransportState::Closed;
            inner.outbound = None;
        }
        let _ = shared.state_tx.send(TransportState::Closed);
    }

    fn transmit(outbound: &mpsc::UnboundedSender<String>, signal: &Signal) {
        match serde_json::to_string(signal) {
            Ok(json) => {
                if outbound.send(json).is_err() {
                    warn!("transport writer gone; outbound signal lost");
                }
            }
            Err(e) => error!("failed to serialize signal: {e}"),
        }
    }

    fn dispatch(shared: &Arc<ChannelShared>, text: &str) {
        let signal: Signal = match serde_json::from_str(text) {
            Ok(signal) => signal,
            Err(e) => {
                warn!("ignoring undecodable signal: {e}");
                return;
            }
        };

        match signal {
            Signal::Sdp(sdp) => {
                let handler = shared.handlers.sdp.lock().unwrap().clone();
                if let Some(handler) = handler {
                    handler(sdp);
                }
            }
            Signal::Ice(ice) => {
                let handler = shared.handlers.ice.lock().unwrap().clone();
                if let Some(handler) = handler {
                    handler(ice);
                }
            }
            Signal::Action(action) => {
                let handler = shared.handlers.action.lock().unwrap().clone();
                if let Some(handler) = handler {
                    handler(action);
                }
            }
            Signal::Event(event) => shared.handlers.events.dispatch(&event),
        }
    }
}
