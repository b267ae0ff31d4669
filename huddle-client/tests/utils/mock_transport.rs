use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use huddle_client::{SignalTransport, TransportError, TransportPipe};
use huddle_core::Signal;

/// Scripted transport: outbound frames are recorded for inspection, inbound
/// frames are injected by the test.
pub struct MockTransport {
    refuse: bool,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    collected: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            refuse: false,
            outbound_rx: Mutex::new(None),
            inbound_tx: Mutex::new(None),
            collected: Mutex::new(Vec::new()),
        })
    }

    /// A transport whose every connection attempt fails.
    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            refuse: true,
            outbound_rx: Mutex::new(None),
            inbound_tx: Mutex::new(None),
            collected: Mutex::new(Vec::new()),
        })
    }

    /// Everything the channel has written so far, in write order.
    pub fn drain_sent(&self) -> Vec<Signal> {
        let mut collected = self.collected.lock().unwrap();
        if let Some(rx) = self.outbound_rx.lock().unwrap().as_mut() {
            while let Ok(frame) = rx.try_recv() {
                collected.push(frame);
            }
        }
        collected
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("mock received undecodable frame"))
            .collect()
    }

    /// Polls until at least `count` frames were written or the timeout runs
    /// out; returns whatever arrived.
    pub async fn wait_for_sent(&self, count: usize, timeout_ms: u64) -> Vec<Signal> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let sent = self.drain_sent();
            if sent.len() >= count || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    pub fn inject(&self, signal: &Signal) {
        let text = serde_json::to_string(signal).unwrap();
        self.inject_text(&text);
    }

    pub fn inject_text(&self, text: &str) {
        let tx = self.inbound_tx.lock().unwrap();
        tx.as_ref()
            .expect("transport not opened yet")
            .send(text.to_string())
            .expect("channel reader gone");
    }

    /// Simulates the remote side dropping the connection.
    pub fn close_from_remote(&self) {
        *self.inbound_tx.lock().unwrap() = None;
    }
}

#[async_trait]
impl SignalTransport for MockTransport {
    async fn open(&self, _url: &str) -> Result<TransportPipe, TransportError> {
        if self.refuse {
            return Err(TransportError::Connect("refused by mock".to_string()));
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        *self.outbound_rx.lock().unwrap() = Some(out_rx);
        *self.inbound_tx.lock().unwrap() = Some(in_tx);

        Ok(TransportPipe {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
