use crate::bus::EVENT_STREAM;
use crate::domain::DeviceEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::Receiver;
use tracing::{debug, info, instrument, warn};

/// Entry point for uplink events.
///
/// Uplinks are only observed for now. Anything deciding on a downlink must hook in here and stay
/// non-blocking, the device only listens for a response for a short window after sending.
#[derive(Debug, Default)]
pub struct EventIngest {
    received: AtomicU64,
}

impl EventIngest {
    pub fn new() -> Self {
        EventIngest::default()
    }

    pub fn ingest(&self, event: DeviceEvent) {
        if event.device_id.trim().is_empty() {
            warn!("⚠️ Ignoring event without a device identifier: {}", event.payload);
            return;
        }

        self.received.fetch_add(1, Ordering::Relaxed);
        info!(device_id = event.device_id, "📡 Received sensor data: {}", event.payload);
    }

    /// Number of accepted events so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    #[instrument(skip_all, fields(channel = EVENT_STREAM))]
    pub async fn listen(&self, mut rx: Receiver<DeviceEvent>) {
        while let Some(event) = rx.recv().await {
            self.ingest(event);
        }
        debug!("Event stream closed, stopping ingest");
    }
}
